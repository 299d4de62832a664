use huddle_engine::RoomEvent;

use crate::integration::{bob_peer, connected_pair, init_tracing};
use crate::utils::{STATE_TIMEOUT, wait_for_event, wait_for_link};

#[tokio::test]
async fn test_screen_share_ended_by_source() {
    init_tracing();

    let mut pair = connected_pair().await;
    let camera = pair
        .alice_room
        .outbound_tracks()
        .await
        .video
        .expect("camera should be acquired");

    pair.alice_room
        .start_screen_share()
        .await
        .expect("Failed to start screen share");
    let screen = pair
        .alice_room
        .outbound_tracks()
        .await
        .video
        .expect("screen should be sent");

    // The capture source ends the share, e.g. the user stops it from the OS.
    screen.stop();

    let ended = wait_for_event(&mut pair.alice_room, STATE_TIMEOUT, |e| {
        matches!(e, RoomEvent::ScreenShareEnded)
    })
    .await;
    assert!(ended.is_some());
    assert!(!pair.alice_room.is_screen_sharing().await);

    let link = pair
        .alice
        .transports
        .link_to(&bob_peer())
        .expect("alice should have a link to bob");
    assert!(wait_for_link(&link, |s| s.video.as_deref() == Some(camera.id())).await);
}
