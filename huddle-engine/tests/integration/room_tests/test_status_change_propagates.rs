use huddle_engine::RoomEvent;

use crate::integration::{connected_pair, init_tracing};
use crate::utils::{STATE_TIMEOUT, wait_for_event};

#[tokio::test]
async fn test_status_change_propagates() {
    init_tracing();

    let mut pair = connected_pair().await;

    let audio_on = pair
        .alice_room
        .toggle_audio()
        .await
        .expect("microphone should be acquired");
    assert!(!audio_on);

    let update = wait_for_event(&mut pair.bob_room, STATE_TIMEOUT, |e| {
        matches!(e, RoomEvent::ParticipantUpdated(p) if p.uid == "alice" && p.is_muted)
    })
    .await;
    let Some(RoomEvent::ParticipantUpdated(alice)) = update else {
        panic!("bob should see alice muted");
    };
    assert!(!alice.is_video_off, "only the toggled field changes");

    let video_on = pair
        .alice_room
        .toggle_video()
        .await
        .expect("camera should be acquired");
    assert!(!video_on);

    let update = wait_for_event(&mut pair.bob_room, STATE_TIMEOUT, |e| {
        matches!(e, RoomEvent::ParticipantUpdated(p) if p.uid == "alice" && p.is_video_off)
    })
    .await;
    let Some(RoomEvent::ParticipantUpdated(alice)) = update else {
        panic!("bob should see alice's camera off");
    };
    assert!(alice.is_muted);
}
