use huddle_core::TrackKind;
use huddle_engine::{DeviceAccess, MediaError, RoomEvent, SessionState, StaticDevices};
use std::time::Duration;

use crate::integration::{alice_peer, bob_peer, init_tracing};
use crate::utils::{TestNetwork, test_config, wait_for_event, wait_for_state};

#[tokio::test]
async fn test_join_without_camera() {
    init_tracing();

    let net = TestNetwork::new();
    let room_id = net.create_room().await;
    let alice = net.client_with(
        test_config(),
        StaticDevices::new().with_camera(DeviceAccess::Denied),
    );
    let bob = net.client();

    let (mut alice_room, bob_room) = tokio::join!(
        alice.join(&room_id, "alice", "a1"),
        bob.join(&room_id, "bob", "b2"),
    );

    let unavailable = wait_for_event(&mut alice_room, Duration::from_secs(1), |e| {
        matches!(e, RoomEvent::MediaUnavailable(_))
    })
    .await;
    assert!(matches!(
        unavailable,
        Some(RoomEvent::MediaUnavailable(MediaError::PermissionDenied(TrackKind::Video)))
    ));
    assert!(alice_room.local_participant().is_video_off);
    assert!(!alice_room.local_participant().is_muted);

    assert!(wait_for_state(&alice_room, &bob_peer(), SessionState::Connected).await);
    assert!(wait_for_state(&bob_room, &alice_peer(), SessionState::Connected).await);
    assert!(alice_room.outbound_tracks().await.video.is_none());
}
