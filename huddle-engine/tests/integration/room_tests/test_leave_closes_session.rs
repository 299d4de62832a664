use huddle_engine::{PeerEvent, RoomEvent, RoomStore, SessionState};

use crate::integration::{alice_peer, bob_peer, connected_pair, init_tracing};
use crate::utils::{STATE_TIMEOUT, wait_for_event};

#[tokio::test]
async fn test_leave_closes_session() {
    init_tracing();

    let mut pair = connected_pair().await;

    pair.bob_room
        .leave_room()
        .await
        .expect("Failed to leave room");

    let removed = wait_for_event(&mut pair.alice_room, STATE_TIMEOUT, |e| {
        matches!(
            e,
            RoomEvent::Peer(PeerEvent::Removed { peer_id, reason: SessionState::Closed })
                if *peer_id == bob_peer()
        )
    })
    .await;
    assert!(removed.is_some(), "alice should close the session with bob");
    assert!(pair.alice_room.peer_states().await.is_empty());

    let room = pair
        .net
        .store
        .snapshot(&pair.room_id)
        .await
        .expect("store should be online")
        .expect("room should stay open while alice is in it");
    assert!(room.participant("bob").is_none());
    assert!(room.participant("alice").is_some());

    let bob_link = pair
        .bob
        .transports
        .link_to(&alice_peer())
        .expect("bob should have had a link to alice");
    assert!(bob_link.snapshot().closed);

    pair.alice_room
        .leave_room()
        .await
        .expect("Failed to leave room");
    assert!(
        !pair.alice.mesh.check_room_exists(&pair.room_id).await,
        "the last participant to leave closes the room"
    );
}
