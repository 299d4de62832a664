use huddle_engine::{ParticipantOp, PeerEvent, RoomEvent, RoomStore, SessionState};
use std::time::Duration;

use crate::integration::{alice_peer, bob_peer, connected_pair, init_tracing};
use crate::utils::{STATE_TIMEOUT, session_with, wait_for_event};

#[tokio::test(start_paused = true)]
async fn test_record_removed_and_restored() {
    init_tracing();

    let mut pair = connected_pair().await;
    let old_link = pair
        .bob
        .transports
        .link_to(&alice_peer())
        .expect("bob should have a link to alice");

    // Alice's record disappears while her client keeps running.
    pair.net
        .store
        .mutate_participants(
            &pair.room_id,
            ParticipantOp::Remove {
                uid: "alice".to_owned(),
            },
        )
        .await
        .expect("Failed to remove alice");

    let closed = wait_for_event(&mut pair.alice_room, STATE_TIMEOUT, |e| {
        matches!(
            e,
            RoomEvent::Peer(PeerEvent::Removed { peer_id, reason: SessionState::Closed })
                if *peer_id == bob_peer()
        )
    })
    .await;
    assert!(closed.is_some(), "bob's goodbye should close alice's side too");

    // Her heartbeat puts the record back and the pair connects afresh.
    tokio::time::sleep(Duration::from_secs(30)).await;

    let alice_side = session_with(&pair.alice_room, &bob_peer())
        .await
        .expect("alice should have a new session with bob");
    let bob_side = session_with(&pair.bob_room, &alice_peer())
        .await
        .expect("bob should have a new session with alice");
    assert_eq!(alice_side.state, SessionState::Connected);
    assert_eq!(bob_side.state, SessionState::Connected);

    assert!(old_link.snapshot().closed);
    assert_eq!(pair.bob.transports.link_count(&alice_peer()), 2);
    assert_eq!(pair.alice.transports.link_count(&bob_peer()), 2);

    let room = pair
        .net
        .store
        .snapshot(&pair.room_id)
        .await
        .expect("store should be online")
        .expect("room should exist");
    assert!(room.participant("alice").is_some());
}
