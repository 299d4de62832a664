use huddle_core::SignalKind;
use huddle_engine::{PeerEvent, RoomEvent, SessionState};
use std::time::Duration;

use crate::integration::{alice_peer, bob_peer, init_tracing};
use crate::utils::{ScriptedPeer, TestNetwork, wait_for_event};

#[tokio::test(start_paused = true)]
async fn test_negotiation_gives_up() {
    init_tracing();

    let net = TestNetwork::new();
    let room_id = net.create_room().await;

    // Bob is listed in the room but never answers.
    let mut bob = ScriptedPeer::connect(&net.relay, &room_id, "bob", "b2").await;
    bob.enter(&net.store, &room_id).await;

    let alice = net.client();
    let mut alice_room = alice.join(&room_id, "alice", "a1").await;

    let first = bob
        .recv_kind(SignalKind::Offer)
        .await
        .expect("alice should offer to bob");
    assert_eq!(first.from_peer_id, alice_peer());

    let resent = bob
        .recv_kind_within(SignalKind::Offer, Duration::from_secs(16))
        .await
        .expect("alice should send a fresh offer after the negotiation timeout");
    assert!(resent.sequence > first.sequence);

    let removed = wait_for_event(&mut alice_room, Duration::from_secs(60), |e| {
        matches!(
            e,
            RoomEvent::Peer(PeerEvent::Removed { peer_id, reason: SessionState::Failed })
                if *peer_id == bob_peer()
        )
    })
    .await;
    assert!(removed.is_some(), "alice should give up on bob");
    assert!(alice_room.peer_states().await.is_empty());

    let link = alice
        .transports
        .link_to(&bob_peer())
        .expect("alice should have had a link to bob")
        .snapshot();
    assert_eq!(link.offers, 3);
    assert_eq!(link.ice_restarts, 2);
    assert!(link.closed);
}
