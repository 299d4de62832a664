use huddle_core::{SignalBody, SignalKind};
use huddle_engine::SessionState;
use std::time::Duration;

use crate::integration::{alice_peer, bob_peer, init_tracing};
use crate::utils::{ScriptedPeer, TestNetwork, wait_for_state};

#[tokio::test]
async fn test_offer_before_presence() {
    init_tracing();

    let net = TestNetwork::new();
    let room_id = net.create_room().await;

    let bob = net.client();
    let bob_room = bob.join(&room_id, "bob", "b2").await;

    // Alice signals before she shows up in the participant list.
    let mut alice = ScriptedPeer::connect(&net.relay, &room_id, "alice", "a1").await;
    alice
        .send(
            &bob_peer(),
            SignalBody::Offer {
                sdp: "early offer".to_owned(),
            },
        )
        .await;

    let answer = alice
        .recv_kind(SignalKind::Answer)
        .await
        .expect("an offer from an unlisted peer should still be answered");
    assert_eq!(answer.from_peer_id, bob_peer());

    alice.enter(&net.store, &room_id).await;
    assert!(wait_for_state(&bob_room, &alice_peer(), SessionState::Connected).await);

    let later = alice.drain_for(Duration::from_millis(300)).await;
    assert!(
        later.iter().all(|m| m.kind != SignalKind::Answer),
        "the roster update must not produce a second answer"
    );
    assert_eq!(bob_room.peer_states().await.len(), 1);
    assert_eq!(bob.transports.link_count(&alice_peer()), 1);
}
