use huddle_core::{SignalBody, SignalKind};
use huddle_engine::{SessionState, StaticDevices};

use crate::integration::{alice_peer, bob_peer, init_tracing};
use crate::utils::{
    ScriptedPeer, TestNetwork, eager_promotion_config, session_with, wait_for_state,
};

#[tokio::test]
async fn test_colliding_offer_answered_by_answerer() {
    init_tracing();

    let net = TestNetwork::new();
    let room_id = net.create_room().await;

    let mut alice = ScriptedPeer::connect(&net.relay, &room_id, "alice", "a1").await;
    alice.enter(&net.store, &room_id).await;

    let bob = net.client_with(eager_promotion_config(), StaticDevices::new());
    let bob_room = bob.join(&room_id, "bob", "b2").await;

    let promoted_offer = alice
        .recv_kind(SignalKind::Offer)
        .await
        .expect("bob should promote himself after waiting for alice");
    assert_eq!(promoted_offer.from_peer_id, bob_peer());

    // Alice's own offer collides with the promoted one.
    alice
        .send(
            &bob_peer(),
            SignalBody::Offer {
                sdp: "offer from alice".to_owned(),
            },
        )
        .await;

    let answer = alice
        .recv_kind(SignalKind::Answer)
        .await
        .expect("the polite side should answer the colliding offer");
    assert_eq!(answer.from_peer_id, bob_peer());

    let link = bob
        .transports
        .link_to(&alice_peer())
        .expect("bob should have a link to alice")
        .snapshot();
    assert_eq!(link.rollbacks, 1, "bob should roll back his own offer");
    assert_eq!(link.answers, 1);

    assert!(wait_for_state(&bob_room, &alice_peer(), SessionState::Connected).await);
    let info = session_with(&bob_room, &alice_peer())
        .await
        .expect("session should exist");
    assert!(info.promoted);
}
