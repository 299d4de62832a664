use huddle_core::{SignalBody, SignalKind};
use huddle_engine::SessionState;

use crate::integration::{alice_peer, bob_peer, init_tracing};
use crate::utils::{ScriptedPeer, TestNetwork, session_with, wait_for_session, wait_for_state};

#[tokio::test]
async fn test_candidates_before_description() {
    init_tracing();

    let net = TestNetwork::new();
    let room_id = net.create_room().await;

    let mut alice = ScriptedPeer::connect(&net.relay, &room_id, "alice", "a1").await;
    alice.enter(&net.store, &room_id).await;

    let bob = net.client();
    let bob_room = bob.join(&room_id, "bob", "b2").await;

    assert!(
        wait_for_session(&bob_room, &alice_peer(), |_| true)
            .await
            .is_some(),
        "bob should open a session for alice from the roster"
    );

    for candidate in ["cand-1", "cand-2"] {
        alice
            .send(
                &bob_peer(),
                SignalBody::Candidate {
                    candidate: candidate.to_owned(),
                },
            )
            .await;
    }

    let queued = wait_for_session(&bob_room, &alice_peer(), |s| s.pending_candidates == 2)
        .await
        .expect("both candidates should be queued");
    assert!(!queued.has_remote_description);
    assert_eq!(queued.state, SessionState::Idle);

    alice
        .send(
            &bob_peer(),
            SignalBody::Offer {
                sdp: "offer from alice".to_owned(),
            },
        )
        .await;
    alice
        .recv_kind(SignalKind::Answer)
        .await
        .expect("bob should answer");

    let link = bob
        .transports
        .link_to(&alice_peer())
        .expect("bob should have a link to alice")
        .snapshot();
    assert_eq!(link.candidates, vec!["cand-1", "cand-2"]);

    let info = session_with(&bob_room, &alice_peer())
        .await
        .expect("session should exist");
    assert_eq!(info.pending_candidates, 0);
    assert!(info.has_remote_description);
    assert!(wait_for_state(&bob_room, &alice_peer(), SessionState::Connected).await);
}
