use huddle_core::Role;
use huddle_engine::SessionState;

use crate::integration::{alice_peer, bob_peer, connected_pair, init_tracing};

#[tokio::test]
async fn test_glare_two_peers() {
    init_tracing();

    let pair = connected_pair().await;

    let alice_view = pair.alice_room.peer_states().await;
    assert_eq!(alice_view.len(), 1, "alice should hold exactly one session");
    assert_eq!(alice_view[0].peer_id, bob_peer());
    assert_eq!(alice_view[0].role, Role::Offerer);
    assert_eq!(alice_view[0].state, SessionState::Connected);

    let bob_view = pair.bob_room.peer_states().await;
    assert_eq!(bob_view.len(), 1, "bob should hold exactly one session");
    assert_eq!(bob_view[0].peer_id, alice_peer());
    assert_eq!(bob_view[0].role, Role::Answerer);
    assert!(!bob_view[0].promoted);

    assert!(pair.alice.transports.total_offers() >= 1);
    assert_eq!(
        pair.bob.transports.total_offers(),
        0,
        "the answerer must never offer while the offerer is responsive"
    );
    assert_eq!(pair.alice.transports.link_count(&bob_peer()), 1);
    assert_eq!(pair.bob.transports.link_count(&alice_peer()), 1);
}
