use huddle_engine::{RoomEvent, SessionState};

use crate::integration::{alice_peer, bob_peer, connected_pair, init_tracing};
use crate::utils::{STATE_TIMEOUT, session_with, wait_for_event};

#[tokio::test]
async fn test_store_outage() {
    init_tracing();

    let mut pair = connected_pair().await;

    pair.net.store.set_online(false);

    let reconnecting = wait_for_event(&mut pair.alice_room, STATE_TIMEOUT, |e| {
        matches!(e, RoomEvent::StoreReconnecting { .. })
    })
    .await;
    assert!(reconnecting.is_some(), "alice should report the lost store");

    let session = session_with(&pair.alice_room, &bob_peer())
        .await
        .expect("peer sessions do not depend on the store");
    assert_eq!(session.state, SessionState::Connected);

    pair.net.store.set_online(true);

    let restored = wait_for_event(&mut pair.alice_room, STATE_TIMEOUT, |e| {
        matches!(e, RoomEvent::StoreRestored)
    })
    .await;
    assert!(restored.is_some(), "alice should resubscribe once the store is back");

    let session = session_with(&pair.bob_room, &alice_peer())
        .await
        .expect("session should survive the outage");
    assert_eq!(session.state, SessionState::Connected);

    pair.alice_room
        .send_message("back online")
        .await
        .expect("chat should work again");
}
