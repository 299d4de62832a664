use huddle_engine::{RoomStore, SessionState};
use std::time::Duration;

use crate::integration::{alice_peer, bob_peer, connected_pair, init_tracing};
use crate::utils::{session_with, wait_for_state};

#[tokio::test(start_paused = true)]
async fn test_path_interruption_recovers() {
    init_tracing();

    let pair = connected_pair().await;
    let roster = |room: &huddle_core::Room| {
        room.participants
            .iter()
            .map(|p| (p.uid.clone(), p.peer_id.clone()))
            .collect::<Vec<_>>()
    };
    let before = pair
        .net
        .store
        .snapshot(&pair.room_id)
        .await
        .expect("store should be online")
        .expect("room should exist");

    pair.net.network.set_link_up(false);
    assert!(wait_for_state(&pair.alice_room, &bob_peer(), SessionState::Reconnecting).await);
    assert!(wait_for_state(&pair.bob_room, &alice_peer(), SessionState::Reconnecting).await);

    tokio::time::sleep(Duration::from_secs(12)).await;
    let during = session_with(&pair.alice_room, &bob_peer())
        .await
        .expect("session should survive the outage");
    assert_eq!(during.state, SessionState::Reconnecting);

    pair.net.network.set_link_up(true);
    assert!(wait_for_state(&pair.alice_room, &bob_peer(), SessionState::Connected).await);
    assert!(wait_for_state(&pair.bob_room, &alice_peer(), SessionState::Connected).await);

    let link = pair
        .alice
        .transports
        .link_to(&bob_peer())
        .expect("alice should have a link to bob")
        .snapshot();
    assert!(link.ice_restarts >= 1);
    assert_eq!(
        pair.alice.transports.link_count(&bob_peer()),
        1,
        "recovery must reuse the existing connection"
    );

    let after = pair
        .net
        .store
        .snapshot(&pair.room_id)
        .await
        .expect("store should be online")
        .expect("room should exist");
    assert_eq!(roster(&before), roster(&after));
}
