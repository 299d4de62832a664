use huddle_engine::SessionState;
use std::time::Duration;

use crate::integration::{alice_peer, bob_peer, connected_pair, init_tracing};
use crate::utils::{wait_for_link, wait_for_state};

#[tokio::test]
async fn test_renegotiation_fallback() {
    init_tracing();

    let mut pair = connected_pair().await;
    pair.net.network.set_in_place_swap(false);

    let link = pair
        .alice
        .transports
        .link_to(&bob_peer())
        .expect("alice should have a link to bob");
    let offers_before = link.snapshot().offers;

    pair.alice_room
        .start_screen_share()
        .await
        .expect("Failed to start screen share");

    assert!(
        wait_for_link(&link, |s| s.offers == offers_before + 1).await,
        "the offerer should renegotiate when the swap is not in place"
    );
    assert!(wait_for_state(&pair.alice_room, &bob_peer(), SessionState::Connected).await);
    assert!(wait_for_state(&pair.bob_room, &alice_peer(), SessionState::Connected).await);

    pair.bob_room
        .start_screen_share()
        .await
        .expect("Failed to start screen share");
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        pair.bob.transports.total_offers(),
        0,
        "the answerer waits for the offerer instead of renegotiating"
    );
}
