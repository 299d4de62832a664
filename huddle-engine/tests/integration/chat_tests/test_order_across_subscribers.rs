use crate::integration::init_tracing;
use crate::utils::{TestNetwork, wait_for_chat};

#[tokio::test]
async fn test_order_across_subscribers() {
    init_tracing();

    let net = TestNetwork::new();
    let room_id = net.create_room().await;
    let (alice, bob, carol) = (net.client(), net.client(), net.client());

    let (alice_room, bob_room, carol_room) = tokio::join!(
        alice.join(&room_id, "alice", "a1"),
        bob.join(&room_id, "bob", "b2"),
        carol.join(&room_id, "carol", "c3"),
    );

    let (a, b, c) = tokio::join!(
        alice_room.send_message("hi from alice"),
        bob_room.send_message("hi from bob"),
        carol_room.send_message("  hi from carol  "),
    );
    let carol_message = c.expect("Failed to send");
    assert_eq!(carol_message.text, "hi from carol");
    a.expect("Failed to send");
    b.expect("Failed to send");

    alice_room
        .send_message("second from alice")
        .await
        .expect("Failed to send");

    let mut orders = Vec::new();
    for room in [&alice_room, &bob_room, &carol_room] {
        assert!(wait_for_chat(room, 4).await, "every member sees every message");
        let entries = room.chat_entries();
        assert!(entries.iter().all(|e| !e.pending));
        let keys: Vec<_> = entries
            .iter()
            .map(|e| (e.message.server_timestamp, e.message.id.clone()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "entries are ordered by timestamp then id");
        orders.push(keys);
    }
    assert_eq!(orders[0], orders[1]);
    assert_eq!(orders[1], orders[2]);
}
