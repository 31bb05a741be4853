//! Connection Liveness Tests
//!
//! Idle sockets, slow consumers and dead peers against a running gateway.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use feed_gateway::domain::OverflowPolicy;
use feed_gateway::infrastructure::profile_store::InMemoryProfileStore;

use crate::common::{test_settings, TestApp};

#[tokio::test]
async fn test_silent_client_is_dropped_after_heartbeat_timeout() {
    let mut settings = test_settings();
    settings.websocket.heartbeat_interval_ms = 100;
    settings.websocket.heartbeat_grace_ms = 100;
    let app = TestApp::spawn_with_settings(settings, InMemoryProfileStore::new()).await;

    // Never read again, so server pings go unanswered
    let mut silent = app.join("a", Some("r1")).await;
    app.wait_for_registered(1).await;

    app.wait_for_registered(0).await;
    assert!(silent.is_closed_within(Duration::from_secs(3)).await);
}

#[tokio::test]
async fn test_overflowing_client_is_disconnected() {
    let mut settings = test_settings();
    settings.websocket.overflow_policy = OverflowPolicy::Disconnect;
    settings.websocket.outbound_queue_capacity = 1;
    settings.websocket.heartbeat_interval_ms = 100;
    settings.websocket.heartbeat_grace_ms = 60_000;
    settings.websocket.max_message_size = 1 << 20;
    settings.websocket.max_frame_size = 1 << 20;
    let app = TestApp::spawn_with_settings(settings, InMemoryProfileStore::new()).await;

    let mut slow = app.join("slow", Some("r1")).await;
    let mut sender = app.connect().await;
    app.wait_for_registered(1).await;

    // Enough data to fill the socket buffers of a client that stopped reading
    let payload = "x".repeat(256 * 1024);
    for i in 0..200 {
        let event = json!({
            "type": "getID",
            "uid": "sender",
            "roomID": "r1",
            "seq": i,
            "payload": payload
        });
        sender.send_json(&event).await;
    }

    app.wait_for_registered(0).await;
    assert_eq!(app.state.registry.open_count(), 0);
    assert!(slow.is_closed_within(Duration::from_secs(10)).await);
}

#[tokio::test]
async fn test_dead_peer_does_not_block_room_delivery() {
    let app = TestApp::spawn().await;
    let mut a = app.join("a", Some("r1")).await;
    let mut b = app.join("b", Some("r1")).await;
    let c = app.join("c", Some("r1")).await;
    app.wait_for_registered(3).await;

    // No close handshake: the socket just goes away
    drop(c);

    let event = json!({"type": "room_leave", "uid": "a", "roomID": "r1"});
    a.send_json(&event).await;

    assert_eq!(a.recv_json().await, event);
    assert_eq!(b.recv_json().await, event);
    app.wait_for_registered(2).await;
}

#[tokio::test]
async fn test_long_room_id_is_routed() {
    let app = TestApp::spawn().await;
    let room = "r".repeat(129);
    let mut a = app.join("a", Some(&room)).await;
    let mut b = app.join("b", Some(&room)).await;

    let event = json!({"type": "getID", "uid": "a", "roomID": room});
    a.send_json(&event).await;

    assert_eq!(a.recv_json().await, event);
    assert_eq!(b.recv_json().await, event);
}
