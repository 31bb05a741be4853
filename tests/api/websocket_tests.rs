//! WebSocket Fan-out Tests
//!
//! Drive a running gateway with real WebSocket clients.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{profiles, TestApp, WsClient};

const QUIET: Duration = Duration::from_millis(300);

#[tokio::test]
async fn test_room_leave_reaches_room_members_only() {
    let app = TestApp::spawn().await;
    let mut a = app.join("a", Some("r1")).await;
    let mut b = app.join("b", Some("r1")).await;
    let mut c = app.join("c", Some("r2")).await;

    let leave = json!({"type": "room_leave", "roomID": "r1", "uid": "a"});
    a.send_json(&leave).await;

    assert_eq!(a.recv_json().await, leave);
    assert_eq!(b.recv_json().await, leave);
    c.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_profile_change_hidden_from_blocked_profile() {
    let store = profiles(&["a", "b", "c"]);
    store.block("b", "a");
    let app = TestApp::spawn_with_store(store).await;

    let mut a = app.join("a", None).await;
    let mut b = app.join("b", None).await;
    let mut c = app.join("c", None).await;

    let change = json!({"type": "profile_change", "uid": "b", "displayName": "B"});
    b.send_json(&change).await;

    assert_eq!(b.recv_json().await, change);
    assert_eq!(c.recv_json().await, change);
    a.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_post_reaches_follower_until_blocked() {
    let store = profiles(&["p1", "a"]);
    store.follow("a", "p1");
    let app = TestApp::spawn_with_store(store).await;

    let mut p1 = app.join("p1", None).await;
    let mut a = app.join("a", None).await;

    let post = json!({"type": "post_new", "uid": "p1", "post": {"postID": "x"}});
    p1.send_json(&post).await;
    assert_eq!(a.recv_json().await, post);
    assert_eq!(p1.recv_json().await, post);

    app.store.block("p1", "a");
    p1.send_json(&post).await;

    assert_eq!(p1.recv_json().await, post);
    a.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_direct_message_reaches_both_parties() {
    let app = TestApp::spawn().await;
    let mut a = app.join("a", None).await;
    let mut b = app.join("b", None).await;
    let mut c = app.join("c", None).await;

    let message = json!({"type": "message_new", "uid": "a", "profileID": "b", "message": "hi"});
    a.send_json(&message).await;

    assert_eq!(a.recv_json().await, message);
    assert_eq!(b.recv_json().await, message);
    c.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_notification_reaches_every_device() {
    let app = TestApp::spawn().await;
    let mut phone = app.join("a", None).await;
    let mut laptop = app.join("a", Some("r1")).await;
    let mut other = app.join("b", Some("r1")).await;

    let notification = json!({"type": "notification", "uid": "a", "text": "liked"});
    other.send_json(&notification).await;

    assert_eq!(phone.recv_json().await, notification);
    assert_eq!(laptop.recv_json().await, notification);
    other.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_unrecognized_type_produces_no_writes() {
    let app = TestApp::spawn().await;
    let mut a = app.join("a", Some("r1")).await;
    let mut b = app.join("b", Some("r1")).await;

    a.send_json(&json!({"type": "typing", "uid": "a", "roomID": "r1"}))
        .await;

    a.expect_silence(QUIET).await;
    b.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_malformed_frames_keep_connection_open() {
    let app = TestApp::spawn().await;
    let mut a = app.connect().await;

    a.send_text("not json").await;
    a.send_text("[1, 2]").await;
    a.send_json(&json!({"type": "join"})).await;
    a.send_binary(vec![0xde, 0xad]).await;

    a.join("a", Some("r1")).await;
    app.wait_for_registered(1).await;

    let event = json!({"type": "getID", "uid": "a", "roomID": "r1"});
    a.send_json(&event).await;
    assert_eq!(a.recv_json().await, event);
}

#[tokio::test]
async fn test_event_before_join_is_still_routed() {
    let app = TestApp::spawn().await;
    let mut a = app.join("a", None).await;
    let mut anonymous = app.connect().await;

    let message = json!({"type": "message_new", "uid": "x", "profileID": "a"});
    anonymous.send_json(&message).await;

    assert_eq!(a.recv_json().await, message);
    // The sender is not registered, so it receives nothing
    anonymous.expect_silence(QUIET).await;
}

#[tokio::test]
async fn test_disconnect_removes_registry_entry() {
    let app = TestApp::spawn().await;
    let a = app.join("a", Some("r1")).await;
    let mut b = app.join("b", Some("r1")).await;
    app.wait_for_registered(2).await;

    a.close().await;
    app.wait_for_registered(1).await;

    let event = json!({"type": "account_delete", "uid": "b", "roomID": "r1"});
    b.send_json(&event).await;
    assert_eq!(b.recv_json().await, event);
}

#[tokio::test]
async fn test_rejoin_moves_connection_between_rooms() {
    let app = TestApp::spawn().await;
    let mut a = app.join("a", Some("r1")).await;
    let mut b = app.join("b", Some("r2")).await;

    a.join("a", Some("r2")).await;
    app.wait_for_registered(2).await;

    let event = json!({"type": "getID", "uid": "b", "roomID": "r2"});
    b.send_json(&event).await;

    assert_eq!(a.recv_json().await, event);
    assert_eq!(b.recv_json().await, event);
}

#[tokio::test]
async fn test_root_path_accepts_connections() {
    let app = TestApp::spawn().await;
    let mut a = WsClient::connect(&app.ws_url("/")).await;
    a.join("a", None).await;

    app.wait_for_registered(1).await;
}
