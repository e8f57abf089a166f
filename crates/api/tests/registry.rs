//! Unit tests for the connection registry hubs.
//!
//! These tests exercise `RoomHub` and `UserHub` directly, without
//! performing any HTTP upgrades. They verify connect/disconnect semantics,
//! broadcast delivery, multi-session users, and shutdown behaviour.

use axum::extract::ws::Message;
use serde_json::json;
use toonhub_api::ws::{RoomHub, UserHub};
use uuid::Uuid;

fn text_of(msg: &Message) -> Option<&str> {
    match msg {
        Message::Text(t) => Some(t.as_str()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Test: new hubs start with zero connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_hubs_have_zero_connections() {
    assert_eq!(RoomHub::new().connection_count().await, 0);
    assert_eq!(UserHub::new().connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: connect/disconnect bookkeeping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_and_disconnect_track_counts() {
    let hub = RoomHub::new();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    let _rx_a = hub.connect(1, a).await;
    let _rx_b = hub.connect(1, b).await;
    assert_eq!(hub.connection_count().await, 2);

    hub.disconnect(1, a).await;
    assert_eq!(hub.connection_count().await, 1);

    hub.disconnect(1, b).await;
    assert_eq!(hub.connection_count().await, 0);
}

#[tokio::test]
async fn disconnect_unknown_handle_is_noop() {
    let hub = RoomHub::new();
    let _rx = hub.connect(1, Uuid::new_v4()).await;

    hub.disconnect(1, Uuid::new_v4()).await;
    hub.disconnect(99, Uuid::new_v4()).await;

    assert_eq!(hub.connection_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: room broadcast reaches every socket in the room, including the
// sender's own, and nothing outside it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_reaches_all_room_sockets_only() {
    let hub = RoomHub::new();
    let mut rx1 = hub.connect(7, Uuid::new_v4()).await;
    let mut rx2 = hub.connect(7, Uuid::new_v4()).await;
    let mut rx_other = hub.connect(8, Uuid::new_v4()).await;

    let delivered = hub.broadcast(7, &json!({"type": "text", "content": "hi"})).await;
    assert_eq!(delivered, 2);

    for rx in [&mut rx1, &mut rx2] {
        let msg = rx.recv().await.expect("room socket should receive");
        let text = text_of(&msg).expect("broadcast is a text frame");
        assert!(text.contains("\"content\":\"hi\""));
    }

    // The other room saw nothing.
    assert!(rx_other.try_recv().is_err());
}

#[tokio::test]
async fn broadcast_to_empty_room_delivers_nothing() {
    let hub = RoomHub::new();
    assert_eq!(hub.broadcast(42, &json!({"x": 1})).await, 0);
}

// ---------------------------------------------------------------------------
// Test: a dead socket never blocks delivery to the rest
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_skips_closed_channels() {
    let hub = RoomHub::new();
    let rx_dead = hub.connect(1, Uuid::new_v4()).await;
    let mut rx_live = hub.connect(1, Uuid::new_v4()).await;

    drop(rx_dead);

    let delivered = hub.broadcast(1, &json!({"still": "alive"})).await;
    assert_eq!(delivered, 1);

    let msg = rx_live.recv().await.expect("live socket should receive");
    assert!(text_of(&msg).unwrap().contains("alive"));
}

// ---------------------------------------------------------------------------
// Test: a user with several sessions receives the event on all of them
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_to_user_reaches_every_session() {
    let hub = UserHub::new();
    let mut phone = hub.connect(5, Uuid::new_v4()).await;
    let mut bridge = hub.connect(5, Uuid::new_v4()).await;
    let mut someone_else = hub.connect(6, Uuid::new_v4()).await;

    let envelope = json!({"type": "NEW_JOB", "title": "t", "body": "b", "job_id": 1});
    let delivered = hub.send_to_user(5, &envelope).await;
    assert_eq!(delivered, 2);

    for rx in [&mut phone, &mut bridge] {
        let msg = rx.recv().await.expect("session should receive");
        assert!(text_of(&msg).unwrap().contains("NEW_JOB"));
    }
    assert!(someone_else.try_recv().is_err());
}

#[tokio::test]
async fn send_to_absent_user_is_not_an_error() {
    let hub = UserHub::new();
    assert_eq!(hub.send_to_user(123, &json!({})).await, 0);
}

// ---------------------------------------------------------------------------
// Test: disconnecting the last socket drops the key entirely
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_key_is_dropped_after_last_disconnect() {
    let hub = RoomHub::new();
    let conn = Uuid::new_v4();

    let _rx = hub.connect(3, conn).await;
    hub.disconnect(3, conn).await;

    // Reconnecting works from a clean slate and broadcasts still deliver.
    let mut rx = hub.connect(3, Uuid::new_v4()).await;
    assert_eq!(hub.broadcast(3, &json!({"fresh": true})).await, 1);
    assert!(rx.recv().await.is_some());
}

// ---------------------------------------------------------------------------
// Test: shutdown_all sends Close and clears the hub
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let hub = UserHub::new();
    let mut rx1 = hub.connect(1, Uuid::new_v4()).await;
    let mut rx2 = hub.connect(2, Uuid::new_v4()).await;

    hub.shutdown_all().await;
    assert_eq!(hub.connection_count().await, 0);

    let msg1 = rx1.recv().await.expect("rx1 should receive Close");
    assert!(matches!(msg1, Message::Close(None)));
    let msg2 = rx2.recv().await.expect("rx2 should receive Close");
    assert!(matches!(msg2, Message::Close(None)));

    // After Close the channels are closed for good.
    assert!(rx1.recv().await.is_none());
}

// ---------------------------------------------------------------------------
// Test: ping_all nudges every bridge session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_all_reaches_every_session() {
    let hub = UserHub::new();
    let mut rx1 = hub.connect(1, Uuid::new_v4()).await;
    let mut rx2 = hub.connect(1, Uuid::new_v4()).await;

    hub.ping_all().await;

    assert!(matches!(rx1.recv().await, Some(Message::Ping(_))));
    assert!(matches!(rx2.recv().await, Some(Message::Ping(_))));
}
