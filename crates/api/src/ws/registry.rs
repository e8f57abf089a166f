//! Live-socket connection registry.
//!
//! Two independent hubs track open WebSocket connections: [`RoomHub`] keys
//! sockets by chat-room id for message fan-out, [`UserHub`] keys them by
//! user id for the personal event bridge. Both wrap the same [`SocketHub`]
//! discipline: all mutation goes through the interior lock, and broadcasts
//! iterate a snapshot of the senders taken under a read guard so a
//! concurrent connect/disconnect can never invalidate the iteration.
//!
//! Registry state is process-lifetime only. A restart drops every handle;
//! clients reconnect and replay history from the durable message store.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};
use toonhub_core::types::DbId;
use uuid::Uuid;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// A registered connection under some key.
struct Handle {
    conn_id: Uuid,
    sender: WsSender,
}

/// Keyed registry of live socket handles.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
struct SocketHub {
    /// Human label for log lines (`"room"` / `"user"`).
    label: &'static str,
    connections: RwLock<HashMap<DbId, Vec<Handle>>>,
}

impl SocketHub {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection under `key`.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    async fn connect(&self, key: DbId, conn_id: Uuid) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut conns = self.connections.write().await;
        conns.entry(key).or_default().push(Handle {
            conn_id,
            sender: tx,
        });
        tracing::debug!(hub = self.label, key, %conn_id, "Socket registered");
        rx
    }

    /// Remove one connection from `key`'s set. The key itself is dropped
    /// when its set empties, so the map never accumulates dead keys.
    async fn disconnect(&self, key: DbId, conn_id: Uuid) {
        let mut conns = self.connections.write().await;
        if let Some(handles) = conns.get_mut(&key) {
            handles.retain(|h| h.conn_id != conn_id);
            if handles.is_empty() {
                conns.remove(&key);
            }
        }
        tracing::debug!(hub = self.label, key, %conn_id, "Socket unregistered");
    }

    /// Send `message` to every connection under `key`, best-effort.
    ///
    /// Senders whose channel is closed are skipped (their session loop will
    /// call `disconnect` on its way out); one dead socket never blocks
    /// delivery to the rest. Returns the number of sends attempted.
    async fn send_to_key(&self, key: DbId, message: Message) -> usize {
        // Snapshot the senders under the read guard, then send outside it
        // so a concurrent connect/disconnect never races the iteration.
        let senders: Vec<WsSender> = {
            let conns = self.connections.read().await;
            match conns.get(&key) {
                Some(handles) => handles.iter().map(|h| h.sender.clone()).collect(),
                None => return 0,
            }
        };

        let mut count = 0;
        for sender in &senders {
            if sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Current number of registered connections across all keys.
    async fn connection_count(&self) -> usize {
        self.connections.read().await.values().map(Vec::len).sum()
    }

    /// Send a Ping frame to every registered connection.
    async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for handles in conns.values() {
            for handle in handles {
                let _ = handle.sender.send(Message::Ping(Bytes::new()));
            }
        }
    }

    /// Send a Close frame to every connection, then clear the map.
    async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count: usize = conns.values().map(Vec::len).sum();
        for handles in conns.values() {
            for handle in handles {
                let _ = handle.sender.send(Message::Close(None));
            }
        }
        conns.clear();
        tracing::info!(hub = self.label, count, "Closed all WebSocket connections");
    }
}

// ---------------------------------------------------------------------------
// RoomHub
// ---------------------------------------------------------------------------

/// Sockets keyed by chat-room id. Fan-out target for room broadcasts.
pub struct RoomHub {
    inner: SocketHub,
}

impl RoomHub {
    pub fn new() -> Self {
        Self {
            inner: SocketHub::new("room"),
        }
    }

    /// Register a socket under a room. Append-only per key.
    pub async fn connect(&self, room_id: DbId, conn_id: Uuid) -> mpsc::UnboundedReceiver<Message> {
        self.inner.connect(room_id, conn_id).await
    }

    pub async fn disconnect(&self, room_id: DbId, conn_id: Uuid) {
        self.inner.disconnect(room_id, conn_id).await
    }

    /// Deliver `payload` to every socket currently registered under the
    /// room, including the sender's own. Returns the delivery count.
    pub async fn broadcast(&self, room_id: DbId, payload: &serde_json::Value) -> usize {
        self.inner
            .send_to_key(room_id, Message::Text(payload.to_string().into()))
            .await
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.connection_count().await
    }

    pub async fn shutdown_all(&self) {
        self.inner.shutdown_all().await
    }
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// UserHub
// ---------------------------------------------------------------------------

/// Sockets keyed by user id. A user may hold several simultaneous sessions
/// (phone + bridge app); all of them receive every personal event.
pub struct UserHub {
    inner: SocketHub,
}

impl UserHub {
    pub fn new() -> Self {
        Self {
            inner: SocketHub::new("user"),
        }
    }

    pub async fn connect(&self, user_id: DbId, conn_id: Uuid) -> mpsc::UnboundedReceiver<Message> {
        self.inner.connect(user_id, conn_id).await
    }

    pub async fn disconnect(&self, user_id: DbId, conn_id: Uuid) {
        self.inner.disconnect(user_id, conn_id).await
    }

    /// Deliver `payload` to every session the user currently has open.
    /// Absence of a connection is not an error. Returns the delivery count.
    pub async fn send_to_user(&self, user_id: DbId, payload: &serde_json::Value) -> usize {
        self.inner
            .send_to_key(user_id, Message::Text(payload.to_string().into()))
            .await
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.connection_count().await
    }

    /// Keepalive ping to every bridge session.
    pub async fn ping_all(&self) {
        self.inner.ping_all().await
    }

    pub async fn shutdown_all(&self) {
        self.inner.shutdown_all().await
    }
}

impl Default for UserHub {
    fn default() -> Self {
        Self::new()
    }
}
