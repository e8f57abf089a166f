//! Personal event bridge WebSocket handler.
//!
//! A user-scoped socket that only pushes notice envelopes; the companion
//! app holds it open to receive real-time events outside any chat room.
//! Inbound frames are keepalives: a read timeout resets the wait rather
//! than closing the connection.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use toonhub_core::types::DbId;
use uuid::Uuid;

use crate::auth::jwt::validate_token;
use crate::state::AppState;
use crate::ws::chat::WsAuthQuery;

/// RFC 6455 policy-violation close code, sent on auth failure.
const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// How long to wait for a client frame before resetting the wait.
const READ_WINDOW: Duration = Duration::from_secs(60);

/// HTTP handler that upgrades `/notifications/ws/{user_id}` to the bridge
/// channel.
pub async fn bridge_ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<DbId>,
    Query(query): Query<WsAuthQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id, query.token))
}

/// Manage a single bridge socket after upgrade.
async fn handle_socket(mut socket: WebSocket, state: AppState, user_id: DbId, token: String) {
    // The token must be valid AND belong to the user the address names.
    let authorized = match validate_token(&token, &state.config.jwt) {
        Ok(claims) => claims.sub == user_id,
        Err(_) => false,
    };
    if !authorized {
        tracing::warn!(user_id, "Bridge socket rejected: bad token");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_POLICY_VIOLATION,
                reason: "authentication failed".into(),
            })))
            .await;
        return;
    }

    let conn_id = Uuid::new_v4();
    tracing::info!(user_id, %conn_id, "Bridge socket connected");

    let mut rx = state.user_hub.connect(user_id, conn_id).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward notice envelopes to the WebSocket sink.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Receiver loop: inbound traffic is keepalive only. A read timeout is
    // expected when the client is idle; just wait again.
    loop {
        match tokio::time::timeout(READ_WINDOW, stream.next()).await {
            Err(_elapsed) => continue,
            Ok(None) => break,
            Ok(Some(Ok(Message::Close(_)))) => break,
            Ok(Some(Ok(_keepalive))) => {
                tracing::trace!(user_id, %conn_id, "Bridge keepalive received");
            }
            Ok(Some(Err(e))) => {
                tracing::debug!(user_id, %conn_id, error = %e, "Bridge socket receive error");
                break;
            }
        }
    }

    state.user_hub.disconnect(user_id, conn_id).await;
    send_task.abort();
    tracing::info!(user_id, %conn_id, "Bridge socket disconnected");
}
