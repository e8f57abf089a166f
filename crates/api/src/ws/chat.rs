//! Chat room WebSocket session handler.
//!
//! One session per open socket: authenticate from the `token` query
//! parameter, register with the room hub, then loop over inbound frames.
//! Content-level problems (malformed JSON, unknown type, missing fields)
//! are logged and ignored; only transport or auth problems end the session.
//! Every exit path unregisters the socket from the hub.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use toonhub_core::chat::MessageType;
use toonhub_core::types::DbId;
use toonhub_db::models::chat::{ChatMessageWithSender, ChatRoom};
use toonhub_db::models::user::User;
use toonhub_db::repositories::{ChatRepo, EmployeeRepo, UserRepo};
use toonhub_events::{Notice, NoticeDirection};
use uuid::Uuid;

use crate::auth::jwt::validate_token;
use crate::state::AppState;

/// RFC 6455 policy-violation close code, sent on auth failure.
const CLOSE_POLICY_VIOLATION: u16 = 1008;

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: String,
}

/// HTTP handler that upgrades `/chat/ws/{room_id}` to a WebSocket session.
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<DbId>,
    Query(query): Query<WsAuthQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, query.token))
}

/// Close the socket with policy-violation semantics, pre-registration.
async fn close_unauthorized(mut socket: WebSocket) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: CLOSE_POLICY_VIOLATION,
            reason: "authentication failed".into(),
        })))
        .await;
}

/// Manage a single chat socket after upgrade.
async fn handle_socket(socket: WebSocket, state: AppState, room_id: DbId, token: String) {
    // Authenticate before any registry registration.
    let claims = match validate_token(&token, &state.config.jwt) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(room_id, error = %e, "Chat socket rejected: bad token");
            close_unauthorized(socket).await;
            return;
        }
    };

    let sender = match UserRepo::find_by_id(&state.pool, claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(room_id, user_id = claims.sub, "Chat socket rejected: unknown user");
            close_unauthorized(socket).await;
            return;
        }
        Err(e) => {
            tracing::error!(room_id, error = %e, "Chat socket rejected: user lookup failed");
            close_unauthorized(socket).await;
            return;
        }
    };

    let conn_id = Uuid::new_v4();
    tracing::info!(room_id, user_id = sender.id, %conn_id, "Chat socket connected");

    // Register and get the receiver for outbound messages.
    let mut rx = state.room_hub.connect(room_id, conn_id).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward hub messages to the WebSocket sink.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Receiver loop: process inbound frames.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Err(e) = handle_frame(&state, room_id, &sender, text.as_str()).await {
                    tracing::error!(room_id, user_id = sender.id, error = %e, "Chat session error");
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) | Ok(Message::Ping(_)) => {}
            Ok(_) => {
                tracing::warn!(room_id, user_id = sender.id, "Ignoring non-text chat frame");
            }
            Err(e) => {
                tracing::debug!(room_id, %conn_id, error = %e, "Chat socket receive error");
                break;
            }
        }
    }

    // Clean up on every exit path: unregister and stop the sender task.
    state.room_hub.disconnect(room_id, conn_id).await;
    send_task.abort();
    tracing::info!(room_id, user_id = sender.id, %conn_id, "Chat socket disconnected");
}

/// Process one inbound text frame.
///
/// Returns `Err` only for unrecoverable failures (database down); content
/// problems are absorbed here with a log line.
async fn handle_frame(
    state: &AppState,
    room_id: DbId,
    sender: &User,
    raw: &str,
) -> Result<(), sqlx::Error> {
    let Ok(frame) = serde_json::from_str::<serde_json::Value>(raw) else {
        tracing::warn!(room_id, user_id = sender.id, "Dropping malformed chat frame");
        return Ok(());
    };

    let frame_type = frame.get("type").and_then(|v| v.as_str()).unwrap_or("text");

    if frame_type == "delete" {
        return handle_delete(state, room_id, sender, &frame).await;
    }

    let Some(message_type) = MessageType::parse(frame_type) else {
        tracing::warn!(room_id, user_id = sender.id, frame_type, "Dropping unknown frame type");
        return Ok(());
    };

    let Some(content) = frame.get("content").and_then(|v| v.as_str()) else {
        tracing::warn!(room_id, user_id = sender.id, frame_type, "Dropping frame with no content");
        return Ok(());
    };

    // Persist first, then broadcast: a client must never see a broadcast
    // for a message it cannot yet fetch from history.
    let message = ChatRepo::insert_message(
        &state.pool,
        room_id,
        sender.id,
        message_type.as_str(),
        content,
    )
    .await?;

    let outbound = ChatMessageWithSender {
        id: message.id,
        room_id: message.room_id,
        sender_id: message.sender_id,
        message_type: message.message_type,
        content: message.content,
        sent_at: message.sent_at,
        sender_email: sender.email.clone(),
        sender_role: sender.role.clone(),
    };
    let payload = serde_json::to_value(&outbound).unwrap_or_default();
    state.room_hub.broadcast(room_id, &payload).await;

    notify_other_participant(state, room_id, sender, message_type, content).await;

    Ok(())
}

/// Authorize and execute a message delete, then broadcast the tombstone.
///
/// A stale or foreign `message_id` is silently ignored: the frame may refer
/// to a message another client already removed.
async fn handle_delete(
    state: &AppState,
    room_id: DbId,
    sender: &User,
    frame: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    let Some(message_id) = frame.get("message_id").and_then(|v| v.as_i64()) else {
        tracing::warn!(room_id, user_id = sender.id, "Dropping delete frame with no message_id");
        return Ok(());
    };

    let deleted = ChatRepo::delete_message(&state.pool, message_id, sender.id, room_id).await?;
    if deleted {
        let payload = serde_json::json!({ "type": "delete", "message_id": message_id });
        state.room_hub.broadcast(room_id, &payload).await;
    }
    Ok(())
}

/// Short body used for push / bridge / Telegram chat notices.
fn preview(message_type: MessageType, content: &str) -> String {
    match message_type {
        MessageType::Text => content.to_string(),
        MessageType::Image => "Sent an image".to_string(),
        MessageType::File => "Sent a file".to_string(),
        MessageType::Context => "Shared a job".to_string(),
    }
}

/// Publish a chat notice addressed to the participant who did NOT send the
/// message. Lookup failures are logged and swallowed: the message itself is
/// already committed and broadcast.
async fn notify_other_participant(
    state: &AppState,
    room_id: DbId,
    sender: &User,
    message_type: MessageType,
    content: &str,
) {
    let room = match ChatRepo::find_room(&state.pool, room_id).await {
        Ok(Some(room)) => room,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(room_id, error = %e, "Chat notice skipped: room lookup failed");
            return;
        }
    };

    let Some((target_user_id, direction)) = resolve_target(state, &room, sender.id).await else {
        return;
    };

    state.notice_bus.publish(Notice::chat(
        direction,
        target_user_id,
        format!("Message from {}", sender.email),
        preview(message_type, content),
        room_id,
    ));
}

/// The other participant's user id and the notice direction.
async fn resolve_target(
    state: &AppState,
    room: &ChatRoom,
    sender_user_id: DbId,
) -> Option<(DbId, NoticeDirection)> {
    if sender_user_id == room.employer_id {
        // Employer wrote: target the employee's login user, if linked.
        match EmployeeRepo::find_by_id(&state.pool, room.employee_id).await {
            Ok(Some(employee)) => employee
                .user_id
                .map(|user_id| (user_id, NoticeDirection::ToEmployee)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(room_id = room.id, error = %e, "Chat notice skipped: employee lookup failed");
                None
            }
        }
    } else {
        Some((room.employer_id, NoticeDirection::ToEmployer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_shows_text_and_summarizes_attachments() {
        assert_eq!(preview(MessageType::Text, "hello"), "hello");
        assert_eq!(preview(MessageType::Image, "chat/1/x.png"), "Sent an image");
        assert_eq!(preview(MessageType::File, "chat/1/x.zip"), "Sent a file");
        assert_eq!(preview(MessageType::Context, "CONTEXT:A::1"), "Shared a job");
    }
}
