//! Route definitions for the `/chat` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::chat;
use crate::state::AppState;
use crate::ws;

/// Routes mounted at `/chat`.
///
/// ```text
/// GET    /ws/{room_id}                       -> chat WebSocket session
/// POST   /rooms/find-or-create               -> employer find-or-create
/// POST   /rooms/employee/find-or-create      -> employee find-or-create
/// GET    /rooms/all                          -> employer room list + unread
/// GET    /rooms/my-unread-count              -> employee unread badge
/// GET    /rooms/{room_id}/messages           -> ordered history
/// POST   /rooms/{room_id}/upload-file        -> store an attachment blob
/// POST   /rooms/{room_id}/read/{message_id}  -> advance read watermark
/// DELETE /rooms/{room_id}                    -> cascade-delete the room
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws/{room_id}", get(ws::chat_ws_handler))
        .route("/rooms/find-or-create", post(chat::find_or_create_room_employer))
        .route(
            "/rooms/employee/find-or-create",
            post(chat::find_or_create_room_employee),
        )
        .route("/rooms/all", get(chat::list_rooms))
        .route("/rooms/my-unread-count", get(chat::my_unread_count))
        .route("/rooms/{room_id}/messages", get(chat::room_history))
        .route("/rooms/{room_id}/upload-file", post(chat::upload_attachment))
        .route(
            "/rooms/{room_id}/read/{last_message_id}",
            post(chat::mark_read),
        )
        .route("/rooms/{room_id}", delete(chat::delete_room))
}
