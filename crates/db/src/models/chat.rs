//! Chat room, message, and read-mark models.

use serde::Serialize;
use sqlx::FromRow;
use toonhub_core::types::{DbId, Timestamp};

/// A row from the `chat_rooms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatRoom {
    pub id: DbId,
    pub employer_id: DbId,
    pub employee_id: DbId,
    /// `None` for the pair's general room.
    pub job_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// A row from the `chat_messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatMessage {
    pub id: DbId,
    pub room_id: DbId,
    pub sender_id: DbId,
    pub message_type: String,
    pub content: String,
    pub sent_at: Timestamp,
}

/// Message joined with sender identity, as broadcast to sockets and
/// returned from the history endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatMessageWithSender {
    pub id: DbId,
    pub room_id: DbId,
    pub sender_id: DbId,
    pub message_type: String,
    pub content: String,
    pub sent_at: Timestamp,
    pub sender_email: String,
    pub sender_role: String,
}

/// Room plus the display fields the room-list view needs.
#[derive(Debug, Clone, FromRow)]
pub struct RoomListEntry {
    pub id: DbId,
    pub employee_id: DbId,
    /// The employee's login user id, needed for unread attribution.
    pub employee_user_id: Option<DbId>,
    pub employee_name: String,
    pub last_message_type: Option<String>,
    pub last_message_content: Option<String>,
    pub last_message_time: Option<Timestamp>,
}
