//! User entity model.

use serde::Serialize;
use sqlx::FromRow;
use toonhub_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses
/// directly. Credential issuance lives in an external service; this row is
/// read for auth context, chat sender enrichment, and Telegram routing.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub hashed_password: String,
    /// `"employer"` or `"employee"` (see `toonhub_core::roles`).
    pub role: String,
    /// Chat id of the employer's private Telegram report channel.
    pub telegram_report_chat_id: Option<String>,
    pub created_at: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub role: String,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
        }
    }
}
