//! Employee entity model.

use serde::Serialize;
use sqlx::FromRow;
use toonhub_core::types::{DbId, Timestamp};

/// A row from the `employees` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Employee {
    pub id: DbId,
    /// The employer (a `users` row) this profile belongs to.
    pub employer_id: DbId,
    /// Login account; `None` until the invited employee registers.
    pub user_id: Option<DbId>,
    pub name: String,
    /// Telegram chat id for direct assignment alerts.
    pub telegram_chat_id: Option<String>,
    pub created_at: Timestamp,
}
