//! Comic entity model.
//!
//! Comic CRUD is owned by an external service; the coordination core reads
//! the owner for authorization checks and raises `last_updated_ep` when a
//! job is archived.

use serde::Serialize;
use sqlx::FromRow;
use toonhub_core::types::{DbId, Timestamp};

/// A row from the `comics` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comic {
    pub id: DbId,
    pub employer_id: DbId,
    pub title: String,
    /// Highest archived episode number; drives downstream comic status.
    pub last_updated_ep: i32,
    pub created_at: Timestamp,
}
