//! Repository for the `users` table.

use sqlx::PgPool;
use toonhub_core::types::DbId;

use crate::models::user::User;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, hashed_password, role, telegram_report_chat_id, created_at";

/// Provides read operations for users. Account creation lives in the
/// external identity service.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// The employer's private Telegram report chat id, if configured.
    pub async fn report_chat_id(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        let chat_id: Option<Option<String>> =
            sqlx::query_scalar("SELECT telegram_report_chat_id FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(chat_id.flatten())
    }
}
