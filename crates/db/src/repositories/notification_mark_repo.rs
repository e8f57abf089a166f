//! Repository for the `notification_marks` table.
//!
//! One row per recipient holding the kind of the last notice delivered to
//! them over Telegram. The fan-out dispatcher is the only reader and writer;
//! nothing in the job or chat domain touches these rows.

use sqlx::PgPool;
use toonhub_core::types::DbId;

pub struct NotificationMarkRepo;

impl NotificationMarkRepo {
    /// The kind of the last notice delivered to the user, if any.
    pub async fn last_kind(pool: &PgPool, user_id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT last_kind FROM notification_marks WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Record `kind` as the user's most recent delivered notice.
    pub async fn set_last_kind(
        pool: &PgPool,
        user_id: DbId,
        kind: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO notification_marks (user_id, last_kind)
             VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE
                 SET last_kind = EXCLUDED.last_kind, updated_at = now()",
        )
        .bind(user_id)
        .bind(kind)
        .execute(pool)
        .await?;
        Ok(())
    }
}
