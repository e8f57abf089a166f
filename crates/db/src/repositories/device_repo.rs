//! Repository for the `device_registrations` table.

use sqlx::PgPool;
use toonhub_core::types::DbId;

pub struct DeviceRepo;

impl DeviceRepo {
    /// Register a device token for a user.
    ///
    /// Tokens are globally unique: re-registering an existing token
    /// reassigns it to the caller (a device changing accounts) and
    /// re-activates it.
    pub async fn register(pool: &PgPool, user_id: DbId, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO device_registrations (user_id, device_token)
             VALUES ($1, $2)
             ON CONFLICT (device_token) DO UPDATE
                 SET user_id = EXCLUDED.user_id, is_active = true, updated_at = now()",
        )
        .bind(user_id)
        .bind(token)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Deactivate a token owned by the caller. Soft-delete only: the row is
    /// kept for delivery history. Returns whether a row was deactivated.
    pub async fn unregister(pool: &PgPool, user_id: DbId, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE device_registrations SET is_active = false, updated_at = now()
             WHERE device_token = $1 AND user_id = $2",
        )
        .bind(token)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All active tokens for a user, for one batched push send.
    pub async fn active_tokens(pool: &PgPool, user_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT device_token FROM device_registrations WHERE user_id = $1 AND is_active",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
