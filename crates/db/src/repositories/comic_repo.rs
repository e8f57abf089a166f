//! Repository for the `comics` table.

use sqlx::PgPool;
use toonhub_core::types::DbId;

use crate::models::comic::Comic;

const COLUMNS: &str = "id, employer_id, title, last_updated_ep, created_at";

/// Provides the comic reads and the one write the job lifecycle needs.
pub struct ComicRepo;

impl ComicRepo {
    /// Find a comic by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Comic>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comics WHERE id = $1");
        sqlx::query_as::<_, Comic>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Raise `last_updated_ep` to `episode` if it is currently lower.
    ///
    /// Archiving an older episode after a newer one must not move the
    /// counter backwards, hence `GREATEST` rather than a plain assignment.
    pub async fn raise_last_updated_ep(
        pool: &PgPool,
        id: DbId,
        episode: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE comics SET last_updated_ep = GREATEST(last_updated_ep, $2) WHERE id = $1")
            .bind(id)
            .bind(episode)
            .execute(pool)
            .await?;
        Ok(())
    }
}
