//! Repository for the `chat_read_marks` table.
//!
//! A watermark is the highest message id a user has acknowledged in a room.
//! Two rules hold regardless of call order: the stored value never
//! decreases, and it never exceeds the room's current maximum message id.

use sqlx::PgPool;
use toonhub_core::types::DbId;

use super::chat_repo::ChatRepo;

/// Clamp a client-proposed watermark to the room's actual maximum.
///
/// A proposal above the true maximum is silently capped; an empty room
/// (no maximum) keeps the proposal, which the `GREATEST` upsert then treats
/// like any other value.
fn clamp_proposed(proposed: DbId, max_in_room: Option<DbId>) -> DbId {
    match max_in_room {
        Some(max) => proposed.min(max),
        None => proposed,
    }
}

pub struct WatermarkRepo;

impl WatermarkRepo {
    /// Record that `user_id` has read up to `proposed_message_id` in the
    /// room. Returns the id actually stored after clamping.
    ///
    /// The upsert uses `GREATEST(existing, proposed)` so a stale lower
    /// proposal arriving after a higher one is absorbed without regressing
    /// the stored watermark.
    pub async fn mark_read(
        pool: &PgPool,
        room_id: DbId,
        user_id: DbId,
        proposed_message_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        let max_id = ChatRepo::max_message_id(pool, room_id).await?;
        let clamped = clamp_proposed(proposed_message_id, max_id);

        let stored: DbId = sqlx::query_scalar(
            "INSERT INTO chat_read_marks (room_id, user_id, last_read_message_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (room_id, user_id) DO UPDATE
                 SET last_read_message_id = GREATEST(chat_read_marks.last_read_message_id, EXCLUDED.last_read_message_id)
             RETURNING last_read_message_id",
        )
        .bind(room_id)
        .bind(user_id)
        .bind(clamped)
        .fetch_one(pool)
        .await?;

        Ok(stored)
    }

    /// The user's stored watermark for a room, or `None` before the first
    /// `mark_read` call.
    pub async fn get(
        pool: &PgPool,
        room_id: DbId,
        user_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT last_read_message_id FROM chat_read_marks WHERE room_id = $1 AND user_id = $2",
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Messages in the room authored by `other_user_id` with an id above the
    /// viewer's watermark. A viewer with no watermark row counts everything
    /// the other participant ever sent.
    pub async fn unread_count(
        pool: &PgPool,
        room_id: DbId,
        viewer_user_id: DbId,
        other_user_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM chat_messages
             WHERE room_id = $1
               AND sender_id = $2
               AND id > COALESCE((SELECT last_read_message_id FROM chat_read_marks
                                  WHERE room_id = $1 AND user_id = $3), 0)",
        )
        .bind(room_id)
        .bind(other_user_id)
        .bind(viewer_user_id)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_is_capped_to_room_maximum() {
        assert_eq!(clamp_proposed(99, Some(7)), 7);
        assert_eq!(clamp_proposed(5, Some(7)), 5);
        assert_eq!(clamp_proposed(7, Some(7)), 7);
    }

    #[test]
    fn empty_room_keeps_the_proposal() {
        assert_eq!(clamp_proposed(3, None), 3);
    }
}
