//! Repository for the `chat_rooms` and `chat_messages` tables.

use sqlx::PgPool;
use toonhub_core::types::DbId;

use crate::models::chat::{ChatMessage, ChatMessageWithSender, ChatRoom, RoomListEntry};

const ROOM_COLUMNS: &str = "id, employer_id, employee_id, job_id, created_at";
const MESSAGE_COLUMNS: &str = "id, room_id, sender_id, message_type, content, sent_at";

pub struct ChatRepo;

impl ChatRepo {
    /// Find or create the unique general room for an (employer, employee)
    /// pair.
    ///
    /// The insert races on the `uq_chat_rooms_general` partial unique index:
    /// `ON CONFLICT DO NOTHING` swallows a concurrent winner and the
    /// follow-up select reads whichever row won. No application lock is
    /// held at any point.
    pub async fn find_or_create_general(
        pool: &PgPool,
        employer_id: DbId,
        employee_id: DbId,
    ) -> Result<ChatRoom, sqlx::Error> {
        let query = format!(
            "INSERT INTO chat_rooms (employer_id, employee_id, job_id)
             VALUES ($1, $2, NULL)
             ON CONFLICT (employer_id, employee_id) WHERE job_id IS NULL DO NOTHING
             RETURNING {ROOM_COLUMNS}"
        );
        if let Some(room) = sqlx::query_as::<_, ChatRoom>(&query)
            .bind(employer_id)
            .bind(employee_id)
            .fetch_optional(pool)
            .await?
        {
            return Ok(room);
        }

        // Lost the race (or the room already existed): re-read.
        let query = format!(
            "SELECT {ROOM_COLUMNS} FROM chat_rooms
             WHERE employer_id = $1 AND employee_id = $2 AND job_id IS NULL"
        );
        sqlx::query_as::<_, ChatRoom>(&query)
            .bind(employer_id)
            .bind(employee_id)
            .fetch_one(pool)
            .await
    }

    /// Find a room by internal ID.
    pub async fn find_room(pool: &PgPool, room_id: DbId) -> Result<Option<ChatRoom>, sqlx::Error> {
        let query = format!("SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE id = $1");
        sqlx::query_as::<_, ChatRoom>(&query)
            .bind(room_id)
            .fetch_optional(pool)
            .await
    }

    /// The general room for an employee profile, if one currently exists.
    pub async fn find_general_for_employee(
        pool: &PgPool,
        employee_id: DbId,
    ) -> Result<Option<ChatRoom>, sqlx::Error> {
        let query = format!(
            "SELECT {ROOM_COLUMNS} FROM chat_rooms
             WHERE employee_id = $1 AND job_id IS NULL"
        );
        sqlx::query_as::<_, ChatRoom>(&query)
            .bind(employee_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a message, returning the persisted row.
    pub async fn insert_message(
        pool: &PgPool,
        room_id: DbId,
        sender_id: DbId,
        message_type: &str,
        content: &str,
    ) -> Result<ChatMessage, sqlx::Error> {
        let query = format!(
            "INSERT INTO chat_messages (room_id, sender_id, message_type, content)
             VALUES ($1, $2, $3, $4)
             RETURNING {MESSAGE_COLUMNS}"
        );
        sqlx::query_as::<_, ChatMessage>(&query)
            .bind(room_id)
            .bind(sender_id)
            .bind(message_type)
            .bind(content)
            .fetch_one(pool)
            .await
    }

    /// Delete a message iff it belongs to `room_id` and was sent by
    /// `requester_id`. Returns whether a row was deleted.
    pub async fn delete_message(
        pool: &PgPool,
        message_id: DbId,
        requester_id: DbId,
        room_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM chat_messages WHERE id = $1 AND sender_id = $2 AND room_id = $3")
                .bind(message_id)
                .bind(requester_id)
                .bind(room_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Full room history ordered by (sent_at, id) ascending, with sender
    /// identity joined in.
    pub async fn list_history(
        pool: &PgPool,
        room_id: DbId,
    ) -> Result<Vec<ChatMessageWithSender>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessageWithSender>(
            "SELECT m.id, m.room_id, m.sender_id, m.message_type, m.content, m.sent_at,
                    u.email AS sender_email, u.role AS sender_role
             FROM chat_messages m
             JOIN users u ON u.id = m.sender_id
             WHERE m.room_id = $1
             ORDER BY m.sent_at, m.id",
        )
        .bind(room_id)
        .fetch_all(pool)
        .await
    }

    /// Highest message id in the room, or `None` when the room is empty.
    pub async fn max_message_id(pool: &PgPool, room_id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT MAX(id) FROM chat_messages WHERE room_id = $1")
            .bind(room_id)
            .fetch_one(pool)
            .await
    }

    /// Blob keys referenced by the room's image/file messages, for cleanup
    /// before the room cascade.
    pub async fn attachment_keys(pool: &PgPool, room_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT content FROM chat_messages
             WHERE room_id = $1 AND message_type IN ('image', 'file')",
        )
        .bind(room_id)
        .fetch_all(pool)
        .await
    }

    /// Delete a room and everything under it: read marks, then messages,
    /// then the room row. Attachment blobs are the caller's responsibility
    /// (best-effort, before calling this).
    pub async fn delete_room(pool: &PgPool, room_id: DbId) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM chat_read_marks WHERE room_id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM chat_messages WHERE room_id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM chat_rooms WHERE id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }

    /// The employer's rooms with employee identity and latest-message
    /// preview fields, most recently active first.
    pub async fn list_rooms_for_employer(
        pool: &PgPool,
        employer_id: DbId,
    ) -> Result<Vec<RoomListEntry>, sqlx::Error> {
        sqlx::query_as::<_, RoomListEntry>(
            "SELECT r.id, r.employee_id, e.user_id AS employee_user_id, e.name AS employee_name,
                    last.message_type AS last_message_type,
                    last.content AS last_message_content,
                    last.sent_at AS last_message_time
             FROM chat_rooms r
             JOIN employees e ON e.id = r.employee_id
             LEFT JOIN LATERAL (
                 SELECT message_type, content, sent_at
                 FROM chat_messages
                 WHERE room_id = r.id
                 ORDER BY sent_at DESC, id DESC
                 LIMIT 1
             ) last ON true
             WHERE r.employer_id = $1
             ORDER BY last.sent_at DESC NULLS LAST",
        )
        .bind(employer_id)
        .fetch_all(pool)
        .await
    }
}
