//! REST handlers for the `/chat` resource.
//!
//! Rooms are created lazily on first contact and deleted by either
//! participant; deletion cascades attachments (best-effort), watermarks,
//! messages, then the room, after which the next find-or-create produces a
//! fresh room transparently.

use axum::extract::{Multipart, Path, State};
use axum::Form;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use toonhub_core::chat::{context_content, MessageType};
use toonhub_core::error::CoreError;
use toonhub_core::types::{DbId, Timestamp};
use toonhub_db::models::chat::{ChatMessageWithSender, ChatRoom};
use toonhub_db::repositories::{ChatRepo, EmployeeRepo, JobRepo, WatermarkRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::RequireEmployer;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Find-or-create
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EmployerFindOrCreate {
    pub participant_employee_id: DbId,
    pub job_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct EmployeeFindOrCreate {
    pub job_id: Option<DbId>,
}

/// Append a synthetic `context` message summarizing the job. The general
/// room stays general: context is conversational, not structural.
async fn attach_job_context(
    state: &AppState,
    room_id: DbId,
    job_id: DbId,
    acting_user_id: DbId,
) -> AppResult<()> {
    let Some(job) = JobRepo::find_with_context(&state.pool, job_id).await? else {
        // A stale job reference just means no context card.
        return Ok(());
    };

    let content = context_content(&job.comic_title, job.episode_number, job_id);
    ChatRepo::insert_message(
        &state.pool,
        room_id,
        acting_user_id,
        MessageType::Context.as_str(),
        &content,
    )
    .await?;
    Ok(())
}

/// POST /api/v1/chat/rooms/find-or-create
///
/// Employer opens (or re-opens) the general room with one of their
/// employees, optionally attaching a job context card.
pub async fn find_or_create_room_employer(
    RequireEmployer(auth): RequireEmployer,
    State(state): State<AppState>,
    Form(payload): Form<EmployerFindOrCreate>,
) -> AppResult<Json<serde_json::Value>> {
    let employee = EmployeeRepo::find_by_id(&state.pool, payload.participant_employee_id)
        .await?
        .filter(|e| e.employer_id == auth.user_id)
        .ok_or(AppError::Core(CoreError::Forbidden(
            "Employee not found or not owned by caller".into(),
        )))?;

    let room = ChatRepo::find_or_create_general(&state.pool, auth.user_id, employee.id).await?;

    if let Some(job_id) = payload.job_id {
        attach_job_context(&state, room.id, job_id, auth.user_id).await?;
    }

    Ok(Json(json!({ "room_id": room.id })))
}

/// POST /api/v1/chat/rooms/employee/find-or-create
///
/// Employee-side twin: resolves the caller's profile, then the same
/// find-or-create against their employer.
pub async fn find_or_create_room_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Form(payload): Form<EmployeeFindOrCreate>,
) -> AppResult<Json<serde_json::Value>> {
    let employee = EmployeeRepo::find_by_user_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Employee profile",
            id: auth.user_id,
        }))?;

    let room =
        ChatRepo::find_or_create_general(&state.pool, employee.employer_id, employee.id).await?;

    if let Some(job_id) = payload.job_id {
        attach_job_context(&state, room.id, job_id, auth.user_id).await?;
    }

    Ok(Json(json!({ "room_id": room.id })))
}

// ---------------------------------------------------------------------------
// Room list
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RoomSummary {
    pub id: DbId,
    pub participant_name: String,
    pub participant_role: &'static str,
    pub last_message: Option<String>,
    pub last_message_time: Option<Timestamp>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct RoomListResponse {
    pub total_unread_count: i64,
    pub rooms: Vec<RoomSummary>,
}

/// One-line preview of the latest message, by type.
fn last_message_preview(message_type: Option<&str>, content: Option<&str>) -> Option<String> {
    match message_type? {
        "text" => content.map(str::to_string),
        "image" => Some("Image...".to_string()),
        "file" => Some("File attachment...".to_string()),
        "context" => Some("Shared a job...".to_string()),
        _ => None,
    }
}

/// GET /api/v1/chat/rooms/all
///
/// The employer's rooms with per-room unread counts and the grand total.
/// Rooms with no messages yet count zero.
pub async fn list_rooms(
    RequireEmployer(auth): RequireEmployer,
    State(state): State<AppState>,
) -> AppResult<Json<RoomListResponse>> {
    let entries = ChatRepo::list_rooms_for_employer(&state.pool, auth.user_id).await?;

    let mut total_unread_count = 0;
    let mut rooms = Vec::with_capacity(entries.len());

    for entry in entries {
        // Unread = messages the employee's login user sent above the
        // employer's watermark; an unlinked employee cannot have sent any.
        let unread_count = match entry.employee_user_id {
            Some(employee_user_id) => {
                WatermarkRepo::unread_count(&state.pool, entry.id, auth.user_id, employee_user_id)
                    .await?
            }
            None => 0,
        };
        total_unread_count += unread_count;

        rooms.push(RoomSummary {
            id: entry.id,
            participant_name: entry.employee_name,
            participant_role: "employee",
            last_message: last_message_preview(
                entry.last_message_type.as_deref(),
                entry.last_message_content.as_deref(),
            ),
            last_message_time: entry.last_message_time,
            unread_count,
        });
    }

    Ok(Json(RoomListResponse {
        total_unread_count,
        rooms,
    }))
}

/// GET /api/v1/chat/rooms/my-unread-count
///
/// Employee-side badge count for the general room.
pub async fn my_unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let Some(employee) = EmployeeRepo::find_by_user_id(&state.pool, auth.user_id).await? else {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only employees can access this endpoint".into(),
        )));
    };

    let Some(room) = ChatRepo::find_general_for_employee(&state.pool, employee.id).await? else {
        return Ok(Json(json!({ "total_unread": 0 })));
    };

    let total_unread =
        WatermarkRepo::unread_count(&state.pool, room.id, auth.user_id, employee.employer_id)
            .await?;

    Ok(Json(json!({ "total_unread": total_unread })))
}

// ---------------------------------------------------------------------------
// History / attachments / read marks
// ---------------------------------------------------------------------------

/// Fetch a room by ID or 404.
async fn load_room(pool: &sqlx::PgPool, room_id: DbId) -> AppResult<ChatRoom> {
    ChatRepo::find_room(pool, room_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Chat room",
            id: room_id,
        }))
}

/// Verify the caller is the room's employer or its linked employee.
async fn authorize_room_participant(
    pool: &sqlx::PgPool,
    room: &ChatRoom,
    user_id: DbId,
) -> AppResult<()> {
    if room.employer_id == user_id {
        return Ok(());
    }
    let employee = EmployeeRepo::find_by_id(pool, room.employee_id).await?;
    if employee.is_some_and(|e| e.user_id == Some(user_id)) {
        return Ok(());
    }
    Err(AppError::Core(CoreError::Forbidden(
        "Not a participant of this chat room".into(),
    )))
}

/// GET /api/v1/chat/rooms/{room_id}/messages
///
/// Full ordered history. Not paginated; room volumes stay small enough.
pub async fn room_history(
    auth: AuthUser,
    Path(room_id): Path<DbId>,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ChatMessageWithSender>>>> {
    let room = load_room(&state.pool, room_id).await?;
    authorize_room_participant(&state.pool, &room, auth.user_id).await?;

    let messages = ChatRepo::list_history(&state.pool, room_id).await?;
    Ok(Json(DataResponse { data: messages }))
}

/// POST /api/v1/chat/rooms/{room_id}/upload-file
///
/// Store an attachment blob for the room. The returned key is what the
/// client then sends as the `content` of an `image`/`file` frame.
pub async fn upload_attachment(
    auth: AuthUser,
    Path(room_id): Path<DbId>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<serde_json::Value>> {
    let room = load_room(&state.pool, room_id).await?;
    authorize_room_participant(&state.pool, &room, auth.user_id).await?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
        .ok_or_else(|| AppError::BadRequest("Missing file part".into()))?;

    let filename = field.file_name().unwrap_or("attachment").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read file part: {e}")))?;

    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let key = format!("chat_files/chat_{room_id}_{stamp}_{filename}");
    let key = state
        .blob_store
        .put(&key, bytes.to_vec(), content_type.as_deref())
        .await?;

    Ok(Json(json!({ "file_name": key })))
}

/// POST /api/v1/chat/rooms/{room_id}/read/{last_message_id}
///
/// Advance the caller's read watermark. The stored value is clamped to the
/// room's maximum message id and never decreases.
pub async fn mark_read(
    auth: AuthUser,
    Path((room_id, last_message_id)): Path<(DbId, DbId)>,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    if last_message_id <= 0 {
        return Ok(Json(
            json!({ "message": "Invalid last_message_id", "last_marked_id": 0 }),
        ));
    }

    let room = load_room(&state.pool, room_id).await?;
    authorize_room_participant(&state.pool, &room, auth.user_id).await?;

    let marked =
        WatermarkRepo::mark_read(&state.pool, room_id, auth.user_id, last_message_id).await?;

    Ok(Json(
        json!({ "message": "Read status updated", "last_marked_id": marked }),
    ))
}

// ---------------------------------------------------------------------------
// Delete room
// ---------------------------------------------------------------------------

/// DELETE /api/v1/chat/rooms/{room_id}
///
/// Participant-only. Attachment blobs go first (best-effort, log and
/// continue on a missing blob), then watermarks, messages, and the room
/// row. The next find-or-create for the pair creates a fresh room.
pub async fn delete_room(
    auth: AuthUser,
    Path(room_id): Path<DbId>,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let room = load_room(&state.pool, room_id).await?;
    authorize_room_participant(&state.pool, &room, auth.user_id).await?;

    let keys = ChatRepo::attachment_keys(&state.pool, room_id).await?;
    for key in &keys {
        if let Err(e) = state.blob_store.delete(key).await {
            tracing::warn!(room_id, key, error = %e, "Failed to delete chat attachment, continuing");
        }
    }

    ChatRepo::delete_room(&state.pool, room_id).await?;
    tracing::info!(room_id, attachments = keys.len(), "Chat room deleted");

    Ok(Json(json!({ "message": "Chat room deleted successfully" })))
}
