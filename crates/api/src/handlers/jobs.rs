//! Handlers for the `/jobs` resource: the job lifecycle state machine.
//!
//! Transitions are validated by `toonhub_core::jobs::validate_transition`
//! before any side effect runs. Two guard rules apply throughout: employer
//! actions require owning the **comic** the job belongs to (not merely the
//! job row), and the complete action requires the caller to be the login
//! user of the job's assigned employee.
//!
//! Blob deletions on the revision and archive paths are best-effort: a
//! missing blob is logged and never blocks the owning transition.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use toonhub_core::error::CoreError;
use toonhub_core::jobs::{validate_transition, JobStatus};
use toonhub_core::types::DbId;
use toonhub_db::models::comic::Comic;
use toonhub_db::models::employee::Employee;
use toonhub_db::models::job::{Job, NewJob};
use toonhub_db::repositories::{ComicRepo, EmployeeRepo, JobRepo};
use toonhub_events::{Notice, NoticeDirection, NoticeKind};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::RequireEmployer;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Multipart helpers
// ---------------------------------------------------------------------------

/// A file part read out of a multipart request.
struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Drain a multipart stream into text fields and file parts.
async fn read_multipart(
    mut multipart: Multipart,
) -> AppResult<(HashMap<String, String>, HashMap<String, UploadedFile>)> {
    let mut fields = HashMap::new();
    let mut files = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(filename) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file part: {e}")))?;
            files.insert(
                name,
                UploadedFile {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                },
            );
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read field: {e}")))?;
            fields.insert(name, value);
        }
    }

    Ok((fields, files))
}

fn required_field<'a>(fields: &'a HashMap<String, String>, name: &str) -> AppResult<&'a str> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| AppError::BadRequest(format!("Missing field '{name}'")))
}

fn parse_field<T: std::str::FromStr>(fields: &HashMap<String, String>, name: &str) -> AppResult<T> {
    required_field(fields, name)?
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Field '{name}' is not a valid value")))
}

/// Timestamp fragment baked into blob keys so re-uploads never collide.
fn key_stamp() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S").to_string()
}

// ---------------------------------------------------------------------------
// Guard helpers
// ---------------------------------------------------------------------------

/// Fetch a job by ID or 404.
async fn load_job(pool: &sqlx::PgPool, job_id: DbId) -> AppResult<Job> {
    JobRepo::find_by_id(pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))
}

/// Resolve the job's comic and verify the caller owns it.
///
/// Ownership runs through the comic because a job's comic determines who
/// the work belongs to; holding the job id alone grants nothing.
async fn authorize_comic_owner(
    pool: &sqlx::PgPool,
    job: &Job,
    user_id: DbId,
) -> AppResult<Comic> {
    let comic =
        ComicRepo::find_by_id(pool, job.comic_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Comic",
                id: job.comic_id,
            }))?;
    if comic.employer_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not authorized to modify this job".into(),
        )));
    }
    Ok(comic)
}

/// Resolve the job's assigned employee and verify the caller is its login
/// user.
async fn authorize_assigned_employee(
    pool: &sqlx::PgPool,
    job: &Job,
    user_id: DbId,
) -> AppResult<Employee> {
    let employee = EmployeeRepo::find_by_id(pool, job.employee_id).await?.ok_or(AppError::Core(
        CoreError::NotFound {
            entity: "Employee",
            id: job.employee_id,
        },
    ))?;
    if employee.user_id != Some(user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not authorized to complete this job".into(),
        )));
    }
    Ok(employee)
}

/// Verify the caller is either the comic owner or the assigned employee.
async fn authorize_participant(pool: &sqlx::PgPool, job: &Job, user_id: DbId) -> AppResult<()> {
    let comic = ComicRepo::find_by_id(pool, job.comic_id).await?;
    if comic.is_some_and(|c| c.employer_id == user_id) {
        return Ok(());
    }
    let employee = EmployeeRepo::find_by_id(pool, job.employee_id).await?;
    if employee.is_some_and(|e| e.user_id == Some(user_id)) {
        return Ok(());
    }
    Err(AppError::Core(CoreError::Forbidden(
        "Not authorized to access this job".into(),
    )))
}

/// Remove a blob, logging instead of failing: cleanup never blocks the
/// owning transition.
async fn delete_blob_best_effort(store: &dyn toonhub_core::storage::BlobStore, key: &str, job_id: DbId) {
    if let Err(e) = store.delete(key).await {
        tracing::warn!(job_id, key, error = %e, "Failed to delete job blob, continuing");
    }
}

fn parse_status(job: &Job) -> AppResult<JobStatus> {
    Ok(JobStatus::parse(&job.status).map_err(AppError::Core)?)
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Employer assigns a new job: multipart form with `comic_id`,
/// `employee_id`, `episode_number`, `task_type`, `rate`, a required
/// `work_file` part, and an optional `supplemental_file` part with
/// `supplemental_file_comment`. Returns 201 with the created job.
pub async fn create_job(
    RequireEmployer(auth): RequireEmployer,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (fields, mut files) = read_multipart(multipart).await?;

    let comic_id: DbId = parse_field(&fields, "comic_id")?;
    let employee_id: DbId = parse_field(&fields, "employee_id")?;
    let episode_number: i32 = parse_field(&fields, "episode_number")?;
    let task_type = required_field(&fields, "task_type")?.to_string();
    let rate: f64 = parse_field(&fields, "rate")?;

    if episode_number < 1 {
        return Err(AppError::Core(CoreError::Validation(
            "episode_number must be at least 1".into(),
        )));
    }
    if rate < 0.0 {
        return Err(AppError::Core(CoreError::Validation(
            "rate must not be negative".into(),
        )));
    }

    // Both the comic and the employee must belong to the calling employer.
    let comic = ComicRepo::find_by_id(&state.pool, comic_id)
        .await?
        .filter(|c| c.employer_id == auth.user_id)
        .ok_or(AppError::Core(CoreError::Forbidden(
            "Comic not found or not owned by caller".into(),
        )))?;
    let employee = EmployeeRepo::find_by_id(&state.pool, employee_id)
        .await?
        .filter(|e| e.employer_id == auth.user_id)
        .ok_or(AppError::Core(CoreError::Forbidden(
            "Employee not found or not owned by caller".into(),
        )))?;

    let work_file = files
        .remove("work_file")
        .ok_or_else(|| AppError::BadRequest("Missing file part 'work_file'".into()))?;

    let stamp = key_stamp();
    let work_key = format!("job_files/work_{stamp}_ep{episode_number}_{}", work_file.filename);
    let work_key = state
        .blob_store
        .put(&work_key, work_file.bytes, work_file.content_type.as_deref())
        .await?;

    let supplemental_key = match files.remove("supplemental_file") {
        Some(file) => {
            let key = format!("job_files/supp_{stamp}_ep{episode_number}_{}", file.filename);
            Some(
                state
                    .blob_store
                    .put(&key, file.bytes, file.content_type.as_deref())
                    .await?,
            )
        }
        None => None,
    };

    let job = JobRepo::create(
        &state.pool,
        &NewJob {
            comic_id,
            employee_id,
            episode_number,
            task_type: task_type.clone(),
            rate,
            employer_work_file: work_key,
            supplemental_file: supplemental_key,
            supplemental_file_comment: fields.get("supplemental_file_comment").cloned(),
        },
    )
    .await?;

    tracing::info!(job_id = job.id, comic_id, employee_id, "Job created");

    if let Some(target) = employee.user_id {
        state.notice_bus.publish(Notice::job(
            NoticeKind::NewJob,
            NoticeDirection::ToEmployee,
            target,
            format!("New {task_type} job!"),
            format!("You were assigned '{task_type}' for episode {episode_number} of '{}'", comic.title),
            job.id,
        ));
    }

    Ok((StatusCode::CREATED, Json(job)))
}

// ---------------------------------------------------------------------------
// Complete
// ---------------------------------------------------------------------------

/// PUT /api/v1/jobs/{job_id}/complete
///
/// The assigned employee submits the finished file. Replaces any previous
/// submission, deleting its blob best-effort.
pub async fn complete_job(
    auth: AuthUser,
    Path(job_id): Path<DbId>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<serde_json::Value>> {
    let job = load_job(&state.pool, job_id).await?;
    let employee = authorize_assigned_employee(&state.pool, &job, auth.user_id).await?;

    validate_transition(parse_status(&job)?, JobStatus::Completed).map_err(AppError::Core)?;

    let (_, mut files) = read_multipart(multipart).await?;
    let finished = files
        .remove("finished_file")
        .ok_or_else(|| AppError::BadRequest("Missing file part 'finished_file'".into()))?;

    let key = format!(
        "job_files/fin_{}_ep{}_{}",
        key_stamp(),
        job.episode_number,
        finished.filename
    );
    let key = state
        .blob_store
        .put(&key, finished.bytes, finished.content_type.as_deref())
        .await?;

    // Replace-and-delete: the old submission blob is dead weight now.
    if let Some(old_key) = &job.employee_finished_file {
        delete_blob_best_effort(state.blob_store.as_ref(), old_key, job.id).await;
    }

    JobRepo::mark_completed(&state.pool, job.id, &key).await?;
    tracing::info!(job_id = job.id, "Job completed");

    // The notification target is resolved via the comic, which determines
    // ownership of the work.
    let comic =
        ComicRepo::find_by_id(&state.pool, job.comic_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Comic",
                id: job.comic_id,
            }))?;

    state.notice_bus.publish(Notice::job(
        NoticeKind::JobComplete,
        NoticeDirection::ToEmployer,
        comic.employer_id,
        "Job completed!".to_string(),
        format!(
            "{} submitted '{}' (Ep {})",
            employee.name, comic.title, job.episode_number
        ),
        job.id,
    ));

    Ok(Json(json!({ "message": "Job completed successfully" })))
}

// ---------------------------------------------------------------------------
// Request revision
// ---------------------------------------------------------------------------

/// PUT /api/v1/jobs/{job_id}/request-revision
///
/// Only valid from COMPLETED. Discards the employee's submission and sends
/// the job back to ASSIGNED with the revision flag set.
pub async fn request_revision(
    RequireEmployer(auth): RequireEmployer,
    Path(job_id): Path<DbId>,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let job = load_job(&state.pool, job_id).await?;
    let comic = authorize_comic_owner(&state.pool, &job, auth.user_id).await?;

    validate_transition(parse_status(&job)?, JobStatus::Assigned).map_err(AppError::Core)?;

    if let Some(submission) = &job.employee_finished_file {
        delete_blob_best_effort(state.blob_store.as_ref(), submission, job.id).await;
    }

    JobRepo::mark_revision(&state.pool, job.id).await?;
    tracing::info!(job_id = job.id, "Job sent back for revision");

    let employee = EmployeeRepo::find_by_id(&state.pool, job.employee_id).await?;
    if let Some(target) = employee.and_then(|e| e.user_id) {
        state.notice_bus.publish(Notice::job(
            NoticeKind::RevisionRequest,
            NoticeDirection::ToEmployee,
            target,
            "Revision requested!".to_string(),
            format!(
                "Episode {} of '{}' needs another pass",
                job.episode_number, comic.title
            ),
            job.id,
        ));
    }

    Ok(Json(json!({ "message": "Job has been sent back for revision" })))
}

// ---------------------------------------------------------------------------
// Add supplemental file
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{job_id}/add-file
///
/// Employer attaches an extra file (reference art, translation notes) at
/// any point before the job is archived.
pub async fn add_supplemental_file(
    RequireEmployer(auth): RequireEmployer,
    Path(job_id): Path<DbId>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<serde_json::Value>> {
    let job = load_job(&state.pool, job_id).await?;
    let comic = authorize_comic_owner(&state.pool, &job, auth.user_id).await?;

    if parse_status(&job)? == JobStatus::Archived {
        return Err(AppError::Core(CoreError::Validation(
            "Cannot add files to an archived job".into(),
        )));
    }

    let (fields, mut files) = read_multipart(multipart).await?;
    let file = files
        .remove("file")
        .ok_or_else(|| AppError::BadRequest("Missing file part 'file'".into()))?;

    let key = format!("job_files/supp_{}_job{}_{}", key_stamp(), job.id, file.filename);
    let key = state
        .blob_store
        .put(&key, file.bytes, file.content_type.as_deref())
        .await?;

    let record =
        JobRepo::add_supplemental_file(&state.pool, job.id, &key, fields.get("comment").map(String::as_str))
            .await?;
    tracing::info!(job_id = job.id, file_id = record.id, "Supplemental file added");

    let employee = EmployeeRepo::find_by_id(&state.pool, job.employee_id).await?;
    if let Some(target) = employee.and_then(|e| e.user_id) {
        state.notice_bus.publish(Notice::job(
            NoticeKind::FileAdded,
            NoticeDirection::ToEmployee,
            target,
            "New file added!".to_string(),
            format!(
                "A file was added to episode {} of '{}'",
                job.episode_number, comic.title
            ),
            job.id,
        ));
    }

    Ok(Json(json!({ "message": "File added successfully", "file_name": key })))
}

// ---------------------------------------------------------------------------
// Approve and archive
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{job_id}/approve-archive
///
/// Terminal transition: raises the comic's last-updated episode, purges
/// every blob the job references, nulls the references, and archives.
/// Silent by design -- no notice goes out.
pub async fn approve_and_archive(
    RequireEmployer(auth): RequireEmployer,
    Path(job_id): Path<DbId>,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let job = load_job(&state.pool, job_id).await?;
    authorize_comic_owner(&state.pool, &job, auth.user_id).await?;

    validate_transition(parse_status(&job)?, JobStatus::Archived).map_err(AppError::Core)?;

    ComicRepo::raise_last_updated_ep(&state.pool, job.comic_id, job.episode_number).await?;

    let mut keys: Vec<String> = Vec::new();
    keys.extend(job.employer_work_file.clone());
    keys.extend(job.employee_finished_file.clone());
    keys.extend(job.supplemental_file.clone());
    keys.extend(JobRepo::supplemental_blob_keys(&state.pool, job.id).await?);

    for key in &keys {
        delete_blob_best_effort(state.blob_store.as_ref(), key, job.id).await;
    }

    JobRepo::delete_supplemental_files(&state.pool, job.id).await?;
    JobRepo::mark_archived(&state.pool, job.id).await?;
    tracing::info!(job_id = job.id, purged = keys.len(), "Job approved and archived");

    Ok(Json(json!({ "message": "Job approved and files have been archived" })))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/all -- every job on the employer's comics.
pub async fn list_jobs(
    RequireEmployer(auth): RequireEmployer,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<toonhub_db::models::job::JobWithContext>>>> {
    let jobs = JobRepo::list_for_employer(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/my-jobs -- the calling employee's assignments.
pub async fn my_jobs(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<toonhub_db::models::job::JobWithContext>>>> {
    let employee = EmployeeRepo::find_by_user_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Employee profile",
            id: auth.user_id,
        }))?;
    let jobs = JobRepo::list_for_employee(&state.pool, employee.id).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/{job_id} -- participant-gated single job view.
pub async fn get_job(
    auth: AuthUser,
    Path(job_id): Path<DbId>,
    State(state): State<AppState>,
) -> AppResult<Json<toonhub_db::models::job::JobWithContext>> {
    let job = load_job(&state.pool, job_id).await?;
    authorize_participant(&state.pool, &job, auth.user_id).await?;

    let job = JobRepo::find_with_context(&state.pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;
    Ok(Json(job))
}

/// GET /api/v1/jobs/{job_id}/supplemental-files -- participant-gated list
/// of later-added files.
pub async fn list_supplemental_files(
    auth: AuthUser,
    Path(job_id): Path<DbId>,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<toonhub_db::models::job::SupplementalFile>>>> {
    let job = load_job(&state.pool, job_id).await?;
    authorize_participant(&state.pool, &job, auth.user_id).await?;

    let files = JobRepo::list_supplemental_files(&state.pool, job_id).await?;
    Ok(Json(DataResponse { data: files }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use toonhub_core::storage::{BlobStore, MemoryBlobStore};

    #[tokio::test]
    async fn missing_blob_does_not_block_cleanup() {
        let store = MemoryBlobStore::new();
        store.put("job_files/a", vec![1], None).await.unwrap();
        store.put("job_files/b", vec![2], None).await.unwrap();
        store.simulate_missing("job_files/a");

        // The sabotaged key is absorbed; the healthy one is removed.
        delete_blob_best_effort(&store, "job_files/a", 1).await;
        delete_blob_best_effort(&store, "job_files/b", 1).await;

        assert!(!store.contains("job_files/b"));
    }

    #[test]
    fn missing_required_field_is_a_bad_request() {
        let fields = HashMap::new();
        assert!(matches!(
            required_field(&fields, "comic_id"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn unparseable_field_is_a_bad_request() {
        let mut fields = HashMap::new();
        fields.insert("rate".to_string(), "not-a-number".to_string());
        assert!(matches!(
            parse_field::<f64>(&fields, "rate"),
            Err(AppError::BadRequest(_))
        ));
    }
}
