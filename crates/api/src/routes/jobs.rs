//! Route definitions for the `/jobs` resource.
//!
//! All endpoints require authentication; the lifecycle transitions are
//! additionally role- and ownership-gated inside the handlers.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET  /all                          -> list_jobs (employer)
/// GET  /my-jobs                      -> my_jobs (employee)
/// POST /                             -> create_job (employer)
/// GET  /{id}                         -> get_job (participant)
/// PUT  /{id}/complete                -> complete_job (assigned employee)
/// PUT  /{id}/request-revision        -> request_revision (employer)
/// POST /{id}/approve-archive         -> approve_and_archive (employer)
/// POST /{id}/add-file                -> add_supplemental_file (employer)
/// GET  /{id}/supplemental-files      -> list_supplemental_files (participant)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all", get(jobs::list_jobs))
        .route("/my-jobs", get(jobs::my_jobs))
        .route("/", post(jobs::create_job))
        .route("/{job_id}", get(jobs::get_job))
        .route("/{job_id}/complete", put(jobs::complete_job))
        .route("/{job_id}/request-revision", put(jobs::request_revision))
        .route("/{job_id}/approve-archive", post(jobs::approve_and_archive))
        .route("/{job_id}/add-file", post(jobs::add_supplemental_file))
        .route(
            "/{job_id}/supplemental-files",
            get(jobs::list_supplemental_files),
        )
}
