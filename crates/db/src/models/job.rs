//! Job entity models and read DTOs.

use serde::Serialize;
use sqlx::FromRow;
use toonhub_core::types::{DbId, Timestamp};

/// A row from the `jobs` table.
///
/// `status` is the stored string form of `toonhub_core::jobs::JobStatus`;
/// the file columns hold blob-store keys and are nulled on archive.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub comic_id: DbId,
    pub employee_id: DbId,
    pub episode_number: i32,
    pub task_type: String,
    pub rate: f64,
    pub status: String,
    pub is_revision: bool,
    pub assigned_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub employer_work_file: Option<String>,
    pub employee_finished_file: Option<String>,
    pub supplemental_file: Option<String>,
    pub supplemental_file_comment: Option<String>,
    pub payroll_id: Option<DbId>,
}

/// Job row joined with employee and comic display fields, for list views.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobWithContext {
    pub id: DbId,
    pub comic_id: DbId,
    pub employee_id: DbId,
    pub episode_number: i32,
    pub task_type: String,
    pub rate: f64,
    pub status: String,
    pub is_revision: bool,
    pub assigned_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub employer_work_file: Option<String>,
    pub employee_finished_file: Option<String>,
    pub supplemental_file: Option<String>,
    pub supplemental_file_comment: Option<String>,
    pub payroll_id: Option<DbId>,
    pub employee_name: String,
    pub comic_title: String,
}

/// A row from the `job_supplemental_files` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SupplementalFile {
    pub id: DbId,
    pub job_id: DbId,
    pub blob_key: String,
    pub comment: Option<String>,
    pub uploaded_at: Timestamp,
}

/// Fields for inserting a new job. The file keys are already stored in the
/// blob store by the time this is built.
#[derive(Debug)]
pub struct NewJob {
    pub comic_id: DbId,
    pub employee_id: DbId,
    pub episode_number: i32,
    pub task_type: String,
    pub rate: f64,
    pub employer_work_file: String,
    pub supplemental_file: Option<String>,
    pub supplemental_file_comment: Option<String>,
}
