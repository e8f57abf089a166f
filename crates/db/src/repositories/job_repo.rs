//! Repository for the `jobs` and `job_supplemental_files` tables.
//!
//! Status strings written here always come from
//! `toonhub_core::jobs::JobStatus::as_str`; the handlers validate the
//! transition before calling any of the update methods.

use sqlx::PgPool;
use toonhub_core::types::DbId;

use crate::models::job::{Job, JobWithContext, NewJob, SupplementalFile};

const COLUMNS: &str = "id, comic_id, employee_id, episode_number, task_type, rate, status, \
                       is_revision, assigned_at, completed_at, employer_work_file, \
                       employee_finished_file, supplemental_file, supplemental_file_comment, \
                       payroll_id";

/// Prefixed column list for joined queries.
const J_COLUMNS: &str = "j.id, j.comic_id, j.employee_id, j.episode_number, j.task_type, j.rate, \
                         j.status, j.is_revision, j.assigned_at, j.completed_at, \
                         j.employer_work_file, j.employee_finished_file, j.supplemental_file, \
                         j.supplemental_file_comment, j.payroll_id";

pub struct JobRepo;

impl JobRepo {
    /// Insert a new job in `ASSIGNED` status, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewJob) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (comic_id, employee_id, episode_number, task_type, rate, \
                               employer_work_file, supplemental_file, supplemental_file_comment)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(input.comic_id)
            .bind(input.employee_id)
            .bind(input.episode_number)
            .bind(&input.task_type)
            .bind(input.rate)
            .bind(&input.employer_work_file)
            .bind(&input.supplemental_file)
            .bind(&input.supplemental_file_comment)
            .fetch_one(pool)
            .await
    }

    /// Find a job by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a job joined with employee and comic display fields.
    pub async fn find_with_context(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<JobWithContext>, sqlx::Error> {
        let query = format!(
            "SELECT {J_COLUMNS}, e.name AS employee_name, c.title AS comic_title
             FROM jobs j
             JOIN employees e ON e.id = j.employee_id
             JOIN comics c ON c.id = j.comic_id
             WHERE j.id = $1"
        );
        sqlx::query_as::<_, JobWithContext>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every job on comics owned by the employer, newest first.
    pub async fn list_for_employer(
        pool: &PgPool,
        employer_id: DbId,
    ) -> Result<Vec<JobWithContext>, sqlx::Error> {
        let query = format!(
            "SELECT {J_COLUMNS}, e.name AS employee_name, c.title AS comic_title
             FROM jobs j
             JOIN employees e ON e.id = j.employee_id
             JOIN comics c ON c.id = j.comic_id
             WHERE c.employer_id = $1
             ORDER BY j.assigned_at DESC"
        );
        sqlx::query_as::<_, JobWithContext>(&query)
            .bind(employer_id)
            .fetch_all(pool)
            .await
    }

    /// List the jobs assigned to one employee profile, newest first.
    pub async fn list_for_employee(
        pool: &PgPool,
        employee_id: DbId,
    ) -> Result<Vec<JobWithContext>, sqlx::Error> {
        let query = format!(
            "SELECT {J_COLUMNS}, e.name AS employee_name, c.title AS comic_title
             FROM jobs j
             JOIN employees e ON e.id = j.employee_id
             JOIN comics c ON c.id = j.comic_id
             WHERE j.employee_id = $1
             ORDER BY j.assigned_at DESC"
        );
        sqlx::query_as::<_, JobWithContext>(&query)
            .bind(employee_id)
            .fetch_all(pool)
            .await
    }

    /// Record the employee's submission: `COMPLETED`, completion stamp, and
    /// the new finished-file key.
    pub async fn mark_completed(
        pool: &PgPool,
        id: DbId,
        finished_file: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs SET status = 'COMPLETED', employee_finished_file = $2, \
             completed_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(finished_file)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Send the job back to `ASSIGNED` for revision, discarding the
    /// submission reference and completion stamp.
    pub async fn mark_revision(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs SET status = 'ASSIGNED', employee_finished_file = NULL, \
             completed_at = NULL, is_revision = true WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Archive the job and null every file reference.
    pub async fn mark_archived(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs SET status = 'ARCHIVED', employer_work_file = NULL, \
             employee_finished_file = NULL, supplemental_file = NULL, \
             supplemental_file_comment = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    // --- supplemental files ---

    /// Append a later-added supplemental file record.
    pub async fn add_supplemental_file(
        pool: &PgPool,
        job_id: DbId,
        blob_key: &str,
        comment: Option<&str>,
    ) -> Result<SupplementalFile, sqlx::Error> {
        sqlx::query_as::<_, SupplementalFile>(
            "INSERT INTO job_supplemental_files (job_id, blob_key, comment)
             VALUES ($1, $2, $3)
             RETURNING id, job_id, blob_key, comment, uploaded_at",
        )
        .bind(job_id)
        .bind(blob_key)
        .bind(comment)
        .fetch_one(pool)
        .await
    }

    /// List a job's later-added supplemental files, newest first.
    pub async fn list_supplemental_files(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Vec<SupplementalFile>, sqlx::Error> {
        sqlx::query_as::<_, SupplementalFile>(
            "SELECT id, job_id, blob_key, comment, uploaded_at
             FROM job_supplemental_files WHERE job_id = $1
             ORDER BY uploaded_at DESC",
        )
        .bind(job_id)
        .fetch_all(pool)
        .await
    }

    /// Blob keys of the job's later-added supplemental files.
    pub async fn supplemental_blob_keys(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT blob_key FROM job_supplemental_files WHERE job_id = $1")
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    /// Delete all supplemental-file records for a job (archive cleanup).
    pub async fn delete_supplemental_files(pool: &PgPool, job_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM job_supplemental_files WHERE job_id = $1")
            .bind(job_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
