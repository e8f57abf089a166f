//! Job lifecycle state machine.
//!
//! A job moves `ASSIGNED -> COMPLETED -> ARCHIVED`, with a single back-edge
//! `COMPLETED -> ASSIGNED` used when the employer sends work back for
//! revision. `ARCHIVED` is terminal: archival purges every file the job
//! references, so nothing can legally happen to the job afterwards.
//!
//! The transition rules live here as pure functions; the api crate's job
//! handlers perform the side effects (blob storage, notices) around them.

use crate::error::CoreError;

/// Job status, persisted as its upper-case string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Work handed to the employee, not yet submitted (or sent back).
    Assigned,
    /// Employee submitted a finished file, awaiting employer approval.
    Completed,
    /// Approved and purged. Terminal.
    Archived,
}

impl JobStatus {
    /// The string stored in `jobs.status`.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Assigned => "ASSIGNED",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Archived => "ARCHIVED",
        }
    }

    /// Parse the stored string form. Unknown values are a validation error,
    /// never a panic: the column is written only through this module but a
    /// migration mishap should surface as a 500, not a crash.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "ASSIGNED" => Ok(JobStatus::Assigned),
            "COMPLETED" => Ok(JobStatus::Completed),
            "ARCHIVED" => Ok(JobStatus::Archived),
            other => Err(CoreError::Validation(format!(
                "Unknown job status '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `from -> to` is one of the three legal edges.
///
/// Legal edges:
/// - `ASSIGNED -> COMPLETED` (employee submits)
/// - `COMPLETED -> ASSIGNED` (employer requests revision)
/// - `COMPLETED -> ARCHIVED` (employer approves)
///
/// Everything else, including `ASSIGNED -> ARCHIVED` and any edge out of
/// `ARCHIVED`, is rejected with [`CoreError::InvalidTransition`].
pub fn validate_transition(from: JobStatus, to: JobStatus) -> Result<(), CoreError> {
    use JobStatus::*;
    match (from, to) {
        (Assigned, Completed) | (Completed, Assigned) | (Completed, Archived) => Ok(()),
        _ => Err(CoreError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_round_trips_through_string_form() {
        for status in [JobStatus::Assigned, JobStatus::Completed, JobStatus::Archived] {
            assert_eq!(JobStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        assert_matches!(JobStatus::parse("PENDING"), Err(CoreError::Validation(_)));
        assert_matches!(JobStatus::parse(""), Err(CoreError::Validation(_)));
        // Stored form is upper-case only.
        assert_matches!(JobStatus::parse("assigned"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn legal_edges_pass() {
        assert!(validate_transition(JobStatus::Assigned, JobStatus::Completed).is_ok());
        assert!(validate_transition(JobStatus::Completed, JobStatus::Assigned).is_ok());
        assert!(validate_transition(JobStatus::Completed, JobStatus::Archived).is_ok());
    }

    #[test]
    fn assigned_cannot_be_archived_directly() {
        assert_matches!(
            validate_transition(JobStatus::Assigned, JobStatus::Archived),
            Err(CoreError::InvalidTransition {
                from: "ASSIGNED",
                to: "ARCHIVED"
            })
        );
    }

    #[test]
    fn archived_is_terminal() {
        for to in [JobStatus::Assigned, JobStatus::Completed, JobStatus::Archived] {
            assert_matches!(
                validate_transition(JobStatus::Archived, to),
                Err(CoreError::InvalidTransition { from: "ARCHIVED", .. })
            );
        }
    }

    #[test]
    fn self_edges_are_rejected() {
        assert!(validate_transition(JobStatus::Assigned, JobStatus::Assigned).is_err());
        assert!(validate_transition(JobStatus::Completed, JobStatus::Completed).is_err());
    }
}
