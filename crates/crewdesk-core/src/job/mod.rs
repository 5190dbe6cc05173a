//! Generation job lifecycle.
//!
//! One [`JobSupervisor::run`] call owns one external process for the
//! duration of one request: it spawns the job, decodes both output streams
//! into a single record sink, interprets the exit status, and emits exactly
//! one terminal record. Dropping the sink's receiver cancels the job.

pub mod result;
pub mod supervisor;

use std::time::Duration;

pub use result::{extract_result, ExtractedResult};
pub use supervisor::JobSupervisor;

use crate::error::ServerError;

/// Failure taxonomy for one job invocation.
///
/// Malformed progress lines are not represented: the decoder drops them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    SpawnFailure(String),

    #[error("{0}")]
    RuntimeFailure(String),

    #[error("Failed to parse result")]
    ResultParse,

    #[error("Job timed out after {}", format_budget(.0))]
    Timeout(Duration),

    #[error("Client disconnected")]
    ClientDisconnect,
}

fn format_budget(budget: &Duration) -> String {
    if budget.as_secs() == 0 {
        format!("{}ms", budget.as_millis())
    } else {
        format!("{}s", budget.as_secs())
    }
}

impl From<JobError> for ServerError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::InvalidRequest(msg) => ServerError::BadRequest(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

/// Validated inputs for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub topic: String,
    pub workflow_id: String,
}

impl JobRequest {
    pub fn new(topic: Option<&str>, workflow_id: Option<&str>) -> Result<Self, JobError> {
        let topic = topic.map(str::trim).unwrap_or_default();
        let workflow_id = workflow_id.map(str::trim).unwrap_or_default();

        if topic.is_empty() || workflow_id.is_empty() {
            return Err(JobError::InvalidRequest(
                "Missing topic or workflow_id".to_string(),
            ));
        }

        Ok(Self {
            topic: topic.to_string(),
            workflow_id: workflow_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_requires_both_fields() {
        assert!(JobRequest::new(Some("rust"), Some("tech_writer")).is_ok());
        assert!(matches!(
            JobRequest::new(None, Some("tech_writer")),
            Err(JobError::InvalidRequest(_))
        ));
        assert!(matches!(
            JobRequest::new(Some("rust"), Some("  ")),
            Err(JobError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(JobError::RuntimeFailure("boom".to_string()).to_string(), "boom");
        assert_eq!(JobError::ResultParse.to_string(), "Failed to parse result");
        assert_eq!(
            JobError::Timeout(Duration::from_secs(300)).to_string(),
            "Job timed out after 300s"
        );
        assert_eq!(
            JobError::Timeout(Duration::from_millis(250)).to_string(),
            "Job timed out after 250ms"
        );
    }

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let err: ServerError = JobError::InvalidRequest("Missing topic".to_string()).into();
        assert!(matches!(err, ServerError::BadRequest(_)));
        let err: ServerError = JobError::ResultParse.into();
        assert!(matches!(err, ServerError::Internal(_)));
    }
}
