use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::{ErrorKind, ValidationError, WorkerError};

use super::record::JobStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Job {id} is already {status}")]
    Terminal { id: String, status: JobStatus },

    #[error("Cannot {transition} job {id} while it is {status}")]
    Invalid {
        id: String,
        status: JobStatus,
        transition: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Job {0} not found")]
    NotFound(String),

    #[error("Job {0} already exists")]
    Duplicate(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Failed to serialize job settings: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Errors returned by the orchestrator.
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Job {0} not found")]
    NotFound(String),

    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

impl JobError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::Validation(e) => e.kind(),
            JobError::NotFound(_) | JobError::Store(StoreError::NotFound(_)) => {
                ErrorKind::JobNotFound
            }
            JobError::Store(_) | JobError::Worker(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_error_kinds() {
        assert_eq!(
            JobError::NotFound("x".into()).kind(),
            ErrorKind::JobNotFound
        );
        assert_eq!(
            JobError::Store(StoreError::NotFound("x".into())).kind(),
            ErrorKind::JobNotFound
        );
        assert_eq!(
            JobError::from(ValidationError::UnrecognizedFormat("text/plain".into())).kind(),
            ErrorKind::UnrecognizedFormat
        );
        assert_eq!(
            JobError::Worker(WorkerError::ChannelClosed).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_transition_error_message() {
        let err = TransitionError::Invalid {
            id: "j1".into(),
            status: JobStatus::Pending,
            transition: "complete",
        };
        assert_eq!(err.to_string(), "Cannot complete job j1 while it is pending");
    }
}
