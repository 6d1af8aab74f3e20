//! Scheduler error types

use std::time::Duration;

use cadence_common::{ErrorClassification, ErrorSeverity};
use cadence_domain::constants::SCHEDULER_ERROR_PREFIX;
use cadence_domain::CadenceError;
use thiserror::Error;
use tracing::Level;

/// Errors returned synchronously by job and registry administration.
///
/// Failures of the work itself never surface here; they travel on the error
/// streams as [`JobFailure`](super::JobFailure).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Another job already uses this id
    #[error("{p}: job id is not unique, id - {0}", p = SCHEDULER_ERROR_PREFIX)]
    DuplicateId(String),

    /// No job with this id is registered
    #[error("{p}: job with id {0} doesn't exist", p = SCHEDULER_ERROR_PREFIX)]
    NotFound(String),

    /// The job is still started or its execution task is still alive
    #[error("{p}: job with id {0} is started or running", p = SCHEDULER_ERROR_PREFIX)]
    JobActive(String),

    /// The job's error stream already has a consumer
    #[error("{p}: error stream of job {0} was already taken", p = SCHEDULER_ERROR_PREFIX)]
    ErrorStreamTaken(String),

    /// The registry's merged error outlet has been closed
    #[error("{p}: registry error outlet is closed", p = SCHEDULER_ERROR_PREFIX)]
    Closed,

    /// Job parameters failed validation
    #[error("{p}: invalid job {id:?}: {reason}", p = SCHEDULER_ERROR_PREFIX)]
    InvalidJob {
        /// Offending job id (may be empty)
        id: String,
        /// What was wrong
        reason: String,
    },
}

impl SchedulerError {
    pub(crate) fn invalid(id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidJob { id: id.to_string(), reason: reason.into() }
    }

    /// Level at which a refused administrative call is logged.
    pub(crate) fn log_level(&self) -> Level {
        match self.severity() {
            ErrorSeverity::Info => Level::INFO,
            ErrorSeverity::Warning => Level::WARN,
            ErrorSeverity::Error | ErrorSeverity::Critical => Level::ERROR,
        }
    }
}

impl ErrorClassification for SchedulerError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::JobActive(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound(_) => ErrorSeverity::Info,
            Self::JobActive(_) => ErrorSeverity::Warning,
            Self::DuplicateId(_)
            | Self::ErrorStreamTaken(_)
            | Self::Closed
            | Self::InvalidJob { .. } => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl From<SchedulerError> for CadenceError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::InvalidJob { .. } | SchedulerError::DuplicateId(_) => {
                CadenceError::InvalidInput(err.to_string())
            }
            _ => CadenceError::Internal(err.to_string()),
        }
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
