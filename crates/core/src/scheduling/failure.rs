//! Failures reported asynchronously on error streams

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// Boxed error returned by work implementations.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Why a single invocation failed.
#[derive(Debug)]
pub enum FailureCause {
    /// The work returned an error.
    Work(BoxError),
    /// The invocation was still in flight when its timeout expired.
    TimedOut(Duration),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Work(err) => write!(f, "{err}"),
            Self::TimedOut(limit) => write!(f, "timed out after {}ms", limit.as_millis()),
        }
    }
}

/// A failed invocation tagged with the id of the job that produced it.
#[derive(Debug)]
pub struct JobFailure {
    job_id: String,
    cause: FailureCause,
}

impl JobFailure {
    pub(crate) fn new(job_id: impl Into<String>, cause: FailureCause) -> Self {
        Self { job_id: job_id.into(), cause }
    }

    /// Id of the originating job.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Underlying cause.
    pub fn cause(&self) -> &FailureCause {
        &self.cause
    }

    /// True when the invocation was cut short by its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, FailureCause::TimedOut(_))
    }

    /// Consume the failure, returning the job id and cause.
    pub fn into_parts(self) -> (String, FailureCause) {
        (self.job_id, self.cause)
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job {}: {}", self.job_id, self.cause)
    }
}

impl StdError for JobFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.cause {
            FailureCause::Work(err) => Some(err.as_ref()),
            FailureCause::TimedOut(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_tags_job_id() {
        let failure = JobFailure::new("id0", FailureCause::Work("disk full".into()));
        assert_eq!(failure.to_string(), "job id0: disk full");
        assert!(!failure.is_timeout());

        let failure = JobFailure::new("id1", FailureCause::TimedOut(Duration::from_millis(550)));
        assert_eq!(failure.to_string(), "job id1: timed out after 550ms");
        assert!(failure.is_timeout());
    }

    #[test]
    fn test_source_is_work_error() {
        let failure = JobFailure::new("id0", FailureCause::Work("boom".into()));
        let source = failure.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("boom"));

        let failure = JobFailure::new("id0", FailureCause::TimedOut(Duration::from_secs(1)));
        assert!(failure.source().is_none());
    }
}
