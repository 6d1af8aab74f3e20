//! Error classification shared by every Cadence crate
//!
//! Crate-specific error enums stay local to their crate (`SchedulerError`,
//! `CadenceError`, ...). What they share is this classification interface,
//! so callers such as the runner binary can decide how loudly to log an error
//! or whether an administrative call is worth repeating without matching on
//! every variant of every enum.
//!
//! ## ErrorClassification Trait
//!
//! - **`is_retryable()`**: Can this operation succeed if attempted again?
//! - **`severity()`**: How serious is this error? (Info/Warning/Error/Critical)
//! - **`is_critical()`**: Does this require immediate attention?
//! - **`retry_after()`**: Suggested retry delay (if applicable)
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Unknown job id |
//! | **Warning** | Operation refused for now | Removing a job that is still running |
//! | **Error** | Caller mistake requiring a code change | Duplicate id, invalid schedule |
//! | **Critical** | Integrity at risk | Reserved |
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use cadence_common::{ErrorClassification, ErrorSeverity};
//!
//! #[derive(Debug)]
//! enum WidgetError {
//!     Missing,
//!     Busy,
//! }
//!
//! impl ErrorClassification for WidgetError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         match self {
//!             Self::Missing => ErrorSeverity::Info,
//!             Self::Busy => ErrorSeverity::Warning,
//!         }
//!     }
//!
//!     fn is_critical(&self) -> bool {
//!         false
//!     }
//!
//!     fn retry_after(&self) -> Option<Duration> {
//!         None
//!     }
//! }
//!
//! assert!(WidgetError::Busy.is_retryable());
//! assert_eq!(WidgetError::Missing.severity(), ErrorSeverity::Info);
//! ```

use std::fmt;
use std::time::Duration;

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors describe a state that can clear on its own or after
    /// another call completes, such as a job that is still shutting down.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for logging and alerting decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl ErrorSeverity {
    /// Returns true when the severity is at least `Error`
    pub fn is_actionable(self) -> bool {
        self >= Self::Error
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
