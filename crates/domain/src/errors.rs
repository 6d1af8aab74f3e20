//! Error types used by configuration and domain validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Cadence domain and configuration operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CadenceError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected failure inside Cadence
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Cadence domain operations
pub type Result<T> = std::result::Result<T, CadenceError>;
