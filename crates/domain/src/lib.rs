//! # Cadence Domain
//!
//! Plain data types shared by the scheduler engine, the configuration loader
//! and the runner binary.
//!
//! This crate contains:
//! - Schedule and job configuration structures
//! - Domain error types and Result definitions
//! - Domain constants
//!
//! ## Architecture
//! - No runtime dependencies (no tokio, no tracing)
//! - Only `cadence-common` foundation helpers and serde

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
