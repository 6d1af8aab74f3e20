//! Modular common utilities shared across Cadence crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error classification and serde helpers
//! - `runtime`: async test utilities built on tokio

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

// Always available
// -----------------------------------------------------------------
pub mod error;

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod utils;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use error::{ErrorClassification, ErrorSeverity};
#[cfg(feature = "foundation")]
pub use utils::serde::duration_millis;
