//! # Cadence App
//!
//! Application layer: turns a loaded configuration into running jobs.
//!
//! This crate contains:
//! - Built-in work kinds selectable from configuration
//! - Application context owning the job registry
//! - The `cadence` binary entry point
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires configuration to the scheduling engine

pub mod context;
pub mod work;

// Re-export for convenience
pub use context::{build_job, default_jobs, AppContext};
pub use work::{Fail, Heartbeat, Sleep};
