//! Observability setup
//!
//! Cadence logs through `tracing`. This module installs the global
//! subscriber; the library crates only emit events.

pub mod logging;

pub use logging::{build_filter, init};
