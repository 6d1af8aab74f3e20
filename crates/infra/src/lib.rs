//! # Cadence Infrastructure
//!
//! The impure edges of the scheduler.
//!
//! This crate contains:
//! - Configuration loading from files and environment variables
//! - Logging initialisation (`tracing-subscriber`)
//!
//! ## Architecture
//! - Produces `cadence-domain` types; knows nothing about the scheduling
//!   engine itself
//! - Everything touching the filesystem, the environment or global
//!   subscriber state lives here

pub mod config;
pub mod observability;
