//! # Cadence Core
//!
//! The scheduling engine: job lifecycle state machine and the registry that
//! aggregates job failures.
//!
//! ## Architecture Principles
//! - Depends only on `cadence-common` and `cadence-domain`
//! - No configuration files, logging setup or process wiring
//! - Work is supplied by callers through the [`Work`] trait

pub mod scheduling;

pub use scheduling::{
    BoxError, ErrorStream, FailureCause, Job, JobBuilder, JobFailure, JobStatus, Registry,
    RegistryConfig, SchedulerError, SchedulerResult, Work, WorkContext, WorkResult,
};
