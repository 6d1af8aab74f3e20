//! Scheduler constants
//!
//! Defaults owned by the scheduler components. Each value can be overridden
//! per job or per registry through configuration.

/// Bound of a single job's error queue.
pub const DEFAULT_JOB_ERROR_CAPACITY: usize = 100;

/// Bound of the registry's merged error queue.
pub const DEFAULT_REGISTRY_ERROR_CAPACITY: usize = 100;

/// Prefix carried by every administrative scheduler error message.
pub const SCHEDULER_ERROR_PREFIX: &str = "scheduler";

/// Default tracing filter when neither `RUST_LOG` nor config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Period of the heartbeat job the runner falls back to with no jobs configured.
pub const DEFAULT_HEARTBEAT_PERIOD_MS: u64 = 1_000;
