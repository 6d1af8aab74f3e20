//! Configuration structures
//!
//! Everything here is plain serde data. Files use milliseconds for every
//! interval (`period_ms`, `timeout_ms`, `start_delay_ms`, `duration_ms`).
//!
//! ```toml
//! error_capacity = 100
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [[jobs]]
//! id = "heartbeat"
//! schedule = { period_ms = 1000 }
//! work = { kind = "heartbeat" }
//! ```

use std::collections::HashSet;
use std::time::Duration;

use cadence_common::duration_millis;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_JOB_ERROR_CAPACITY, DEFAULT_LOG_LEVEL, DEFAULT_REGISTRY_ERROR_CAPACITY,
};
use crate::errors::{CadenceError, Result};
use crate::impl_domain_enum_conversions;

/// Fixed-interval schedule of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Interval between two invocations.
    #[serde(rename = "period_ms", with = "duration_millis")]
    pub period: Duration,
    /// Bound on a single invocation; zero means unbounded.
    #[serde(rename = "timeout_ms", with = "duration_millis", default)]
    pub timeout: Duration,
    /// Wait before the first invocation.
    #[serde(rename = "start_delay_ms", with = "duration_millis", default)]
    pub start_delay: Duration,
}

impl Schedule {
    /// Schedule firing every `period`, without timeout or start delay.
    pub fn every(period: Duration) -> Self {
        Self { period, timeout: Duration::ZERO, start_delay: Duration::ZERO }
    }

    /// Bound every invocation by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay the first invocation by `delay`.
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Returns the per-invocation bound, `None` when the timeout is zero.
    pub fn call_timeout(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }

    /// Validate the schedule.
    ///
    /// # Errors
    /// Returns `CadenceError::InvalidInput` if the period is zero.
    pub fn validate(&self) -> Result<()> {
        if self.period.is_zero() {
            return Err(CadenceError::InvalidInput("period must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Built-in units of work the runner knows how to construct from config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkKind {
    /// Log a line and succeed.
    Heartbeat,
    /// Always fail with `message`.
    Fail {
        /// Error text reported on every invocation.
        message: String,
    },
    /// Wait for `duration`, giving up early when cancelled.
    Sleep {
        /// How long a single invocation takes.
        #[serde(rename = "duration_ms", with = "duration_millis")]
        duration: Duration,
    },
}

/// One job definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Unique job identifier.
    pub id: String,
    /// Timing parameters.
    pub schedule: Schedule,
    /// What the job does on every tick.
    pub work: WorkKind,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, one line per event.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl_domain_enum_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: LogFormat::default() }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Top-level scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Bound of the registry's merged error queue.
    #[serde(default = "default_registry_capacity")]
    pub error_capacity: usize,
    /// Bound of each job's own error queue.
    #[serde(default = "default_job_capacity")]
    pub job_error_capacity: usize,
    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Jobs registered at startup.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            error_capacity: DEFAULT_REGISTRY_ERROR_CAPACITY,
            job_error_capacity: DEFAULT_JOB_ERROR_CAPACITY,
            logging: LoggingConfig::default(),
            jobs: Vec::new(),
        }
    }
}

fn default_registry_capacity() -> usize {
    DEFAULT_REGISTRY_ERROR_CAPACITY
}

fn default_job_capacity() -> usize {
    DEFAULT_JOB_ERROR_CAPACITY
}

impl SchedulerConfig {
    /// Validate capacities, job ids and schedules.
    ///
    /// # Errors
    /// Returns `CadenceError::InvalidInput` naming the first offending value.
    pub fn validate(&self) -> Result<()> {
        if self.error_capacity == 0 {
            return Err(CadenceError::InvalidInput("error_capacity must be positive".into()));
        }
        if self.job_error_capacity == 0 {
            return Err(CadenceError::InvalidInput("job_error_capacity must be positive".into()));
        }

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if job.id.trim().is_empty() {
                return Err(CadenceError::InvalidInput("job id must not be empty".into()));
            }
            if !seen.insert(job.id.as_str()) {
                return Err(CadenceError::InvalidInput(format!("duplicate job id: {}", job.id)));
            }
            job.schedule.validate().map_err(|e| match e {
                CadenceError::InvalidInput(reason) => {
                    CadenceError::InvalidInput(format!("job {}: {}", job.id, reason))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}
