//! Application context
//!
//! Owns the loaded configuration and the job registry built from it.

use std::sync::Arc;
use std::time::Duration;

use cadence_core::{ErrorStream, Job, Registry, RegistryConfig, SchedulerResult};
use cadence_domain::constants::DEFAULT_HEARTBEAT_PERIOD_MS;
use cadence_domain::{JobConfig, Result, Schedule, SchedulerConfig, WorkKind};
use tracing::info;

use crate::work::{Fail, Heartbeat, Sleep};

/// Application context holding the registry of configured jobs
pub struct AppContext {
    /// Configuration the registry was built from
    pub config: SchedulerConfig,
    /// Registry owning every configured job
    pub registry: Arc<Registry>,
}

impl AppContext {
    /// Build jobs and the registry from `config`
    ///
    /// With no jobs configured, [`default_jobs`] are used.
    ///
    /// # Errors
    /// Returns `CadenceError::InvalidInput` if the configuration is invalid or
    /// a job cannot be built.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn new_with_config(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;

        let job_configs = if config.jobs.is_empty() { default_jobs() } else { config.jobs.clone() };
        let jobs = job_configs
            .iter()
            .map(|job| build_job(job, config.job_error_capacity))
            .collect::<SchedulerResult<Vec<_>>>()?;

        let registry = Registry::with_config(
            jobs,
            RegistryConfig { error_capacity: config.error_capacity },
        )?;

        info!(jobs = registry.len(), "application context initialised");
        Ok(Self { config, registry: Arc::new(registry) })
    }

    /// Take the merged failure stream.
    ///
    /// Returns `None` if it was already taken.
    pub fn take_errors(&self) -> Option<ErrorStream> {
        self.registry.take_errors()
    }

    /// Start every job.
    pub fn start(&self) {
        self.registry.start();
    }

    /// Cancel and remove every job, then close the merged stream.
    pub async fn shutdown(&self) {
        info!("shutdown called on AppContext");
        self.registry.shutdown().await;
    }
}

/// Build a job running the work kind named in `config`.
///
/// # Errors
/// Returns `SchedulerError::InvalidJob` if the parameters are invalid.
pub fn build_job(config: &JobConfig, error_capacity: usize) -> SchedulerResult<Job> {
    let id = config.id.as_str();
    let builder = match &config.work {
        WorkKind::Heartbeat => Job::builder(id, Heartbeat),
        WorkKind::Fail { message } => Job::builder(id, Fail::new(message.as_str())),
        WorkKind::Sleep { duration } => Job::builder(id, Sleep::new(*duration)),
    };
    builder.schedule(config.schedule).error_capacity(error_capacity).build()
}

/// Jobs run when the configuration defines none: a single heartbeat.
pub fn default_jobs() -> Vec<JobConfig> {
    vec![JobConfig {
        id: "heartbeat".to_string(),
        schedule: Schedule::every(Duration::from_millis(DEFAULT_HEARTBEAT_PERIOD_MS)),
        work: WorkKind::Heartbeat,
    }]
}

#[cfg(test)]
mod tests {
    use cadence_domain::CadenceError;

    use super::*;

    #[tokio::test]
    async fn empty_configuration_runs_the_default_heartbeat() {
        let ctx = AppContext::new_with_config(SchedulerConfig::default()).unwrap();

        assert_eq!(ctx.registry.job_ids(), vec!["heartbeat"]);
        let schedule = ctx.registry.job("heartbeat").unwrap().schedule();
        assert_eq!(schedule.period, Duration::from_millis(DEFAULT_HEARTBEAT_PERIOD_MS));
    }

    #[tokio::test]
    async fn invalid_configuration_is_rejected() {
        let mut config = SchedulerConfig::default();
        config.jobs = vec![default_jobs().remove(0), default_jobs().remove(0)];

        let err = AppContext::new_with_config(config).err().unwrap();
        assert_eq!(err, CadenceError::InvalidInput("duplicate job id: heartbeat".into()));
    }

    #[test]
    fn build_job_applies_schedule_and_capacity() {
        let config = JobConfig {
            id: "nap".into(),
            schedule: Schedule::every(Duration::from_millis(500))
                .with_timeout(Duration::from_millis(550))
                .with_start_delay(Duration::from_millis(20)),
            work: WorkKind::Sleep { duration: Duration::from_millis(100) },
        };

        let job = build_job(&config, 4).unwrap();
        assert_eq!(job.id(), "nap");
        assert_eq!(job.schedule(), config.schedule);

        let err = build_job(&config, 0).unwrap_err();
        assert!(err.to_string().contains("error capacity"));
    }
}
