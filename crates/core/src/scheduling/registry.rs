//! Registry of jobs with a merged error stream.
//!
//! The registry keeps its jobs in insertion order, keyed by unique id, and
//! runs one relay task per job forwarding that job's failures into a single
//! merged stream. Failures from one job keep their order; failures from
//! different jobs interleave in arrival order.
//!
//! Teardown order is cancel or stop, wait, remove, [`Registry::wait_drained`],
//! then [`Registry::close_errors`]; [`Registry::shutdown`] performs all of
//! it. Relays hold their own handle on the merged outlet, so closing it early
//! only ends the stream later and never loses a failure.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use cadence_domain::constants::DEFAULT_REGISTRY_ERROR_CAPACITY;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use cadence_common::ErrorClassification;
use tracing::{debug, error, info, instrument, warn, Level};

use super::error::{SchedulerError, SchedulerResult};
use super::failure::JobFailure;
use super::job::Job;
use super::status::JobStatus;
use super::stream::ErrorStream;

/// Registry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Bound of the merged error queue. Zero is treated as one.
    pub error_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { error_capacity: DEFAULT_REGISTRY_ERROR_CAPACITY }
    }
}

/// Owns a set of jobs and fans their failures into one stream.
pub struct Registry {
    jobs: Mutex<Vec<Job>>,
    merged_tx: Mutex<Option<mpsc::Sender<JobFailure>>>,
    merged_rx: Mutex<Option<mpsc::Receiver<JobFailure>>>,
    /// Number of relay tasks still forwarding.
    relays: Arc<watch::Sender<usize>>,
}

impl Registry {
    /// Create a registry with the default configuration.
    ///
    /// # Errors
    /// See [`Registry::with_config`].
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn new(jobs: Vec<Job>) -> SchedulerResult<Self> {
        Self::with_config(jobs, RegistryConfig::default())
    }

    /// Create a registry owning `jobs` and start relaying their failures.
    ///
    /// # Errors
    /// - [`SchedulerError::DuplicateId`] if two jobs share an id
    /// - [`SchedulerError::ErrorStreamTaken`] if a job's stream already has a
    ///   consumer
    ///
    /// On error no job is modified.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn with_config(jobs: Vec<Job>, config: RegistryConfig) -> SchedulerResult<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = jobs.iter().find(|job| !seen.insert(job.id())) {
            return Err(SchedulerError::DuplicateId(dup.id().to_string()));
        }

        let mut streams = Vec::with_capacity(jobs.len());
        for job in &jobs {
            match job.take_errors() {
                Some(stream) => streams.push(stream),
                None => {
                    for (taken, stream) in jobs.iter().zip(streams) {
                        taken.restore_errors(stream);
                    }
                    return Err(SchedulerError::ErrorStreamTaken(job.id().to_string()));
                }
            }
        }

        let (merged_tx, merged_rx) = mpsc::channel(config.error_capacity.max(1));
        let (relays, _) = watch::channel(0);
        let registry = Self {
            jobs: Mutex::new(Vec::with_capacity(jobs.len())),
            merged_tx: Mutex::new(Some(merged_tx.clone())),
            merged_rx: Mutex::new(Some(merged_rx)),
            relays: Arc::new(relays),
        };

        for (job, stream) in jobs.iter().zip(streams) {
            registry.spawn_relay(job.id(), stream, merged_tx.clone());
        }
        *registry.jobs.lock() = jobs;

        debug!(jobs = registry.len(), "registry created");
        Ok(registry)
    }

    /// Start every registered job with its own default scope.
    #[instrument(skip(self))]
    pub fn start(&self) {
        let jobs = self.jobs.lock();
        for job in jobs.iter() {
            job.start(None);
        }
        info!(jobs = jobs.len(), "registry started");
    }

    /// Register a job without starting it.
    ///
    /// # Errors
    /// - [`SchedulerError::DuplicateId`] if the id is taken
    /// - [`SchedulerError::Closed`] after [`close_errors`](Self::close_errors)
    /// - [`SchedulerError::ErrorStreamTaken`] if the job's stream already has
    ///   a consumer
    #[instrument(skip(self, job), fields(job_id = %job.id()))]
    pub fn add_job(&self, job: Job) -> SchedulerResult<()> {
        let mut jobs = self.jobs.lock();
        if jobs.iter().any(|existing| existing.id() == job.id()) {
            return Err(SchedulerError::DuplicateId(job.id().to_string()));
        }
        let sink = self.merged_tx.lock().clone().ok_or(SchedulerError::Closed)?;
        let stream = job
            .take_errors()
            .ok_or_else(|| SchedulerError::ErrorStreamTaken(job.id().to_string()))?;

        self.spawn_relay(job.id(), stream, sink);
        jobs.push(job);
        Ok(())
    }

    /// Start one job.
    ///
    /// # Errors
    /// Returns [`SchedulerError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn start_job(&self, id: &str) -> SchedulerResult<()> {
        self.with_job(id, |job| job.start(None))
    }

    /// Stop one job gracefully.
    ///
    /// # Errors
    /// Returns [`SchedulerError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn stop_job(&self, id: &str) -> SchedulerResult<()> {
        self.with_job(id, Job::stop)
    }

    /// Cancel one job.
    ///
    /// # Errors
    /// Returns [`SchedulerError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn cancel_job(&self, id: &str) -> SchedulerResult<()> {
        self.with_job(id, Job::cancel)
    }

    /// Wait until one job's execution task has exited.
    ///
    /// # Errors
    /// Returns [`SchedulerError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub async fn wait_job(&self, id: &str) -> SchedulerResult<()> {
        let job = self.with_job(id, Job::clone)?;
        job.wait_stopped().await;
        Ok(())
    }

    /// Retire a halted job and drop it from the registry.
    ///
    /// # Errors
    /// - [`SchedulerError::NotFound`] for an unknown id
    /// - [`SchedulerError::JobActive`] while the job is started or running;
    ///   the registry is left unchanged
    #[instrument(skip(self))]
    pub fn remove_job(&self, id: &str) -> SchedulerResult<()> {
        let mut jobs = self.jobs.lock();
        let index = jobs
            .iter()
            .position(|job| job.id() == id)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))?;

        jobs[index].close_errors()?;
        jobs.remove(index);
        info!("job removed");
        Ok(())
    }

    /// Take the consumer side of the merged error stream.
    ///
    /// Returns `None` if it was already taken.
    pub fn take_errors(&self) -> Option<ErrorStream> {
        self.merged_rx.lock().take().map(ErrorStream::new)
    }

    /// Wait until every relay has seen its job's stream close.
    ///
    /// Relays only finish once their job is removed, so this waits for every
    /// registered job to be removed.
    pub async fn wait_drained(&self) {
        let mut outstanding = self.relays.subscribe();
        // The sender is owned by `self`.
        let _ = outstanding.wait_for(|count| *count == 0).await;
    }

    /// Close the merged outlet. Idempotent.
    ///
    /// The merged stream ends once every relay has finished. Later
    /// [`add_job`](Self::add_job) calls fail with [`SchedulerError::Closed`].
    #[instrument(skip(self))]
    pub fn close_errors(&self) {
        if self.merged_tx.lock().take().is_some() {
            info!("registry error outlet closed");
        }
    }

    /// Ids of all registered jobs, in insertion order.
    pub fn job_ids(&self) -> Vec<String> {
        self.jobs.lock().iter().map(|job| job.id().to_string()).collect()
    }

    /// Handle to a registered job.
    pub fn job(&self, id: &str) -> Option<Job> {
        self.with_job(id, Job::clone).ok()
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// True when no job is registered.
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Snapshot of one job.
    ///
    /// # Errors
    /// Returns [`SchedulerError::NotFound`] for an unknown id.
    pub fn status(&self, id: &str) -> SchedulerResult<JobStatus> {
        self.with_job(id, Job::status)
    }

    /// Snapshots of all jobs, in insertion order.
    pub fn statuses(&self) -> Vec<JobStatus> {
        self.jobs.lock().iter().map(Job::status).collect()
    }

    /// Cancel, wait for, and remove every job, then drain and close the
    /// merged outlet.
    ///
    /// The merged stream must keep being consumed while this runs, otherwise
    /// relays blocked on a full queue never finish.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let jobs = self.jobs.lock().clone();
        info!(jobs = jobs.len(), "registry shutting down");

        for job in &jobs {
            job.cancel();
        }
        for job in &jobs {
            job.wait_stopped().await;
        }

        let mut all_removed = true;
        for job in &jobs {
            let mut outcome = self.remove_job(job.id());
            if matches!(&outcome, Err(err) if err.is_retryable()) {
                // Started again while shutting down: halt it once more.
                job.cancel();
                job.wait_stopped().await;
                outcome = self.remove_job(job.id());
            }
            match outcome {
                Ok(()) | Err(SchedulerError::NotFound(_)) => {}
                Err(err) => {
                    log_refusal(job.id(), &err);
                    all_removed = false;
                }
            }
        }

        if all_removed {
            self.wait_drained().await;
        }
        self.close_errors();
        info!("registry shut down");
    }

    fn with_job<T>(&self, id: &str, f: impl FnOnce(&Job) -> T) -> SchedulerResult<T> {
        let jobs = self.jobs.lock();
        jobs.iter()
            .find(|job| job.id() == id)
            .map(f)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))
    }

    fn spawn_relay(&self, id: &str, mut source: ErrorStream, sink: mpsc::Sender<JobFailure>) {
        self.relays.send_modify(|count| *count += 1);
        let guard = RelayGuard { relays: Arc::clone(&self.relays) };
        let id = id.to_string();

        tokio::spawn(async move {
            let _guard = guard;
            while let Some(failure) = source.recv().await {
                if sink.send(failure).await.is_err() {
                    debug!(job_id = %id, "merged error stream dropped by its consumer");
                    break;
                }
            }
            debug!(job_id = %id, "relay finished");
        });
    }
}

fn log_refusal(job_id: &str, err: &SchedulerError) {
    let level = err.log_level();
    if level == Level::INFO {
        info!(job_id, error = %err, "job left registered at shutdown");
    } else if level == Level::WARN {
        warn!(job_id, error = %err, "job left registered at shutdown");
    } else {
        error!(job_id, error = %err, "job left registered at shutdown");
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("jobs", &self.job_ids())
            .field("closed", &self.merged_tx.lock().is_none())
            .finish_non_exhaustive()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        let jobs = self.jobs.get_mut();
        if jobs.iter().any(Job::is_started) {
            warn!("Registry dropped with started jobs; cancelling them");
            for job in jobs.iter() {
                job.cancel();
            }
        }
    }
}

/// Decrements the outstanding relay count when a relay task ends.
struct RelayGuard {
    relays: Arc<watch::Sender<usize>>,
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        self.relays.send_modify(|count| *count = count.saturating_sub(1));
    }
}
