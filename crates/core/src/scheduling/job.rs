//! Job lifecycle state machine.
//!
//! A [`Job`] owns one fixed-interval schedule and one unit of [`Work`]. Each
//! [`start`](Job::start) spawns a single execution task which waits out the
//! start delay, invokes the work immediately, then once per period until the
//! job is stopped or cancelled.
//!
//! - **Stop** is cooperative: an in-flight invocation runs to completion and
//!   no further tick begins.
//! - **Cancel** fires the execution token: the in-flight invocation observes
//!   [`WorkContext::cancelled`] and the task exits as soon as it sees it.
//!
//! Failed invocations are tagged with the job id and pushed onto the job's
//! bounded error queue, read through [`Job::take_errors`].
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use cadence_core::scheduling::{Job, WorkContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let job = Job::builder("id0", |_ctx: WorkContext| async { Ok(()) })
//!     .period(Duration::from_millis(500))
//!     .timeout(Duration::from_millis(550))
//!     .build()?;
//!
//! job.start(None);
//! // ... application runs ...
//! job.stop();
//! job.wait_stopped().await;
//! job.close_errors()?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cadence_domain::constants::DEFAULT_JOB_ERROR_CAPACITY;
use cadence_domain::Schedule;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch, Notify};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::{SchedulerError, SchedulerResult};
use super::failure::{FailureCause, JobFailure};
use super::status::JobStatus;
use super::stream::ErrorStream;
use super::work::{Work, WorkContext};

/// Handle to one periodically scheduled unit of work.
///
/// Cloning is cheap; every clone addresses the same job.
#[derive(Clone)]
pub struct Job {
    inner: Arc<JobInner>,
}

struct JobInner {
    id: String,
    schedule: Schedule,
    work: Box<dyn Work>,
    parent: Option<CancellationToken>,
    /// Single-slot stop request; a stored permit survives until observed.
    stop: Notify,
    state: Mutex<JobState>,
    /// Mirrors `JobState::running` so callers can wait for the task to exit.
    running_tx: watch::Sender<bool>,
    errors_rx: Mutex<Option<mpsc::Receiver<JobFailure>>>,
    invocations: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
}

#[derive(Default)]
struct JobState {
    started: bool,
    running: bool,
    executing: bool,
    exec: Option<CancellationToken>,
    /// `None` once the job is retired.
    errors_tx: Option<mpsc::Sender<JobFailure>>,
}

/// Builder for [`Job`].
pub struct JobBuilder {
    id: String,
    work: Box<dyn Work>,
    schedule: Schedule,
    parent: Option<CancellationToken>,
    error_capacity: usize,
}

impl JobBuilder {
    /// Interval between invocations. Required.
    pub fn period(mut self, period: Duration) -> Self {
        self.schedule.period = period;
        self
    }

    /// Per-invocation bound; zero disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.schedule.timeout = timeout;
        self
    }

    /// Wait before the first invocation.
    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.schedule.start_delay = delay;
        self
    }

    /// Replace all timing parameters at once.
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Token the execution scope derives from when `start` gets none.
    pub fn parent(mut self, token: CancellationToken) -> Self {
        self.parent = Some(token);
        self
    }

    /// Bound of the job's error queue.
    pub fn error_capacity(mut self, capacity: usize) -> Self {
        self.error_capacity = capacity;
        self
    }

    /// Validate parameters and create the job.
    ///
    /// # Errors
    /// Returns [`SchedulerError::InvalidJob`] for an empty id, a zero period
    /// or a zero error capacity.
    pub fn build(self) -> SchedulerResult<Job> {
        if self.id.trim().is_empty() {
            return Err(SchedulerError::invalid(&self.id, "id must not be empty"));
        }
        self.schedule
            .validate()
            .map_err(|_| SchedulerError::invalid(&self.id, "period must be greater than zero"))?;
        if self.error_capacity == 0 {
            return Err(SchedulerError::invalid(&self.id, "error capacity must be positive"));
        }

        let (errors_tx, errors_rx) = mpsc::channel(self.error_capacity);
        let (running_tx, _) = watch::channel(false);

        Ok(Job {
            inner: Arc::new(JobInner {
                id: self.id,
                schedule: self.schedule,
                work: self.work,
                parent: self.parent,
                stop: Notify::new(),
                state: Mutex::new(JobState { errors_tx: Some(errors_tx), ..Default::default() }),
                running_tx,
                errors_rx: Mutex::new(Some(errors_rx)),
                invocations: AtomicU64::new(0),
                failures: AtomicU64::new(0),
                timeouts: AtomicU64::new(0),
            }),
        })
    }
}

impl Job {
    /// Start building a job. The period must be set before [`JobBuilder::build`].
    pub fn builder(id: impl Into<String>, work: impl Work) -> JobBuilder {
        JobBuilder {
            id: id.into(),
            work: Box::new(work),
            schedule: Schedule::every(Duration::ZERO),
            parent: None,
            error_capacity: DEFAULT_JOB_ERROR_CAPACITY,
        }
    }

    /// Create a job with the default error capacity and no parent token.
    ///
    /// # Errors
    /// See [`JobBuilder::build`].
    pub fn new(
        id: impl Into<String>,
        schedule: Schedule,
        work: impl Work,
    ) -> SchedulerResult<Self> {
        Self::builder(id, work).schedule(schedule).build()
    }

    /// Job id.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Timing parameters.
    pub fn schedule(&self) -> Schedule {
        self.inner.schedule
    }

    /// Launch the execution task.
    ///
    /// No-op while the job is started or its previous task is still alive.
    /// The execution scope is a child of `base`, else of the builder's parent
    /// token, else a fresh root. A retired job refuses to start.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, base: Option<&CancellationToken>) {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.started || state.running {
            debug!(job_id = %inner.id, "job already active, start ignored");
            return;
        }
        let Some(errors) = state.errors_tx.clone() else {
            error!(job_id = %inner.id, "start called on a retired job");
            return;
        };

        // A stop posted after the previous task stopped listening must not
        // halt this run.
        let _ = inner.stop.notified().now_or_never();

        let exec = match base.or(inner.parent.as_ref()) {
            Some(base) => base.child_token(),
            None => CancellationToken::new(),
        };
        state.started = true;
        state.running = true;
        state.exec = Some(exec.clone());
        inner.running_tx.send_replace(true);

        let task_inner = Arc::clone(inner);
        tokio::spawn(async move {
            let _guard = RunGuard { inner: Arc::clone(&task_inner) };
            let exit = run(&task_inner, exec, errors).await;
            debug!(job_id = %task_inner.id, ?exit, "job task exiting");
        });

        info!(
            job_id = %inner.id,
            period_ms = millis(inner.schedule.period),
            timeout_ms = millis(inner.schedule.timeout),
            "job started"
        );
    }

    /// Ask the job to halt after the in-flight invocation, if any.
    ///
    /// No-op unless started.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        if !state.started {
            return;
        }
        state.started = false;
        self.inner.stop.notify_one();
        info!(job_id = %self.inner.id, "job stop requested");
    }

    /// Cancel the execution scope, aborting the in-flight invocation.
    ///
    /// No-op unless started.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        if !state.started {
            return;
        }
        state.started = false;
        if let Some(exec) = &state.exec {
            exec.cancel();
        }
        info!(job_id = %self.inner.id, "job cancelled");
    }

    /// Wait until the execution task has fully exited.
    ///
    /// Returns immediately if the job is not running.
    pub async fn wait_stopped(&self) {
        let mut running = self.inner.running_tx.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = running.wait_for(|running| !*running).await;
    }

    /// True between a successful start and the next stop or cancel.
    pub fn is_started(&self) -> bool {
        self.inner.state.lock().started
    }

    /// True while the execution task is alive.
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// True while the work is being invoked.
    pub fn is_executing(&self) -> bool {
        self.inner.state.lock().executing
    }

    /// True once [`close_errors`](Self::close_errors) succeeded.
    pub fn is_retired(&self) -> bool {
        self.inner.state.lock().errors_tx.is_none()
    }

    /// Take the consumer side of the job's error queue.
    ///
    /// Returns `None` if it was already taken.
    pub fn take_errors(&self) -> Option<ErrorStream> {
        self.inner.errors_rx.lock().take().map(ErrorStream::new)
    }

    /// Hand a stream obtained from [`take_errors`](Self::take_errors) back.
    pub(crate) fn restore_errors(&self, stream: ErrorStream) {
        let mut slot = self.inner.errors_rx.lock();
        if slot.is_none() {
            *slot = Some(stream.into_inner());
        }
    }

    /// Retire the job, closing its error queue.
    ///
    /// The stream ends once buffered failures are read. Idempotent.
    ///
    /// # Errors
    /// Returns [`SchedulerError::JobActive`] while the job is started or
    /// running.
    pub fn close_errors(&self) -> SchedulerResult<()> {
        let mut state = self.inner.state.lock();
        if state.started || state.running {
            return Err(SchedulerError::JobActive(self.inner.id.clone()));
        }
        if state.errors_tx.take().is_some() {
            debug!(job_id = %self.inner.id, "job retired");
        }
        Ok(())
    }

    /// Snapshot of flags and counters.
    pub fn status(&self) -> JobStatus {
        let inner = &self.inner;
        let state = inner.state.lock();
        JobStatus {
            id: inner.id.clone(),
            started: state.started,
            running: state.running,
            executing: state.executing,
            invocations: inner.invocations.load(Ordering::Relaxed),
            failures: inner.failures.load(Ordering::Relaxed),
            timeouts: inner.timeouts.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.inner.id)
            .field("schedule", &self.inner.schedule)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Stopped,
    Cancelled,
}

/// Clears the lifecycle flags when the execution task ends, however it ends.
struct RunGuard {
    inner: Arc<JobInner>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        state.started = false;
        state.running = false;
        state.executing = false;
        state.exec = None;
        self.inner.running_tx.send_replace(false);
    }
}

/// Whole milliseconds for log fields, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn run(inner: &JobInner, exec: CancellationToken, errors: mpsc::Sender<JobFailure>) -> Exit {
    let period = inner.schedule.period;

    tokio::select! {
        biased;
        _ = exec.cancelled() => return Exit::Cancelled,
        _ = inner.stop.notified() => return Exit::Stopped,
        _ = tokio::time::sleep(inner.schedule.start_delay) => {}
    }

    // Ticks stay on a grid anchored at the first invocation's start.
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    invoke(inner, &exec, &errors).await;

    loop {
        tokio::select! {
            biased;
            _ = exec.cancelled() => return Exit::Cancelled,
            _ = inner.stop.notified() => return Exit::Stopped,
            _ = ticker.tick() => invoke(inner, &exec, &errors).await,
        }
    }
}

async fn invoke(inner: &JobInner, exec: &CancellationToken, errors: &mpsc::Sender<JobFailure>) {
    inner.state.lock().executing = true;
    inner.invocations.fetch_add(1, Ordering::Relaxed);

    let call = exec.child_token();
    let outcome = match inner.schedule.call_timeout() {
        Some(limit) => {
            let deadline = Instant::now() + limit;
            let ctx = WorkContext::new(&inner.id, call.clone(), Some(deadline));
            match tokio::time::timeout_at(deadline, inner.work.run(ctx)).await {
                Ok(result) => result.map_err(FailureCause::Work),
                Err(_) => Err(FailureCause::TimedOut(limit)),
            }
        }
        None => {
            let ctx = WorkContext::new(&inner.id, call.clone(), None);
            inner.work.run(ctx).await.map_err(FailureCause::Work)
        }
    };
    call.cancel();

    inner.state.lock().executing = false;

    let Err(cause) = outcome else {
        return;
    };
    match &cause {
        FailureCause::TimedOut(limit) => {
            inner.timeouts.fetch_add(1, Ordering::Relaxed);
            warn!(
                job_id = %inner.id,
                timeout_ms = millis(*limit),
                "job invocation timed out"
            );
        }
        FailureCause::Work(err) => {
            inner.failures.fetch_add(1, Ordering::Relaxed);
            warn!(job_id = %inner.id, error = %err, "job invocation failed");
        }
    }
    if errors.send(JobFailure::new(inner.id.as_str(), cause)).await.is_err() {
        debug!(job_id = %inner.id, "error stream dropped by its consumer");
    }
}
