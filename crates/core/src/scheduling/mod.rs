//! Periodic job scheduling.
//!
//! - [`Job`]: one unit of [`Work`] on a fixed schedule, with its own
//!   start/stop/cancel lifecycle and error queue
//! - [`Registry`]: a set of jobs addressed by id, with one merged error stream

pub mod error;
pub mod failure;
pub mod job;
pub mod registry;
pub mod status;
pub mod stream;
pub mod work;

pub use error::{SchedulerError, SchedulerResult};
pub use failure::{BoxError, FailureCause, JobFailure};
pub use job::{Job, JobBuilder};
pub use registry::{Registry, RegistryConfig};
pub use status::JobStatus;
pub use stream::ErrorStream;
pub use work::{Work, WorkContext, WorkResult};
