//! Built-in work kinds selectable from configuration

use std::time::Duration;

use async_trait::async_trait;
use cadence_core::{Work, WorkContext, WorkResult};
use tracing::info;

/// Logs a line and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Heartbeat;

#[async_trait]
impl Work for Heartbeat {
    async fn run(&self, ctx: WorkContext) -> WorkResult {
        info!(job_id = ctx.job_id(), "heartbeat");
        Ok(())
    }
}

/// Fails every invocation with a fixed message.
#[derive(Debug, Clone)]
pub struct Fail {
    message: String,
}

impl Fail {
    /// Fail with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[async_trait]
impl Work for Fail {
    async fn run(&self, _ctx: WorkContext) -> WorkResult {
        Err(self.message.clone().into())
    }
}

/// Waits for a fixed duration, giving up when cancelled.
#[derive(Debug, Clone, Copy)]
pub struct Sleep {
    duration: Duration,
}

impl Sleep {
    /// Sleep for `duration` on every invocation.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl Work for Sleep {
    async fn run(&self, ctx: WorkContext) -> WorkResult {
        tokio::select! {
            _ = tokio::time::sleep(self.duration) => Ok(()),
            _ = ctx.cancelled() => Err("terminated by cancellation".into()),
        }
    }
}
