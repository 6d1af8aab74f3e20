//! The unit of work a job runs on every tick.

use std::future::Future;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::failure::BoxError;

/// Result of one invocation.
pub type WorkResult = Result<(), BoxError>;

/// Caller-supplied operation invoked once per tick.
///
/// Implementations must return promptly once [`WorkContext::cancelled`]
/// resolves. A call that keeps running past its timeout is dropped by the
/// scheduler at its next await point.
#[async_trait]
pub trait Work: Send + Sync + 'static {
    /// Run one invocation.
    async fn run(&self, ctx: WorkContext) -> WorkResult;
}

#[async_trait]
impl<F, Fut> Work for F
where
    F: Fn(WorkContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = WorkResult> + Send + 'static,
{
    async fn run(&self, ctx: WorkContext) -> WorkResult {
        (self)(ctx).await
    }
}

/// Per-invocation handle passed to [`Work::run`].
#[derive(Debug, Clone)]
pub struct WorkContext {
    job_id: String,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl WorkContext {
    pub(crate) fn new(job_id: &str, token: CancellationToken, deadline: Option<Instant>) -> Self {
        Self { job_id: job_id.to_string(), token, deadline }
    }

    /// Id of the job running this invocation.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Resolves when the job is cancelled or this invocation times out.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Non-blocking check of [`cancelled`](Self::cancelled).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The per-invocation token, for handing to nested tasks.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Instant at which this invocation times out, if bounded.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closure_implements_work() {
        let work = |ctx: WorkContext| async move {
            let result: WorkResult =
                if ctx.job_id() == "bad" { Err("refused".into()) } else { Ok(()) };
            result
        };

        let ok = WorkContext::new("good", CancellationToken::new(), None);
        assert!(work.run(ok).await.is_ok());

        let bad = WorkContext::new("bad", CancellationToken::new(), None);
        let err = work.run(bad).await.unwrap_err();
        assert_eq!(err.to_string(), "refused");
    }

    #[tokio::test]
    async fn test_context_observes_cancellation() {
        let token = CancellationToken::new();
        let ctx = WorkContext::new("job", token.child_token(), None);
        assert!(!ctx.is_cancelled());

        token.cancel();
        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
    }
}
