//! Cadence - periodic job runner
//!
//! Loads the configuration, starts every configured job and logs each job
//! failure until interrupted.

use std::path::PathBuf;

use anyhow::Context;
use cadence_lib::AppContext;
use futures::StreamExt;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    // Optional first argument: explicit config file
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = cadence_infra::config::load(path).context("failed to load configuration")?;

    cadence_infra::observability::init(&config.logging).context("failed to initialise logging")?;
    info!(jobs = config.jobs.len(), "cadence starting");

    let ctx = AppContext::new_with_config(config).context("failed to build jobs")?;
    let errors = ctx.take_errors().context("failure stream already taken")?;

    let consumer = tokio::spawn(errors.for_each(|failure| async move {
        warn!(job_id = failure.job_id(), timed_out = failure.is_timeout(), "{}", failure.cause());
    }));

    ctx.start();
    info!(jobs = ?ctx.registry.job_ids(), "jobs started, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
    info!("interrupt received, shutting down");

    ctx.shutdown().await;
    consumer.await.context("failure consumer panicked")?;

    info!("cadence stopped");
    Ok(())
}
