//! Integration tests for AppContext lifecycle
//!
//! A context built from configuration starts its jobs, reports their
//! failures on one stream and shuts down cleanly.

use std::time::Duration;

use cadence_common::testing::poll_until;
use cadence_domain::{JobConfig, Schedule, SchedulerConfig, WorkKind};
use cadence_lib::context::AppContext;
use futures::StreamExt;

fn job(id: &str, schedule: Schedule, work: WorkKind) -> JobConfig {
    JobConfig { id: id.to_string(), schedule, work }
}

fn config_with(jobs: Vec<JobConfig>) -> SchedulerConfig {
    SchedulerConfig { jobs, ..SchedulerConfig::default() }
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_work_and_ends_the_stream() {
    let config = config_with(vec![
        job(
            "flaky",
            Schedule::every(Duration::from_millis(100)),
            WorkKind::Fail { message: "broken".into() },
        ),
        job(
            "nap",
            Schedule::every(Duration::from_secs(7_200)),
            WorkKind::Sleep { duration: Duration::from_secs(3_600) },
        ),
    ]);
    let ctx = AppContext::new_with_config(config).expect("valid configuration");
    let mut errors = ctx.take_errors().expect("stream available");
    assert!(ctx.take_errors().is_none(), "stream is single-consumer");

    ctx.start();
    let first = errors.recv().await.expect("failure reported");
    assert_eq!(first.to_string(), "job flaky: broken");
    let registry = &ctx.registry;
    let napping = poll_until(Duration::from_millis(50), Duration::from_millis(5), || async move {
        registry.status("nap").is_ok_and(|status| status.executing)
    })
    .await;
    assert!(napping, "sleep job is mid-call");

    ctx.shutdown().await;
    assert!(ctx.registry.is_empty());

    // Everything reported before shutdown is still delivered, then the stream ends
    let rest: Vec<String> = errors.map(|failure| failure.to_string()).collect().await;
    assert!(rest.contains(&"job nap: terminated by cancellation".to_string()));
    let mut flaky = rest.iter().filter(|line| line.starts_with("job flaky"));
    assert!(flaky.all(|line| line == "job flaky: broken"));
}

#[tokio::test(start_paused = true)]
async fn configured_timeout_is_reported_as_such() {
    let config = config_with(vec![job(
        "slow",
        Schedule::every(Duration::from_millis(500)).with_timeout(Duration::from_millis(100)),
        WorkKind::Sleep { duration: Duration::from_secs(1) },
    )]);
    let ctx = AppContext::new_with_config(config).unwrap();
    let mut errors = ctx.take_errors().unwrap();

    ctx.start();
    let failure = errors.recv().await.unwrap();
    assert!(failure.is_timeout());
    assert_eq!(failure.to_string(), "job slow: timed out after 100ms");

    ctx.shutdown().await;
    assert!(errors.recv().await.is_none(), "stream ends after shutdown");
}

#[tokio::test(start_paused = true)]
async fn default_heartbeat_never_fails() {
    let ctx = AppContext::new_with_config(SchedulerConfig::default()).unwrap();
    let errors = ctx.take_errors().unwrap();

    ctx.start();
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let status = ctx.registry.status("heartbeat").unwrap();
    assert_eq!(status.invocations, 4);

    ctx.shutdown().await;
    assert_eq!(errors.count().await, 0);
}
