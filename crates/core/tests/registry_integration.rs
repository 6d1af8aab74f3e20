//! Integration tests for the registry: fan-in, removal guard, teardown

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cadence_core::{BoxError, Job, Registry, SchedulerError, WorkContext};
use cadence_domain::Schedule;
use futures::StreamExt;

/// Job whose n-th invocation fails with "<id>-<n>".
fn numbered_failures(id: &str, period_ms: u64) -> Job {
    let counter = Arc::new(AtomicUsize::new(0));
    let prefix = id.to_string();
    Job::new(id, Schedule::every(Duration::from_millis(period_ms)), move |_ctx: WorkContext| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        let prefix = prefix.clone();
        async move { Err::<(), BoxError>(format!("{prefix}-{n}").into()) }
    })
    .expect("valid job")
}

fn idle(id: &str) -> Job {
    Job::new(id, Schedule::every(Duration::from_secs(60)), |_ctx: WorkContext| async { Ok(()) })
        .expect("valid job")
}

#[tokio::test(start_paused = true)]
async fn failures_fan_in_tagged_and_in_per_job_order() {
    let registry =
        Registry::new(vec![numbered_failures("a", 10), numbered_failures("b", 15)]).unwrap();
    let mut errors = registry.take_errors().unwrap();

    registry.start();
    let mut seen: HashMap<String, Vec<String>> = HashMap::new();
    for _ in 0..20 {
        let failure = errors.recv().await.expect("registry still open");
        seen.entry(failure.job_id().to_string()).or_default().push(failure.cause().to_string());
    }

    for (id, messages) in &seen {
        let expected: Vec<String> = (0..messages.len()).map(|n| format!("{id}-{n}")).collect();
        assert_eq!(messages, &expected, "failures of {id} arrive in invocation order");
    }
    assert_eq!(seen.len(), 2, "both jobs reported");

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn removal_is_refused_until_the_job_has_halted() {
    let registry = Registry::new(vec![idle("a"), idle("b")]).unwrap();
    registry.start();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let err = registry.remove_job("a").unwrap_err();
    assert_eq!(err, SchedulerError::JobActive("a".into()));
    assert_eq!(registry.job_ids(), vec!["a", "b"]);

    registry.stop_job("a").unwrap();
    // Stopped but the task may not have observed it yet
    registry.wait_job("a").await.unwrap();
    registry.remove_job("a").unwrap();
    assert_eq!(registry.job_ids(), vec!["b"]);

    // Removed ids behave like ids that never existed
    assert_eq!(registry.stop_job("a").unwrap_err(), SchedulerError::NotFound("a".into()));

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn jobs_added_later_relay_their_failures_too() {
    let registry = Registry::new(Vec::new()).unwrap();
    let mut errors = registry.take_errors().unwrap();

    registry.add_job(numbered_failures("late", 10)).unwrap();
    assert!(!registry.status("late").unwrap().started, "add does not start");

    registry.start_job("late").unwrap();
    let failure = errors.recv().await.unwrap();
    assert_eq!(failure.to_string(), "job late: late-0");

    registry.cancel_job("late").unwrap();
    registry.wait_job("late").await.unwrap();
    let status = registry.status("late").unwrap();
    assert!(status.is_idle());
    assert!(status.failures >= 1);

    registry.shutdown().await;
}

/// Stop, wait, remove, drain, close: the merged stream then ends after
/// delivering everything that was reported.
#[tokio::test(start_paused = true)]
async fn manual_teardown_delivers_every_failure_then_ends() {
    let registry = Registry::new(vec![numbered_failures("id0", 100)]).unwrap();
    let errors = registry.take_errors().unwrap();
    let consumer = tokio::spawn(errors.map(|failure| failure.to_string()).collect::<Vec<_>>());

    registry.start();
    tokio::time::sleep(Duration::from_millis(250)).await;

    registry.stop_job("id0").unwrap();
    registry.wait_job("id0").await.unwrap();
    registry.remove_job("id0").unwrap();
    registry.wait_drained().await;
    registry.close_errors();

    let delivered = consumer.await.unwrap();
    assert_eq!(delivered, vec!["job id0: id0-0", "job id0: id0-1", "job id0: id0-2"]);
}

#[tokio::test(start_paused = true)]
async fn cancelling_an_idle_job_is_a_no_op() {
    let registry = Registry::new(vec![idle("a")]).unwrap();

    registry.stop_job("a").unwrap();
    registry.cancel_job("a").unwrap();
    registry.wait_job("a").await.unwrap();

    let status = registry.status("a").unwrap();
    assert_eq!(status.invocations, 0);
    registry.remove_job("a").unwrap();
}
