//! Container discovery tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use edge_deployer::readiness::poll::{discover_container, poll_until, PollOptions, PollOutcome};

use crate::common::{container, FakeRuntime};

fn no_sleep(_: Duration) -> std::future::Ready<()> {
    std::future::ready(())
}

#[tokio::test]
async fn test_discovery_finds_module_among_system_containers() {
    let runtime = FakeRuntime::new().listing(vec![
        container("a1", "edgeAgent"),
        container("b2", "mymodule"),
    ]);

    let outcome = discover_container(&runtime, "mymodule", &PollOptions::default(), no_sleep).await;
    assert_eq!(
        outcome,
        PollOutcome::Success {
            value: "b2".to_string(),
            attempts: 1
        }
    );
}

#[tokio::test]
async fn test_discovery_waits_for_module_to_start() {
    let runtime = FakeRuntime::new()
        .listing(vec![])
        .listing(vec![container("a1", "edgeAgent")])
        .failing_listing("Cannot connect to the Docker daemon")
        .listing(vec![container("a1", "edgeAgent"), container("c3", "mymodule")]);

    let sleeps = AtomicU32::new(0);
    let outcome = discover_container(&runtime, "mymodule", &PollOptions::default(), |_| {
        sleeps.fetch_add(1, Ordering::SeqCst);
        std::future::ready(())
    })
    .await;

    assert_eq!(outcome.attempts(), 4);
    assert_eq!(outcome.value().as_deref(), Some("c3"));
    assert_eq!(sleeps.load(Ordering::SeqCst), 3);
    assert_eq!(*runtime.list_calls.lock().unwrap(), 4);
}

#[tokio::test]
async fn test_discovery_gives_up_after_max_attempts() {
    let runtime = FakeRuntime::new().listing(vec![container("a1", "edgeAgent")]);
    let options = PollOptions {
        max_attempts: Some(5),
        ..Default::default()
    };

    let outcome = discover_container(&runtime, "mymodule", &options, no_sleep).await;
    assert_eq!(outcome, PollOutcome::Exhausted { attempts: 5 });
}

#[tokio::test]
async fn test_discovery_times_out() {
    let runtime = FakeRuntime::new().listing(vec![]);
    let options = PollOptions {
        interval: Duration::from_millis(5),
        timeout: Some(Duration::from_millis(40)),
        max_attempts: None,
    };

    let outcome = discover_container(&runtime, "mymodule", &options, tokio::time::sleep).await;
    assert!(matches!(outcome, PollOutcome::Timeout { attempts } if attempts >= 1));
}

#[tokio::test]
async fn test_poll_until_returns_first_value() {
    let outcome = poll_until(
        &PollOptions::default(),
        |attempt| async move { (attempt == 3).then_some(attempt * 10) },
        no_sleep,
    )
    .await;
    assert_eq!(outcome, PollOutcome::Success { value: 30, attempts: 3 });
}
