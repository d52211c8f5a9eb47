//! Readiness wait tests against a fake runtime

use std::time::Duration;

use edge_deployer::errors::DeployError;
use edge_deployer::readiness::wait::{wait_until_ready, ReadinessOutcome};

use crate::common::FakeRuntime;

const MARKER: &str = "Opened module client connection";

#[tokio::test]
async fn test_ready_after_marker() {
    let runtime = FakeRuntime::new()
        .logs(
            "b2",
            &[
                "Using TensorFlow backend.",
                "Loading model from /app/model",
                "IoT Hub module client initialized",
                "Opened module client connection",
                "Listening on 0.0.0.0:5001",
            ],
        )
        .hold_open();

    let outcome = wait_until_ready(&runtime, "b2", MARKER, Some(Duration::from_secs(5)), false)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ReadinessOutcome::Ready {
            lines_consumed: 4,
            line: MARKER.to_string()
        }
    );
}

#[tokio::test]
async fn test_marker_match_is_substring_and_case_sensitive() {
    let runtime = FakeRuntime::new().logs(
        "b2",
        &["opened module client connection", "[INFO] Opened module client connection (mqtt)"],
    );

    let outcome = wait_until_ready(&runtime, "b2", MARKER, None, false).await.unwrap();
    assert!(matches!(outcome, ReadinessOutcome::Ready { lines_consumed: 2, .. }));
}

#[tokio::test]
async fn test_container_exits_before_marker() {
    let runtime = FakeRuntime::new().logs("b2", &["Using TensorFlow backend.", "Traceback (most recent call last):"]);

    let outcome = wait_until_ready(&runtime, "b2", MARKER, None, false).await.unwrap();
    assert_eq!(outcome, ReadinessOutcome::StreamClosed { lines_consumed: 2 });
    assert!(!outcome.is_ready());
}

#[tokio::test]
async fn test_silent_container_times_out() {
    let runtime = FakeRuntime::new().logs("b2", &["Using TensorFlow backend."]).hold_open();

    let outcome = wait_until_ready(&runtime, "b2", MARKER, Some(Duration::from_millis(30)), false)
        .await
        .unwrap();
    assert_eq!(outcome, ReadinessOutcome::TimedOut { lines_consumed: 1 });
}

#[tokio::test]
async fn test_unknown_container_is_an_error() {
    let runtime = FakeRuntime::new();
    let result = wait_until_ready(&runtime, "zz", MARKER, None, false).await;
    assert!(matches!(result, Err(DeployError::NotFound(_))));
}
