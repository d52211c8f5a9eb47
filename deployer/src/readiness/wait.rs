//! Readiness wait on a container's log stream

use std::time::Duration;

use colored::Colorize;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::DeployError;
use crate::runtime::ContainerRuntime;

/// Readiness wait state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    /// Opening the log stream
    Attaching,

    /// Consuming lines, marker not seen yet
    Streaming,

    /// Marker seen
    Ready,

    /// Stream ended before the marker
    StreamClosed,
}

/// Readiness wait event
#[derive(Debug, Clone)]
pub enum ReadinessEvent {
    /// Log stream opened
    Attached,

    /// One line of output
    Line(String),

    /// Log stream ended
    StreamEnded,
}

/// Tracks the wait for a readiness marker
#[derive(Debug, Clone)]
pub struct ReadinessTracker {
    state: ReadinessState,
    marker: String,
    lines_consumed: usize,
    matched_line: Option<String>,
}

impl ReadinessTracker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            state: ReadinessState::Attaching,
            marker: marker.into(),
            lines_consumed: 0,
            matched_line: None,
        }
    }

    pub fn state(&self) -> &ReadinessState {
        &self.state
    }

    pub fn lines_consumed(&self) -> usize {
        self.lines_consumed
    }

    pub fn matched_line(&self) -> Option<&str> {
        self.matched_line.as_deref()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: ReadinessEvent) -> Result<(), String> {
        let new_state = match (&self.state, event) {
            (ReadinessState::Attaching, ReadinessEvent::Attached) => ReadinessState::Streaming,

            (ReadinessState::Streaming, ReadinessEvent::Line(line)) => {
                self.lines_consumed += 1;
                if line.contains(&self.marker) {
                    self.matched_line = Some(line);
                    ReadinessState::Ready
                } else {
                    ReadinessState::Streaming
                }
            }
            (ReadinessState::Streaming, ReadinessEvent::StreamEnded) => ReadinessState::StreamClosed,

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

/// How a readiness wait ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReadinessOutcome {
    Ready { lines_consumed: usize, line: String },
    TimedOut { lines_consumed: usize },
    StreamClosed { lines_consumed: usize },
}

impl ReadinessOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessOutcome::Ready { .. })
    }
}

/// Consume `lines` until one contains `marker`.
///
/// Lines after the marker are left unread. Without a timeout this blocks
/// until the marker shows up or the stream ends.
pub async fn wait_for_marker<S>(
    mut lines: S,
    marker: &str,
    timeout: Option<Duration>,
    echo: bool,
) -> Result<ReadinessOutcome, DeployError>
where
    S: Stream<Item = String> + Unpin,
{
    let mut tracker = ReadinessTracker::new(marker);
    tracker
        .process(ReadinessEvent::Attached)
        .map_err(DeployError::Internal)?;

    let consume = async {
        while let Some(line) = lines.next().await {
            if echo {
                println!("{}", line.dimmed());
            }
            debug!("container: {}", line);
            tracker.process(ReadinessEvent::Line(line))?;
            if tracker.state() == &ReadinessState::Ready {
                return Ok(());
            }
        }
        tracker.process(ReadinessEvent::StreamEnded)
    };

    let consumed = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, consume).await.ok(),
        None => Some(consume.await),
    };
    if let Some(result) = consumed {
        result.map_err(DeployError::Internal)?;
    }

    let lines_consumed = tracker.lines_consumed();
    Ok(match tracker.state() {
        ReadinessState::Ready => ReadinessOutcome::Ready {
            lines_consumed,
            line: tracker.matched_line().unwrap_or_default().to_string(),
        },
        ReadinessState::StreamClosed => ReadinessOutcome::StreamClosed { lines_consumed },
        ReadinessState::Attaching | ReadinessState::Streaming => {
            ReadinessOutcome::TimedOut { lines_consumed }
        }
    })
}

/// Attach to a container's output and wait for the readiness marker
pub async fn wait_until_ready(
    runtime: &dyn ContainerRuntime,
    container_id: &str,
    marker: &str,
    timeout: Option<Duration>,
    echo: bool,
) -> Result<ReadinessOutcome, DeployError> {
    info!("Waiting for '{}' from container {}...", marker, container_id);
    let stream = runtime.follow_logs(container_id).await?;
    let outcome = wait_for_marker(stream, marker, timeout, echo).await?;

    match &outcome {
        ReadinessOutcome::Ready { lines_consumed, .. } => {
            info!("Container {} is ready after {} line(s)", container_id, lines_consumed)
        }
        ReadinessOutcome::TimedOut { lines_consumed } => warn!(
            "Timed out waiting for container {} ({} line(s) read)",
            container_id, lines_consumed
        ),
        ReadinessOutcome::StreamClosed { lines_consumed } => warn!(
            "Container {} closed its output after {} line(s) without the marker",
            container_id, lines_consumed
        ),
    }
    Ok(outcome)
}
