//! Bounded polling and container discovery

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::runtime::container::find_container;
use crate::runtime::ContainerRuntime;
use crate::storage::settings::DiscoverySettings;

/// Poll loop bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay between attempts
    pub interval: Duration,

    /// Overall deadline; unbounded when `None`
    pub timeout: Option<Duration>,

    /// Attempt limit; unbounded when `None`
    pub max_attempts: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: None,
            max_attempts: None,
        }
    }
}

impl From<&DiscoverySettings> for PollOptions {
    fn from(settings: &DiscoverySettings) -> Self {
        Self {
            interval: settings.interval(),
            timeout: settings.timeout(),
            max_attempts: settings.max_attempts,
        }
    }
}

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The operation produced a value
    Success { value: T, attempts: u32 },

    /// The deadline passed first
    Timeout { attempts: u32 },

    /// The attempt limit was reached first
    Exhausted { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Success { attempts, .. }
            | PollOutcome::Timeout { attempts }
            | PollOutcome::Exhausted { attempts } => *attempts,
        }
    }

    pub fn value(self) -> Option<T> {
        match self {
            PollOutcome::Success { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Call `op` until it returns `Some`, sleeping `interval` between attempts.
///
/// `op` receives the 1-based attempt number. Without a timeout or attempt
/// limit this loops until `op` succeeds.
pub async fn poll_until<T, Op, OpFut, S, SFut>(options: &PollOptions, mut op: Op, sleep_fn: S) -> PollOutcome<T>
where
    Op: FnMut(u32) -> OpFut,
    OpFut: Future<Output = Option<T>>,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let mut attempts = 0u32;

    let polling = async {
        loop {
            attempts += 1;
            if let Some(value) = op(attempts).await {
                return Some(value);
            }
            if matches!(options.max_attempts, Some(max) if attempts >= max) {
                return None;
            }
            sleep_fn(options.interval).await;
        }
    };

    let finished = match options.timeout {
        Some(timeout) => tokio::time::timeout(timeout, polling).await.ok(),
        None => Some(polling.await),
    };

    match finished {
        Some(Some(value)) => PollOutcome::Success { value, attempts },
        Some(None) => PollOutcome::Exhausted { attempts },
        None => PollOutcome::Timeout { attempts },
    }
}

/// Poll the runtime until a container whose name contains `target` runs.
///
/// Listing failures are logged and count as "not found yet".
pub async fn discover_container<S, F>(
    runtime: &dyn ContainerRuntime,
    target: &str,
    options: &PollOptions,
    sleep_fn: S,
) -> PollOutcome<String>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Waiting for a container named like '{}'...", target);

    let outcome = poll_until(
        options,
        |attempt| async move {
            match runtime.list_containers().await {
                Ok(containers) => {
                    let found = find_container(&containers, target).map(str::to_string);
                    if found.is_none() {
                        debug!("Attempt {}: '{}' not running yet", attempt, target);
                    }
                    found
                }
                Err(e) => {
                    warn!("Attempt {}: failed to list containers: {}", attempt, e);
                    None
                }
            }
        },
        sleep_fn,
    )
    .await;

    match &outcome {
        PollOutcome::Success { value, attempts } => {
            info!("Found container {} after {} attempt(s)", value, attempts)
        }
        PollOutcome::Timeout { attempts } => {
            warn!("Gave up on '{}' after timeout ({} attempts)", target, attempts)
        }
        PollOutcome::Exhausted { attempts } => {
            warn!("Gave up on '{}' after {} attempts", target, attempts)
        }
    }
    outcome
}
