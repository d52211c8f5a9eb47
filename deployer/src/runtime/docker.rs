//! Docker runtime through the `docker` CLI

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::errors::DeployError;
use crate::process::runner::{args, CommandRunner};
use crate::runtime::container::ContainerSummary;
use crate::runtime::{ContainerRuntime, LogStream};

/// Buffered log lines between the reader tasks and the consumer
const LOG_CHANNEL_CAPACITY: usize = 256;

/// Talks to the local Docker daemon with the `docker` binary
#[derive(Clone)]
pub struct DockerCli {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl DockerCli {
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, DeployError> {
        let output = self
            .runner
            .run(&self.program, &args(&["ps", "--no-trunc", "--format", "{{json .}}"]))
            .await?
            .into_result("docker ps")?;
        parse_ps_output(&output.stdout)
    }

    async fn follow_logs(&self, container_id: &str) -> Result<LogStream, DeployError> {
        debug!("Following logs of container {}", container_id);
        let mut child = Command::new(&self.program)
            .args(["logs", "--follow", container_id])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DeployError::RuntimeError(format!("Failed to run docker logs: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DeployError::RuntimeError("docker logs stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DeployError::RuntimeError("docker logs stderr not captured".to_string()))?;

        let (tx, rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        tokio::spawn(forward_lines(stdout, tx.clone()));
        tokio::spawn(forward_lines(stderr, tx));

        // The child rides along with the receiver so it is killed when the
        // consumer drops the stream
        let stream = futures::stream::unfold((rx, child), |(mut rx, child)| async move {
            rx.recv().await.map(|line| (line, (rx, child)))
        });
        Ok(Box::pin(stream))
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    // consumer is gone
                    return;
                }
            }
            Ok(None) => return,
            Err(e) => {
                warn!("Failed to read container output: {}", e);
                return;
            }
        }
    }
}

/// One line of `docker ps --format '{{json .}}'`
#[derive(Deserialize)]
struct PsRow {
    #[serde(rename = "ID")]
    id: String,

    /// Comma separated
    #[serde(rename = "Names", default)]
    names: String,
}

/// Parse `docker ps --format '{{json .}}'` output, one JSON object per line
pub fn parse_ps_output(stdout: &str) -> Result<Vec<ContainerSummary>, DeployError> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| -> Result<ContainerSummary, DeployError> {
            let row: PsRow = serde_json::from_str(line)?;
            Ok(ContainerSummary {
                id: row.id,
                names: row
                    .names
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from)
                    .collect(),
            })
        })
        .collect()
}
