//! Command runner
//!
//! Every `az` and `docker` invocation goes through [`CommandRunner`] so the
//! wrappers can be exercised without the real tools installed.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::DeployError;

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into `DeployError::CommandError`
    pub fn into_result(self, command: &str) -> Result<Self, DeployError> {
        if self.success() {
            return Ok(self);
        }
        Err(DeployError::CommandError {
            command: command.to_string(),
            status: self
                .code
                .map(|c| format!("exit code {}", c))
                .unwrap_or_else(|| "terminated by signal".to_string()),
            stderr: self.stderr.trim().to_string(),
        })
    }

    /// Log a failed command without failing the caller
    pub fn log_failure(&self, command: &str) {
        if !self.success() {
            warn!(
                "{} exited with {:?}: {}",
                command,
                self.code,
                self.stderr.trim()
            );
        }
    }
}

/// Runs a program to completion and captures its output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, DeployError>;
}

/// Runs commands on the host with `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, DeployError> {
        debug!("Running: {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DeployError::CommandError {
                command: program.to_string(),
                status: "failed to start".to_string(),
                stderr: e.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Build an owned argument list from string slices
pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
