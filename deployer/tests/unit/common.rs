//! Fakes for the external tools

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use edge_deployer::errors::DeployError;
use edge_deployer::process::runner::{CommandOutput, CommandRunner};
use edge_deployer::runtime::container::ContainerSummary;
use edge_deployer::runtime::{ContainerRuntime, LogStream};
use futures::StreamExt;

pub fn container(id: &str, name: &str) -> ContainerSummary {
    ContainerSummary {
        id: id.to_string(),
        names: vec![format!("/{}", name)],
    }
}

/// Container runtime answering from scripted listings and log lines.
///
/// The last listing repeats once the script runs out.
#[derive(Default)]
pub struct FakeRuntime {
    listings: Mutex<VecDeque<Result<Vec<ContainerSummary>, String>>>,
    logs: HashMap<String, Vec<String>>,
    hold_open: bool,
    pub list_calls: Mutex<u32>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(self, containers: Vec<ContainerSummary>) -> Self {
        self.push(Ok(containers))
    }

    pub fn failing_listing(self, message: &str) -> Self {
        self.push(Err(message.to_string()))
    }

    pub fn logs(mut self, container_id: &str, lines: &[&str]) -> Self {
        self.logs.insert(
            container_id.to_string(),
            lines.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Keep the log stream open after the scripted lines
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    fn push(self, listing: Result<Vec<ContainerSummary>, String>) -> Self {
        self.listings.lock().unwrap().push_back(listing);
        self
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, DeployError> {
        *self.list_calls.lock().unwrap() += 1;
        let mut listings = self.listings.lock().unwrap();
        let next = if listings.len() > 1 {
            listings.pop_front()
        } else {
            listings.front().cloned()
        };
        next.unwrap_or_else(|| Ok(Vec::new()))
            .map_err(DeployError::RuntimeError)
    }

    async fn follow_logs(&self, container_id: &str) -> Result<LogStream, DeployError> {
        let lines = self
            .logs
            .get(container_id)
            .cloned()
            .ok_or_else(|| DeployError::NotFound(format!("container {}", container_id)))?;
        let stream = futures::stream::iter(lines);
        if self.hold_open {
            Ok(stream.chain(futures::stream::pending()).boxed())
        } else {
            Ok(stream.boxed())
        }
    }
}

/// Command runner recording every call and answering by subcommand prefix
#[derive(Default)]
pub struct FakeRunner {
    replies: Vec<(Vec<String>, CommandOutput)>,
    pub calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with `stdout` and exit code 0
    pub fn reply(mut self, prefix: &[&str], stdout: &str) -> Self {
        self.replies.push((
            prefix.iter().map(|s| s.to_string()).collect(),
            CommandOutput {
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        ));
        self
    }

    /// Answer commands starting with `prefix` with a failure
    pub fn fail(mut self, prefix: &[&str], stderr: &str) -> Self {
        self.replies.push((
            prefix.iter().map(|s| s.to_string()).collect(),
            CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded calls whose arguments start with `prefix`
    pub fn calls_to(&self, prefix: &[&str]) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|call| starts_with(call, prefix))
            .collect()
    }
}

fn starts_with(call: &[String], prefix: &[impl AsRef<str>]) -> bool {
    call.len() >= prefix.len() && call.iter().zip(prefix).all(|(a, b)| a == b.as_ref())
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, _program: &str, args: &[String]) -> Result<CommandOutput, DeployError> {
        self.calls.lock().unwrap().push(args.to_vec());
        let reply = self
            .replies
            .iter()
            .find(|(prefix, _)| starts_with(args, prefix))
            .map(|(_, output)| output.clone())
            .unwrap_or(CommandOutput {
                code: Some(0),
                stdout: "{}".to_string(),
                stderr: String::new(),
            });
        Ok(reply)
    }
}
