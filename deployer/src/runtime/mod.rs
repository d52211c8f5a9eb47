//! Container runtime access

pub mod container;
pub mod docker;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::errors::DeployError;
use crate::runtime::container::ContainerSummary;

/// Live log lines of one container, stdout and stderr interleaved
pub type LogStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Read-only view of the container runtime on the edge host
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List the running containers once
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, DeployError>;

    /// Attach to a container's output; the stream ends when the output closes
    async fn follow_logs(&self, container_id: &str) -> Result<LogStream, DeployError>;
}
