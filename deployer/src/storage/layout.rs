//! Workspace layout

use std::path::PathBuf;

use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// Environment variable overriding the default workspace directory
pub const WORKDIR_ENV_VAR: &str = "EDGE_DEPLOYER_HOME";

/// Where the deployer keeps its files between steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    /// Base directory for all storage
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base(&self) -> Dir {
        Dir::new(&self.base_dir)
    }

    /// Settings file (JSON)
    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    /// Session key/value file shared by all steps
    pub fn session_file(&self) -> File {
        File::new(self.base_dir.join("session.env"))
    }

    /// Optional deployment skeleton overriding the built-in one
    pub fn template_file(&self) -> File {
        File::new(self.base_dir.join("deployment.template.json"))
    }

    /// Rendered deployment descriptor, overwritten on every render
    pub fn deployment_file(&self) -> File {
        File::new(self.base_dir.join("deployment.json"))
    }

    pub fn logs_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("logs"))
    }

    /// Create the workspace directories
    pub async fn setup(&self) -> Result<(), crate::errors::DeployError> {
        self.base().create().await?;
        self.logs_dir().create().await?;
        Ok(())
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        let base_dir = std::env::var_os(WORKDIR_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".edge-deployer"));
        Self::new(base_dir)
    }
}
