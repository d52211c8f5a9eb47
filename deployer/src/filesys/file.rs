//! File operations

use std::fs::Permissions;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::errors::DeployError;

/// A file wrapper with path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Read file contents as string
    pub async fn read_string(&self) -> Result<String, DeployError> {
        Ok(fs::read_to_string(&self.path).await?)
    }

    /// Read file as JSON
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, DeployError> {
        let contents = self.read_string().await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Read file as JSON, falling back to `T::default()` when it is missing
    pub async fn read_json_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, DeployError> {
        if !self.exists().await {
            return Ok(T::default());
        }
        self.read_json().await
    }

    /// Replace the file contents, creating parent directories.
    ///
    /// Writes go through a sibling temp file and a rename so readers never
    /// observe a half-written document. An existing file keeps its
    /// permissions. The temp file is removed if any step fails.
    pub async fn write_string(&self, contents: &str) -> Result<(), DeployError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let permissions = match fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => Some(meta.permissions()),
            _ => None,
        };

        let temp_path = self.path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));
        let result = Self::replace_with(&temp_path, &self.path, contents, permissions).await;
        if result.is_err() {
            if let Err(e) = fs::remove_file(&temp_path).await {
                debug!("Could not remove temp file {:?}: {}", temp_path, e);
            }
        }
        result
    }

    async fn replace_with(
        temp_path: &Path,
        target: &Path,
        contents: &str,
        permissions: Option<Permissions>,
    ) -> Result<(), DeployError> {
        let mut file = fs::File::create(temp_path).await?;
        if let Some(permissions) = permissions {
            file.set_permissions(permissions).await?;
        }
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(temp_path, target).await?;
        Ok(())
    }
}
