//! Edge runtime config file
//!
//! The runtime's `config.yaml` is edited line by line instead of being
//! parsed, so comments and layout survive untouched.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::errors::DeployError;
use crate::filesys::file::File;

pub const DEVICE_CONNECTION_STRING: &str = "device_connection_string";
pub const MANAGEMENT_URI: &str = "management_uri";
pub const WORKLOAD_URI: &str = "workload_uri";

/// Values written into the device config
#[derive(Debug, Clone)]
pub struct DeviceConfigUpdate {
    pub connection_string: SecretString,
    pub management_uri: String,
    pub workload_uri: String,
}

/// Replace the value of every `key:` line, keeping its indentation.
///
/// Commented-out lines are left alone. Returns the number of lines changed,
/// or `NotFound` when no line carries the key.
pub fn set_field(contents: &str, key: &str, value: &str) -> Result<(String, usize), DeployError> {
    let prefix = format!("{}:", key);
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    let mut replaced = 0;

    let lines: Vec<String> = contents
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with(&prefix) {
                replaced += 1;
                let indent = &line[..line.len() - trimmed.len()];
                format!("{}{} {}", indent, prefix, quoted)
            } else {
                line.to_string()
            }
        })
        .collect();

    if replaced == 0 {
        return Err(DeployError::NotFound(format!(
            "field '{}' in device config",
            key
        )));
    }

    let mut out = lines.join("\n");
    if contents.ends_with('\n') {
        out.push('\n');
    }
    Ok((out, replaced))
}

/// Apply all three substitutions to config text
pub fn apply_update(contents: &str, update: &DeviceConfigUpdate) -> Result<String, DeployError> {
    let (contents, _) = set_field(
        contents,
        DEVICE_CONNECTION_STRING,
        update.connection_string.expose_secret(),
    )?;
    let (contents, _) = set_field(&contents, MANAGEMENT_URI, &update.management_uri)?;
    let (contents, _) = set_field(&contents, WORKLOAD_URI, &update.workload_uri)?;
    Ok(contents)
}

/// Rewrite the config file in place
pub async fn update_config_file(file: &File, update: &DeviceConfigUpdate) -> Result<(), DeployError> {
    debug!("Updating device config {:?}", file.path());
    let contents = file.read_string().await?;
    let updated = apply_update(&contents, update)?;
    file.write_string(&updated).await?;
    info!("Device config {:?} updated", file.path());
    Ok(())
}
