//! Session state shared between steps
//!
//! The session is a flat `key=value` file. It is loaded once when the
//! process starts, updated in memory by each step, and written back
//! explicitly with [`Session::save`].

use std::collections::BTreeMap;

use tracing::debug;

use crate::errors::DeployError;
use crate::filesys::file::File;

pub const SUBSCRIPTION_ID: &str = "subscription_id";
pub const RESOURCE_GROUP: &str = "resource_group";
pub const LOCATION: &str = "location";
pub const HUB_NAME: &str = "hub_name";
pub const DEVICE_ID: &str = "device_id";
pub const MODULE_NAME: &str = "module_name";
pub const IMAGE_NAME: &str = "image_name";
pub const REGISTRY_NAME: &str = "registry_name";

/// Values persisted across steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub location: Option<String>,
    pub hub_name: Option<String>,
    pub device_id: Option<String>,
    pub module_name: Option<String>,
    pub image_name: Option<String>,
    pub registry_name: Option<String>,

    /// Keys this tool does not know about, kept verbatim
    pub extra: BTreeMap<String, String>,
}

impl Session {
    /// Parse `key=value` lines. Blank lines and `#` comments are skipped,
    /// surrounding single or double quotes are stripped, later keys win.
    pub fn parse(contents: &str) -> Result<Self, DeployError> {
        let mut session = Session::default();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=').ok_or_else(|| {
                DeployError::SessionError(format!("line {}: expected key=value", index + 1))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(DeployError::SessionError(format!(
                    "line {}: empty key",
                    index + 1
                )));
            }
            session.set(key, unquote(value.trim()));
        }
        Ok(session)
    }

    /// Load from file; a missing file is an empty session
    pub async fn load(file: &File) -> Result<Self, DeployError> {
        if !file.exists().await {
            debug!("No session file at {:?}, starting empty", file.path());
            return Ok(Self::default());
        }
        Self::parse(&file.read_string().await?)
    }

    /// Persist to file, overwriting it
    pub async fn save(&self, file: &File) -> Result<(), DeployError> {
        debug!("Saving session to {:?}", file.path());
        file.write_string(&self.to_env_string()?).await
    }

    /// Serialize as sorted `key='value'` lines; values spanning lines are rejected
    pub fn to_env_string(&self) -> Result<String, DeployError> {
        let mut out = String::new();
        for (key, value) in self.entries() {
            check_value(&key, &value)?;
            out.push_str(&format!("{}='{}'\n", key, value.replace('\'', "\\'")));
        }
        Ok(out)
    }

    /// All set keys in key order
    pub fn entries(&self) -> BTreeMap<String, String> {
        let mut entries = self.extra.clone();
        for key in KNOWN_KEYS {
            if let Some(value) = self.get(key) {
                entries.insert(key.to_string(), value.to_string());
            }
        }
        entries
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let slot = match key {
            SUBSCRIPTION_ID => &self.subscription_id,
            RESOURCE_GROUP => &self.resource_group,
            LOCATION => &self.location,
            HUB_NAME => &self.hub_name,
            DEVICE_ID => &self.device_id,
            MODULE_NAME => &self.module_name,
            IMAGE_NAME => &self.image_name,
            REGISTRY_NAME => &self.registry_name,
            other => return self.extra.get(other).map(String::as_str),
        };
        slot.as_deref()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match key {
            SUBSCRIPTION_ID => self.subscription_id = value,
            RESOURCE_GROUP => self.resource_group = value,
            LOCATION => self.location = value,
            HUB_NAME => self.hub_name = value,
            DEVICE_ID => self.device_id = value,
            MODULE_NAME => self.module_name = value,
            IMAGE_NAME => self.image_name = value,
            REGISTRY_NAME => self.registry_name = value,
            other => {
                if let Some(value) = value {
                    self.extra.insert(other.to_string(), value);
                }
            }
        }
    }

    /// Fetch a value a step cannot run without
    pub fn require(&self, key: &str) -> Result<&str, DeployError> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(DeployError::SessionError(format!(
                "'{}' is not set; pass --{}=<value> or run the step that records it",
                key,
                key.replace('_', "-")
            ))),
        }
    }
}

/// A session value must fit on one line of the session file
pub fn check_value(key: &str, value: &str) -> Result<(), DeployError> {
    if value.contains(['\n', '\r']) {
        return Err(DeployError::SessionError(format!(
            "value for '{}' contains a line break",
            key
        )));
    }
    Ok(())
}

const KNOWN_KEYS: [&str; 8] = [
    SUBSCRIPTION_ID,
    RESOURCE_GROUP,
    LOCATION,
    HUB_NAME,
    DEVICE_ID,
    MODULE_NAME,
    IMAGE_NAME,
    REGISTRY_NAME,
];

fn unquote(value: &str) -> String {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            let inner = &value[1..value.len() - 1];
            return inner.replace(&format!("\\{}", quote), &quote.to_string());
        }
    }
    value.to_string()
}
