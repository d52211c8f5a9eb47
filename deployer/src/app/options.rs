//! Command line options

use std::collections::HashMap;
use std::str::FromStr;

use crate::errors::DeployError;
use crate::storage::session::{self, Session};
use crate::storage::settings::Settings;

/// One step of the deployment walkthrough
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Create the resource group and IoT Hub
    Provision,

    /// Register the edge device identity
    RegisterDevice,

    /// Write the device connection string into the runtime config
    ConfigureDevice,

    /// Render the deployment descriptor
    Render,

    /// Render and push the deployment descriptor
    Deploy,

    /// Wait for the module container to come up
    Wait,

    /// Send a test request to the module
    Score,

    /// Deploy, then wait
    Up,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::Provision,
        Step::RegisterDevice,
        Step::ConfigureDevice,
        Step::Render,
        Step::Deploy,
        Step::Wait,
        Step::Score,
        Step::Up,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::Provision => "provision",
            Step::RegisterDevice => "register-device",
            Step::ConfigureDevice => "configure-device",
            Step::Render => "render",
            Step::Deploy => "deploy",
            Step::Wait => "wait",
            Step::Score => "score",
            Step::Up => "up",
        }
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::ALL
            .iter()
            .find(|step| step.name() == s)
            .copied()
            .ok_or_else(|| format!("Unknown step: {}", s))
    }
}

/// Parsed command line: an optional step and `--key=value` options.
///
/// Keys are normalized to snake_case, so `--hub-name=x` and `--hub_name=x`
/// are the same option. A bare `--flag` is stored as `"true"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub step: Option<String>,
    pub options: HashMap<String, String>,
}

impl CliArgs {
    pub fn parse<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = CliArgs::default();
        for arg in args {
            if let Some(option) = arg.strip_prefix("--") {
                let (key, value) = option.split_once('=').unwrap_or((option, "true"));
                parsed.options.insert(normalize_key(key), value.to_string());
                continue;
            }
            if parsed.step.is_none() {
                parsed.step = Some(arg);
            }
        }
        parsed
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some("true") | Some("1") | Some("yes"))
    }

    pub fn step(&self) -> Result<Option<Step>, DeployError> {
        self.step
            .as_deref()
            .map(|s| s.parse().map_err(DeployError::ValidationError))
            .transpose()
    }

    /// Copy session values given on the command line into the session
    pub fn apply_to_session(&self, target: &mut Session) -> Result<(), DeployError> {
        for key in SESSION_KEYS {
            if let Some(value) = self.get(key) {
                session::check_value(key, value)?;
                target.set(key, value);
            }
        }
        Ok(())
    }

    /// Override settings from the command line
    pub fn apply_to_settings(&self, settings: &mut Settings) -> Result<(), DeployError> {
        if let Some(level) = self.get("log_level") {
            settings.log_level = level.parse().map_err(DeployError::ConfigError)?;
        }
        if let Some(marker) = self.get("marker") {
            settings.readiness.marker = marker.to_string();
        }
        if let Some(secs) = self.get("ready_timeout") {
            settings.readiness.timeout_secs = Some(parse_number("ready_timeout", secs)?);
        }
        if let Some(secs) = self.get("discovery_timeout") {
            settings.discovery.timeout_secs = Some(parse_number("discovery_timeout", secs)?);
        }
        if let Some(attempts) = self.get("max_attempts") {
            settings.discovery.max_attempts = Some(parse_number("max_attempts", attempts)?);
        }
        if let Some(endpoint) = self.get("endpoint") {
            settings.scoring.endpoint = endpoint.to_string();
        }
        if self.flag("strict") {
            settings.strict_templates = true;
        }
        if self.flag("quiet") {
            settings.readiness.echo = false;
        }
        Ok(())
    }
}

const SESSION_KEYS: [&str; 8] = [
    session::SUBSCRIPTION_ID,
    session::RESOURCE_GROUP,
    session::LOCATION,
    session::HUB_NAME,
    session::DEVICE_ID,
    session::MODULE_NAME,
    session::IMAGE_NAME,
    session::REGISTRY_NAME,
];

fn normalize_key(key: &str) -> String {
    key.trim_start_matches('-').replace('-', "_")
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, DeployError> {
    value
        .parse()
        .map_err(|_| DeployError::ConfigError(format!("--{} expects a number, got '{}'", key, value)))
}

/// Usage text printed when no step is given
pub fn usage() -> String {
    let steps: Vec<&str> = Step::ALL.iter().map(Step::name).collect();
    format!(
        "Usage: edge-deployer <step> [--key=value ...]\n\n\
         Steps: {}\n\n\
         Session options: --subscription-id --resource-group --location --hub-name\n\
         \x20                --device-id --module-name --image-name --registry-name\n\
         Other options:   --workdir --config --text --registry-username --registry-password\n\
         \x20                --marker --ready-timeout --discovery-timeout --max-attempts\n\
         \x20                --endpoint --strict --quiet --print-connection-string\n\
         \x20                --log-level --version --diagnostic",
        steps.join(", ")
    )
}
