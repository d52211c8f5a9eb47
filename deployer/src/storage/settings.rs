//! Settings file management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;

/// Deployer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines on stderr
    #[serde(default)]
    pub json_logs: bool,

    /// Also write logs under the workspace `logs/` directory
    #[serde(default)]
    pub log_to_file: bool,

    /// Fail rendering when a placeholder is missing from the template
    #[serde(default)]
    pub strict_templates: bool,

    /// IoT Hub pricing tier used by `provision`
    #[serde(default = "default_hub_sku")]
    pub hub_sku: String,

    #[serde(default)]
    pub discovery: DiscoverySettings,

    #[serde(default)]
    pub readiness: ReadinessSettings,

    #[serde(default)]
    pub scoring: ScoringSettings,

    #[serde(default)]
    pub tools: ToolSettings,

    #[serde(default)]
    pub device_config: DeviceConfigSettings,
}

fn default_hub_sku() -> String {
    "S1".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            log_to_file: false,
            strict_templates: false,
            hub_sku: default_hub_sku(),
            discovery: DiscoverySettings::default(),
            readiness: ReadinessSettings::default(),
            scoring: ScoringSettings::default(),
            tools: ToolSettings::default(),
            device_config: DeviceConfigSettings::default(),
        }
    }
}

/// Container discovery poll settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySettings {
    /// Delay between container listings
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Give up after this long; unbounded when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Give up after this many listings; unbounded when absent
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_secs: None,
            max_attempts: None,
        }
    }
}

impl DiscoverySettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Readiness wait settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessSettings {
    /// Substring of the log line that marks the module as ready
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Give up after this long; blocks until the stream ends when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Print every consumed log line
    #[serde(default = "default_true")]
    pub echo: bool,
}

fn default_marker() -> String {
    "Opened module client connection".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            timeout_secs: None,
            echo: true,
        }
    }
}

impl ReadinessSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Scoring endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Name of the single field in the request envelope
    #[serde(default = "default_input_field")]
    pub input_field: String,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:5001/score".to_string()
}

fn default_input_field() -> String {
    scoring_api::models::DEFAULT_INPUT_FIELD.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            input_field: default_input_field(),
            timeout_secs: default_request_timeout(),
        }
    }
}

/// External tool binaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_az")]
    pub az: String,

    #[serde(default = "default_docker")]
    pub docker: String,
}

fn default_az() -> String {
    "az".to_string()
}

fn default_docker() -> String {
    "docker".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            az: default_az(),
            docker: default_docker(),
        }
    }
}

/// Edge runtime config file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfigSettings {
    #[serde(default = "default_config_path")]
    pub path: String,

    #[serde(default = "default_management_uri")]
    pub management_uri: String,

    #[serde(default = "default_workload_uri")]
    pub workload_uri: String,
}

fn default_config_path() -> String {
    "/etc/iotedge/config.yaml".to_string()
}

fn default_management_uri() -> String {
    "http://172.17.0.1:15580".to_string()
}

fn default_workload_uri() -> String {
    "http://172.17.0.1:15581".to_string()
}

impl Default for DeviceConfigSettings {
    fn default() -> Self {
        Self {
            path: default_config_path(),
            management_uri: default_management_uri(),
            workload_uri: default_workload_uri(),
        }
    }
}
