//! Utility functions

use serde::{Deserialize, Serialize};

use crate::process::runner::{args, CommandRunner, SystemRunner};
use crate::storage::settings::Settings;

/// Version information for the deployer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Device id used when none is given: the host name, lowercased
pub fn default_device_id() -> String {
    sysinfo::System::host_name()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "edge-device".to_string())
}

/// Result of probing one external tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCheck {
    pub tool: String,
    pub available: bool,
    pub detail: String,
}

/// Check that a tool answers `<program> version`
pub async fn check_tool(runner: &dyn CommandRunner, program: &str) -> ToolCheck {
    match runner.run(program, &args(&["version"])).await {
        Ok(output) if output.success() => ToolCheck {
            tool: program.to_string(),
            available: true,
            detail: output.stdout.lines().next().unwrap_or_default().trim().to_string(),
        },
        Ok(output) => ToolCheck {
            tool: program.to_string(),
            available: false,
            detail: output.stderr.trim().to_string(),
        },
        Err(e) => ToolCheck {
            tool: program.to_string(),
            available: false,
            detail: e.to_string(),
        },
    }
}

/// Print the state of the host tools the steps depend on
pub async fn run_diagnostic(settings: &Settings) {
    println!("=== Edge Deployer Diagnostics ===\n");

    let version = version_info();
    println!("Version: {} ({}, built {})", version.version, version.git_hash, version.build_time);
    println!("Host: {}", default_device_id());
    println!();

    let runner = SystemRunner;
    for program in [&settings.tools.az, &settings.tools.docker] {
        let check = check_tool(&runner, program).await;
        let status = if check.available { "ok" } else { "MISSING" };
        println!("{:<10} {:<8} {}", check.tool, status, check.detail);
    }

    println!();
    println!("Device config: {}", settings.device_config.path);
    println!("Scoring endpoint: {}", settings.scoring.endpoint);
    println!("Readiness marker: {:?}", settings.readiness.marker);
}
