//! Version stamp for `edge-deployer --version`
//!
//! `GIT_HASH` may be set by a packaging pipeline that builds outside a checkout;
//! otherwise it comes from `git describe`.

use std::env;
use std::process::Command;

use chrono::{SecondsFormat, Utc};

fn describe_head() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=10"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let described = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!described.is_empty()).then_some(described)
}

fn main() {
    let git_hash = env::var("GIT_HASH")
        .ok()
        .filter(|hash| !hash.trim().is_empty())
        .or_else(describe_head)
        .unwrap_or_else(|| "unknown".to_string());
    let build_time = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    println!("cargo:rustc-env=GIT_HASH={git_hash}");
    println!("cargo:rustc-env=BUILD_TIME={build_time}");

    println!("cargo:rerun-if-env-changed=GIT_HASH");
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/index");
}
