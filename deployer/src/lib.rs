//! Edge Deployer Library
//!
//! Provision an IoT Edge device, deploy a model module to it, wait for the
//! module to come up and send it a test request.

pub mod app;
pub mod azure;
pub mod device;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod manifest;
pub mod process;
pub mod readiness;
pub mod runtime;
pub mod scoring;
pub mod storage;
pub mod utils;
