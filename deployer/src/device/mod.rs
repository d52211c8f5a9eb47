//! Edge device configuration

pub mod config;
