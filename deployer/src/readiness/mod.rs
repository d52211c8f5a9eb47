//! Deployment readiness: container discovery and log readiness wait

pub mod poll;
pub mod wait;
