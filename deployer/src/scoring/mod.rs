//! Scoring round-trip against the deployed module

pub mod client;
