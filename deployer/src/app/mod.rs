//! Step dispatch for the deployment walkthrough

pub mod options;
pub mod run;
pub mod state;
