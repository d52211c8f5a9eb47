//! Workspace storage: layout, settings and session state

pub mod layout;
pub mod session;
pub mod settings;
