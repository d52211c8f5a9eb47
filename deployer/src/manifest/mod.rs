//! Deployment descriptor templating

pub mod descriptor;
pub mod template;
