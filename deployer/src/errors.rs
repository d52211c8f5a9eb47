//! Error types for the edge deployer

use thiserror::Error;

/// Main error type for the edge deployer
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Scoring error: {0}")]
    ScoringError(#[from] scoring_api::ScoringError),

    #[error("Template error: {0}")]
    TemplateError(#[from] TemplateError),

    #[error("Command '{command}' failed ({status}): {stderr}")]
    CommandError {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Scoring endpoint returned {status}: {body}")]
    EndpointError { status: u16, body: String },

    #[error("Module not ready: {0}")]
    NotReady(String),

    #[error("Container runtime error: {0}")]
    RuntimeError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for DeployError {
    fn from(err: anyhow::Error) -> Self {
        DeployError::Internal(err.to_string())
    }
}

/// Deployment descriptor templating errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("placeholder '{0}' does not occur in the template")]
    UnusedPlaceholder(String),

    #[error("value for placeholder '{0}' is empty")]
    EmptyValue(String),

    #[error("value for placeholder '{0}' contains a placeholder token")]
    TokenInValue(String),

    #[error("placeholder token '{0}' left in rendered document")]
    UnresolvedToken(String),

    #[error("rendered document is not valid JSON: {0}")]
    InvalidDocument(String),
}
