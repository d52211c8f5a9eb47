//! Scoring endpoint API
//!
//! Request envelope and response decoding for the model served by the
//! deployed edge module. The endpoint answers with a JSON string whose
//! content is itself a list literal of `(id_a, id_b, score)` triples, so
//! every response goes through [`decode_score_response`].

pub mod decode;
pub mod literal;
pub mod models;

pub use decode::decode_score_response;
pub use models::{ScoreRequest, ScoreTriple};

use thiserror::Error;

/// Errors raised while encoding requests or decoding responses
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Response body is not a JSON string: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("Invalid list literal at offset {offset}: {message}")]
    Literal { offset: usize, message: String },

    #[error("Invalid triple at index {index}: {message}")]
    Triple { index: usize, message: String },
}
