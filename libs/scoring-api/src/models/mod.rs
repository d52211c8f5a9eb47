//! API models

use serde::{Deserialize, Serialize};

/// Default name of the single field carried by the request envelope
pub const DEFAULT_INPUT_FIELD: &str = "input";

/// Scoring request envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRequest {
    /// Name of the JSON field holding the text
    pub field: String,

    /// Text payload to score
    pub text: String,
}

impl ScoreRequest {
    /// Create a request using the default `input` field
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            field: DEFAULT_INPUT_FIELD.to_string(),
            text: text.into(),
        }
    }

    /// Override the envelope field name
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Build the JSON body, e.g. `{"input": "..."}`
    pub fn envelope(&self) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(
            self.field.clone(),
            serde_json::Value::String(self.text.clone()),
        );
        serde_json::Value::Object(body)
    }
}

/// One scored pair as returned by the model, in server order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTriple {
    pub id_a: String,
    pub id_b: String,
    pub score: f64,
}
