//! Scoring HTTP client

use std::time::Duration;

use reqwest::{header, Client};
use scoring_api::{decode_score_response, ScoreRequest, ScoreTriple};
use tracing::{debug, error};
use url::Url;

use crate::errors::DeployError;
use crate::storage::settings::ScoringSettings;

/// Client for the module's `POST /score` endpoint
pub struct ScoringClient {
    client: Client,
    endpoint: Url,
    input_field: String,
}

impl ScoringClient {
    /// Create a new scoring client
    pub fn new(settings: &ScoringSettings) -> Result<Self, DeployError> {
        let endpoint = Url::parse(&settings.endpoint).map_err(|e| {
            DeployError::ConfigError(format!("Invalid scoring endpoint '{}': {}", settings.endpoint, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            input_field: settings.input_field.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one request and decode the ranked triples.
    ///
    /// No retry; any transport or status failure is returned as is.
    pub async fn score(&self, text: &str) -> Result<Vec<ScoreTriple>, DeployError> {
        let request = ScoreRequest::new(text).with_field(self.input_field.clone());
        debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(request.envelope().to_string())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Scoring request failed: {} - {}", status, body);
            return Err(DeployError::EndpointError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(decode_score_response(&body)?)
    }
}
