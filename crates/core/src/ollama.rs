//! Client for a local Ollama server.
//!
//! Summaries are produced with one non-streaming `POST /api/generate` call that
//! carries the captured text as the prompt and the chosen system prompt.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{PrecisError, Result};

/// Request timeout in seconds. Local models can be slow on long pages.
pub const DEFAULT_TIMEOUT: u64 = 300;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

/// Ollama client bound to one host and model.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
    model: String,
    timeout: u64,
}

impl OllamaClient {
    /// Creates a client. A trailing `/` on `host` is ignored.
    pub fn new(host: &str, model: &str) -> Result<Self> {
        Self::with_timeout(host, model, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(host: &str, model: &str, timeout: u64) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(PrecisError::HttpError)?;

        Ok(Self { client, host: host.trim_end_matches('/').to_string(), model: model.to_string(), timeout })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `prompt` under `system` and returns the model's markdown answer.
    ///
    /// # Errors
    ///
    /// - [`PrecisError::Api`] for a non-success HTTP status
    /// - [`PrecisError::Model`] when the body carries an `error`
    /// - [`PrecisError::Timeout`] / [`PrecisError::HttpError`] for transport failures
    pub async fn generate(&self, prompt: &str, system: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.host);
        let payload = GenerateRequest { model: &self.model, prompt, system, stream: false };

        info!(model = %self.model, url = %url, prompt_chars = prompt.chars().count(), "requesting summary");

        let response = self.client.post(&url).json(&payload).send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrecisError::Api {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body: GenerateResponse = response.json().await.map_err(|e| self.transport_error(e))?;
        if let Some(error) = body.error.filter(|e| !e.is_empty()) {
            return Err(PrecisError::Model(error));
        }

        debug!(chars = body.response.chars().count(), "summary received");
        Ok(body.response)
    }

    fn transport_error(&self, err: reqwest::Error) -> PrecisError {
        if err.is_timeout() { PrecisError::Timeout { timeout: self.timeout } } else { PrecisError::HttpError(err) }
    }
}
