//! Completion client — the single narrow seam to the model API.
//!
//! The debate runner only ever needs "system + user prompt in, text out", so
//! that is the whole trait. Tests substitute a scripted implementation; the
//! production implementation speaks the OpenAI-compatible chat-completions
//! protocol over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::CourtConfig;

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System prompt (role preamble).
    pub system: String,
    /// User prompt (case material plus accumulated context).
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Error from a completion call. Per the error design, none of these are
/// retried — the current case is aborted and the failure surfaced.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("API error ({status}): {body}")]
    ApiStatus { status: u16, body: String },

    #[error("malformed API response: {0}")]
    MalformedResponse(String),
}

/// Narrow interface to the external model: prompt in, text out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ClientError>;

    /// Model identifier, for export metadata and logs.
    fn model(&self) -> &str;
}

/// Production client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatClient {
    /// Build a client for `model` against the configured endpoint.
    pub fn new(config: &CourtConfig, model: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ClientError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user}
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::ApiStatus { status, body });
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

        let content = envelope["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ClientError::MalformedResponse(
                    "missing choices[0].message.content".to_string(),
                )
            })?;

        tracing::debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(content.to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
