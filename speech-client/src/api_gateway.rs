//! HTTP client for the Polly API gateway
//!
//! The gateway fronts a function that calls Polly and returns
//! `{"audio": "<base64 mp3>"}`. Errors come back as a non-2xx status with
//! `{"error": "..."}` (from the function) or `{"message": "..."}` (from the
//! gateway itself).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::provider::{SpeechApi, SpeechRequest, SpeechResponse};

/// Speech client that talks to the API gateway over HTTPS
pub struct ApiGatewayClient {
    url: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: Client,
}

impl std::fmt::Debug for ApiGatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiGatewayClient")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ApiGatewayClient {
    /// Build a configured client. Must be called before the first request.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let url = config.url()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url,
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout.as_secs(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    message: Option<String>,
}

/// Pull a readable message out of an error body, falling back to the raw text
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        if let Some(message) = parsed.error.or(parsed.message) {
            return message;
        }
    }
    body.trim().to_string()
}

/// Parse a 2xx body into a SpeechResponse
fn parse_response(body: &str) -> Result<SpeechResponse> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ApiError::MalformedResponse(format!("Invalid JSON: {}", e)))?;

    if !value.is_object() {
        return Err(ApiError::MalformedResponse(
            "Expected a JSON object".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::MalformedResponse(format!("Unexpected response shape: {}", e)))
}

#[async_trait]
impl SpeechApi for ApiGatewayClient {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechResponse> {
        log::debug!(
            "POST {} (voice: {}, {} chars)",
            self.url,
            request.voice_id,
            request.text.chars().count()
        );

        let mut request_builder = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            request_builder = request_builder.header("x-api-key", api_key);
        }

        let response = request_builder.json(request).send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::network(format!(
                    "Request timed out after {} seconds",
                    self.timeout_secs
                ))
            } else {
                ApiError::network(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        log::debug!("API response received: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let detail = error_message(&body);
            let message = if detail.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                format!("HTTP {}: {}", status.as_u16(), detail)
            };
            return Err(ApiError::Network {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        parse_response(&body)
    }

    fn name(&self) -> &str {
        "API Gateway"
    }
}
