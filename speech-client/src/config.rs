use std::time::Duration;

use crate::error::{ApiError, Result};

pub const DEFAULT_PATH: &str = "/polly";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything the HTTP client needs before its first request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API gateway root, e.g. https://abc123.execute-api.us-east-2.amazonaws.com/dev
    pub endpoint: String,
    /// Resource path appended to the endpoint
    pub path: String,
    /// Sent as `x-api-key` when present
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            path: DEFAULT_PATH.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Full URL of the speech resource
    pub fn url(&self) -> Result<String> {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(ApiError::Config("API endpoint is not set".to_string()));
        }
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ApiError::Config(format!(
                "API endpoint must start with http:// or https://: {}",
                endpoint
            )));
        }

        let path = self.path.trim();
        if path.is_empty() {
            return Ok(endpoint.to_string());
        }
        Ok(format!("{}/{}", endpoint, path.trim_start_matches('/')))
    }
}
