//! HTTP client for the insight backend

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::base::{
    ApiError, ApiResult, ChatRequest, ChatResponse, InsightBackend, SetKeyRequest,
};
use doc_insight_core::config::BackendConfig;

/// Error body the backend sends with non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// Production backend transport over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the given API base URL with the default timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(120))
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from backend configuration
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::with_timeout(&config.base_url, Duration::from_secs(config.timeout_s))
    }

    /// The API base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Decode a non-2xx response into an error.
    ///
    /// The backend's message is used verbatim when its body carries one;
    /// otherwise the error falls back to the HTTP status.
    async fn decode_error(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        match response.json::<ErrorBody>().await {
            Ok(body) if !body.error.is_empty() => ApiError::Backend(body.error),
            _ => ApiError::Status(status),
        }
    }
}

#[async_trait]
impl InsightBackend for HttpBackend {
    async fn chat(&self, request: &ChatRequest) -> ApiResult<ChatResponse> {
        let url = format!("{}/chat", self.base_url);
        debug!(
            "Sending chat request to {} ({} history entries)",
            url,
            request.chat_history.len()
        );

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        let text = response.text().await?;
        let data: ChatResponse = serde_json::from_str(&text)?;
        Ok(data)
    }

    async fn set_api_key(&self, request: &SetKeyRequest) -> ApiResult<()> {
        let url = format!("{}/set-api-key", self.base_url);
        debug!("Registering API key '{}' at {}", request.key_name, url);

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        // Success body is ignored
        Ok(())
    }
}
