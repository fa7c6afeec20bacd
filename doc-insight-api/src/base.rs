//! Base trait and wire types for the insight backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for backend API operations
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error message supplied by the backend, surfaced verbatim
    #[error("{0}")]
    Backend(String),

    /// Non-2xx response without a usable error body
    #[error("HTTP error! status: {0}")]
    Status(u16),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// One history entry as the backend sees it.
///
/// `ai_response` serializes as `null` while a turn is pending, so the
/// entry for the question currently being asked goes out with its
/// response field unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub user_query: String,
    pub ai_response: Option<String>,
}

/// Request body for the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub document_text: String,
    pub user_query: String,
    pub chat_history: Vec<HistoryEntry>,
}

/// Response body for the chat endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Request body for the key registration endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetKeyRequest {
    pub key_name: String,
    pub key_value: String,
}

/// Transport to the insight backend.
///
/// The production implementation speaks HTTP; tests substitute fakes.
#[async_trait]
pub trait InsightBackend: Send + Sync {
    /// Ask a question about a document, with the conversation so far
    async fn chat(&self, request: &ChatRequest) -> ApiResult<ChatResponse>;

    /// Register a session credential with the backend
    async fn set_api_key(&self, request: &SetKeyRequest) -> ApiResult<()>;
}
