//! Backend API contract for doc-insight
//!
//! Defines the wire types for the backend's two endpoints, the
//! [`InsightBackend`] transport trait, and the production HTTP
//! implementation. Front ends and tests supply their own transports by
//! implementing the trait.

pub mod base;
pub mod http;

pub use base::{
    ApiError, ApiResult, ChatRequest, ChatResponse, HistoryEntry, InsightBackend, SetKeyRequest,
};
pub use http::HttpBackend;
