//! Error types for the position cache service
//!
//! Cache-layer errors (`StoreError`, `DecodeError`) never reach a caller; they
//! are absorbed by the cache-aside policy. Only `LoadError` from the source of
//! truth and the HTTP-facing `ServiceError` are visible.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error ==
/// Failure talking to the key-value store (cache unavailable).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend reported an error or the connection failed
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Stored value had an unexpected shape (e.g. INCR on a non-integer)
    #[error("Store protocol error: {0}")]
    Protocol(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

// == Decode Error ==
/// Cached bytes could not be turned back into a record.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed envelope: {0}")]
    Envelope(String),

    #[error("Invalid field `{field}`: {reason}")]
    Field { field: &'static str, reason: String },

    #[error("Empty payload for a single record")]
    Empty,
}

impl From<prost::DecodeError> for DecodeError {
    fn from(err: prost::DecodeError) -> Self {
        DecodeError::Envelope(err.to_string())
    }
}

// == Encode Error ==
/// A record that cannot be represented in the binary envelope.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Amount {0} does not fit the scaled integer range")]
    AmountOutOfRange(rust_decimal::Decimal),
}

// == Load Error ==
/// Failure reported by the source of truth.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Source error: {0}")]
    Source(String),
}

// == Service Error ==
/// Errors surfaced to HTTP callers.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Requested record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Fixed-window limit exhausted for this client
    #[error("Too many requests.")]
    RateLimited,

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable code for the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::InvalidRequest(_) => "VALIDATION_ERROR",
            ServiceError::RateLimited => "RATE_LIMITED",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LoadError> for ServiceError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotFound(msg) => ServiceError::NotFound(msg),
            LoadError::Source(msg) => ServiceError::Internal(msg),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "code": self.code(),
            "message": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for request handlers and the service layer.
pub type Result<T> = std::result::Result<T, ServiceError>;
