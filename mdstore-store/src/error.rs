//! Error types for the store layer.

use mdstore_model::ModelError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while issuing requests or building models from
/// their responses.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure reported by a custom transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP client failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not decodable. Only raised with strict decoding.
    #[error("undecodable response body: {0}")]
    Decode(String),

    /// Model construction failed.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid store configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns the HTTP status when the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            StoreError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
