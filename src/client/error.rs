//! Error types for the request client.
//!
//! HTTP error statuses are not errors here: a 4xx/5xx that arrives within
//! the timeout is a completed request and is returned as a response.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while issuing a request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The underlying HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The request could not be built (bad method, header or URL)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failed to connect to, or exchange data with, the upstream server
    #[error("Connection failed to '{url}': {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The attempt did not complete within the request timeout
    #[error("Request to '{url}' timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// The response head arrived but the body could not be read
    #[error("Failed to read response body from '{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Whether the error is a network-level failure that may trigger failover.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Connection { .. } | ClientError::Timeout { .. } | ClientError::Body { .. }
        )
    }

    /// Get error type string for logs
    pub fn error_type(&self) -> &'static str {
        match self {
            ClientError::Config(_) => "config_error",
            ClientError::HttpClient(_) => "http_client_error",
            ClientError::InvalidRequest(_) => "invalid_request",
            ClientError::Connection { .. } => "connection_error",
            ClientError::Timeout { .. } => "request_timeout",
            ClientError::Body { .. } => "body_error",
        }
    }
}
