//! Error types for store access.

use thiserror::Error;

/// Errors that can occur when querying the telemetry store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The store rejected the query.
    #[error("Query failed: {0}")]
    Query(String),

    /// Rows did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// A caller supplied value was rejected before querying.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl StoreError {
    /// Shorthand for a malformed-response error about one column.
    pub(crate) fn column(column: &str, detail: impl std::fmt::Display) -> Self {
        StoreError::Malformed(format!("column `{}`: {}", column, detail))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_connect() {
            StoreError::Connection(err.to_string())
        } else if err.is_decode() {
            StoreError::Malformed(err.to_string())
        } else {
            StoreError::Http(err.to_string())
        }
    }
}
