//! Tool transports and the command dispatcher for the dashboard client.
//!
//! The client never talks to the store directly. Every fetch goes through
//! a [`ToolTransport`], either in-process ([`LocalTransport`]) or against
//! a running server ([`HttpTransport`]).

mod dispatcher;
mod local;
mod remote;

pub use dispatcher::Dispatcher;
pub use local::LocalTransport;
pub use remote::{HttpTransport, HttpTransportBuilder};

use async_trait::async_trait;
use thiserror::Error;

use crate::tools::{ToolError, ToolRequest, ToolResponse};

/// Errors reaching or decoding a tool.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Server could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a JSON-RPC error.
    #[error("Server error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response was not a valid JSON-RPC reply.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The tool ran and reported an error.
    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else if err.is_decode() {
            TransportError::Malformed(err.to_string())
        } else {
            TransportError::Http(err.to_string())
        }
    }
}

/// Something that can execute tool requests.
#[async_trait]
pub trait ToolTransport: Send + Sync + std::fmt::Debug {
    async fn call(&self, request: ToolRequest) -> Result<ToolResponse, TransportError>;

    /// Short description for logs and the status bar.
    fn description(&self) -> String;
}
