//! JSON-RPC over HTTP to a running `netwatch serve`.
//!
//! ```rust,no_run
//! use netwatch::client::{HttpTransport, ToolTransport};
//! use netwatch::tools::ToolRequest;
//! use netwatch_types::Filter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::builder()
//!         .endpoint("http://localhost:8002/mcp")
//!         .build();
//!
//!     let response = transport
//!         .call(ToolRequest::RefreshDashboard(Filter::last_hours(6)))
//!         .await?;
//!     println!("{:?}", response.snapshot().map(|s| s.health_overview.total_transactions));
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{ToolTransport, TransportError};
use crate::tools::{ToolRequest, ToolResponse};

const DEFAULT_ENDPOINT: &str = "http://localhost:8002/mcp";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Tool transport speaking JSON-RPC to a remote server.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        debug!(endpoint = %self.endpoint, method, id, "JSON-RPC request");

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Http(format!(
                "server returned status {}",
                response.status()
            )));
        }

        let reply: Value = response.json().await?;
        decode_reply(reply)
    }
}

fn decode_reply(mut reply: Value) -> Result<Value, TransportError> {
    if let Some(error) = reply.get("error") {
        return Err(TransportError::Rpc {
            code: error["code"].as_i64().unwrap_or_default(),
            message: error["message"].as_str().unwrap_or_default().to_string(),
        });
    }
    match reply.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(TransportError::Malformed(
            "reply has neither result nor error".to_string(),
        )),
    }
}

#[async_trait]
impl ToolTransport for HttpTransport {
    async fn call(&self, request: ToolRequest) -> Result<ToolResponse, TransportError> {
        let name = request.name();
        let result = self
            .rpc(
                "tools/call",
                json!({ "name": name.as_str(), "arguments": request.arguments() }),
            )
            .await?;
        Ok(ToolResponse::from_call_result(name, &result)?)
    }

    fn description(&self) -> String {
        self.endpoint.clone()
    }
}

/// Builder for HttpTransport.
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    /// Set the JSON-RPC endpoint (e.g., "http://localhost:8002/mcp").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout (default: 60 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> HttpTransport {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        HttpTransport {
            client,
            endpoint: self
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            next_id: AtomicU64::new(1),
        }
    }
}
