//! JSON-RPC 2.0 server for the tool surface.
//!
//! The dispatcher here is transport agnostic: [`http`] serves it over
//! `POST /mcp`, [`stdio`] over newline-delimited stdin/stdout.
//!
//! Hosts that embed both the model and the dashboard call in as
//! [`CallerClass::App`] by default. A request may narrow itself to the
//! model's view with `"_meta": {"callerClass": "agent"}` in its params.

pub mod http;
pub mod stdio;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::resource::{UiResource, RESOURCE_URI};
use crate::tools::{CallerClass, ToolDescriptor, ToolSurface};

/// Protocol revision announced when the client does not request one.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const RESOURCE_NOT_FOUND: i64 = -32002;

/// A JSON-RPC error object.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn into_response(self, id: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": self.code, "message": self.message },
        })
    }
}

/// Routes JSON-RPC messages to the tool surface and UI resource.
#[derive(Debug, Clone)]
pub struct McpServer {
    tools: ToolSurface,
    resource: UiResource,
}

impl McpServer {
    pub fn new(tools: ToolSurface, resource: UiResource) -> Self {
        Self { tools, resource }
    }

    /// Handle one serialized message. Returns the serialized response, or
    /// `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(raw) {
            Ok(message) => self.handle(message).await?,
            Err(e) => {
                warn!(error = %e, "Unparseable JSON-RPC message");
                RpcError::new(PARSE_ERROR, format!("Parse error: {}", e)).into_response(Value::Null)
            }
        };
        Some(response.to_string())
    }

    /// Handle one decoded message.
    pub async fn handle(&self, message: Value) -> Option<Value> {
        let Value::Object(mut message) = message else {
            return Some(
                RpcError::new(INVALID_REQUEST, "Invalid request: expected an object")
                    .into_response(Value::Null),
            );
        };

        let method = match message.get("method").and_then(Value::as_str) {
            Some(method) => method.to_string(),
            None => {
                let id = message.remove("id").unwrap_or(Value::Null);
                return Some(
                    RpcError::new(INVALID_REQUEST, "Invalid request: missing method")
                        .into_response(id),
                );
            }
        };
        let params = message.remove("params").unwrap_or(Value::Null);

        // notifications carry no id and get no response
        let Some(id) = message.remove("id") else {
            debug!(method = %method, "Notification");
            return None;
        };

        debug!(method = %method, "Request");
        let response = match self.dispatch(&method, params).await {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(err) => err.into_response(id),
        };
        Some(response)
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(initialize_result(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => {
                let caller = caller_class(&params);
                let tools: Vec<Value> = self
                    .tools
                    .descriptors(caller)
                    .iter()
                    .map(ToolDescriptor::to_json)
                    .collect();
                Ok(json!({ "tools": tools }))
            }
            "tools/call" => self.call_tool(params).await,
            "resources/list" => Ok(json!({ "resources": [self.resource.descriptor()] })),
            "resources/read" => {
                let uri = params.get("uri").and_then(Value::as_str).ok_or_else(|| {
                    RpcError::new(INVALID_PARAMS, "resources/read requires a uri")
                })?;
                if uri == RESOURCE_URI {
                    Ok(self.resource.contents().await)
                } else {
                    Err(RpcError::new(
                        RESOURCE_NOT_FOUND,
                        format!("Resource not found: {}", uri),
                    ))
                }
            }
            _ => {
                warn!(method, "Unknown method");
                Err(RpcError::new(
                    METHOD_NOT_FOUND,
                    format!("Method not found: {}", method),
                ))
            }
        }
    }

    async fn call_tool(&self, params: Value) -> Result<Value, RpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::new(INVALID_PARAMS, "tools/call requires a tool name"))?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        let caller = caller_class(&params);

        match self.tools.call(caller, name, &arguments).await {
            Ok(response) => Ok(response.into_call_result()),
            Err(err) if err.is_protocol_error() => {
                Err(RpcError::new(INVALID_PARAMS, err.to_string()))
            }
            Err(err) => {
                warn!(tool = name, error = %err, "Tool call failed");
                Ok(err.into_call_result())
            }
        }
    }
}

fn caller_class(params: &Value) -> CallerClass {
    match params["_meta"]["callerClass"].as_str() {
        Some("agent") | Some("model") => CallerClass::Agent,
        _ => CallerClass::App,
    }
}

fn initialize_result(params: &Value) -> Value {
    let version = params["protocolVersion"]
        .as_str()
        .unwrap_or(PROTOCOL_VERSION);
    json!({
        "protocolVersion": version,
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": { "listChanged": false },
        },
        "serverInfo": {
            "name": "netwatch",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "instructions": "Network health monitoring dashboard with interactive visualizations",
    })
}
