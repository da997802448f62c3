//! Typed tool requests and responses, and their wire forms.

use netwatch_types::{ApplicationDetail, DashboardSnapshot, Filter, FilterInput};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ToolError, ToolName};
use crate::resource::ui_meta;

/// A fully validated tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    /// Full load: digest plus snapshot.
    ShowDashboard(Filter),
    /// Snapshot only.
    RefreshDashboard(Filter),
    /// One application in detail.
    ApplicationDetails { filter: Filter, application: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailArguments {
    #[serde(alias = "application_name")]
    application_name: String,
    #[serde(flatten)]
    filter: FilterInput,
}

impl ToolRequest {
    pub fn name(&self) -> ToolName {
        match self {
            ToolRequest::ShowDashboard(_) => ToolName::ShowDashboard,
            ToolRequest::RefreshDashboard(_) => ToolName::RefreshDashboard,
            ToolRequest::ApplicationDetails { .. } => ToolName::ApplicationDetails,
        }
    }

    pub fn filter(&self) -> &Filter {
        match self {
            ToolRequest::ShowDashboard(filter)
            | ToolRequest::RefreshDashboard(filter)
            | ToolRequest::ApplicationDetails { filter, .. } => filter,
        }
    }

    /// Build a request from raw call arguments, normalizing the filter
    /// with the given defaults.
    pub fn parse(
        name: ToolName,
        arguments: &Value,
        default_hours: u32,
        default_limit: u32,
    ) -> Result<Self, ToolError> {
        let arguments = match arguments {
            Value::Null => json!({}),
            Value::Object(_) => arguments.clone(),
            _ => {
                return Err(ToolError::InvalidArguments(
                    "arguments must be an object".to_string(),
                ))
            }
        };
        let invalid = |e: serde_json::Error| ToolError::InvalidArguments(e.to_string());

        Ok(match name {
            ToolName::ShowDashboard | ToolName::RefreshDashboard => {
                let input: FilterInput = serde_json::from_value(arguments).map_err(invalid)?;
                let filter = input.normalize_with(default_hours, default_limit);
                if name == ToolName::ShowDashboard {
                    ToolRequest::ShowDashboard(filter)
                } else {
                    ToolRequest::RefreshDashboard(filter)
                }
            }
            ToolName::ApplicationDetails => {
                let args: DetailArguments = serde_json::from_value(arguments).map_err(invalid)?;
                ToolRequest::ApplicationDetails {
                    filter: args.filter.normalize_with(default_hours, default_limit),
                    application: args.application_name,
                }
            }
        })
    }

    /// Arguments to send for this request over the wire.
    pub fn arguments(&self) -> Value {
        let mut arguments = serde_json::to_value(self.filter()).unwrap_or_else(|_| json!({}));
        if let ToolRequest::ApplicationDetails { application, .. } = self {
            arguments["applicationName"] = json!(application);
        }
        arguments
    }
}

/// The result of a successful tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse {
    Dashboard {
        digest: String,
        snapshot: DashboardSnapshot,
    },
    Snapshot(DashboardSnapshot),
    Detail(ApplicationDetail),
}

impl ToolResponse {
    /// The overview snapshot carried by this response, if any.
    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        match self {
            ToolResponse::Dashboard { snapshot, .. } | ToolResponse::Snapshot(snapshot) => {
                Some(snapshot)
            }
            ToolResponse::Detail(_) => None,
        }
    }

    /// Encode as a `tools/call` result.
    ///
    /// The full load leads with the digest so text-only consumers see it
    /// first; every result carries the structured payload as well.
    pub fn into_call_result(self) -> Value {
        let (digest, structured) = match self {
            ToolResponse::Dashboard { digest, snapshot } => (Some(digest), json!(snapshot)),
            ToolResponse::Snapshot(snapshot) => (None, json!(snapshot)),
            ToolResponse::Detail(detail) => (None, json!(detail)),
        };

        let mut content = Vec::with_capacity(2);
        if let Some(digest) = digest {
            content.push(json!({ "type": "text", "text": digest }));
        }
        content.push(json!({ "type": "text", "text": structured.to_string() }));

        json!({
            "content": content,
            "structuredContent": structured,
            "isError": false,
            "_meta": ui_meta(false),
        })
    }

    /// Decode a `tools/call` result for the given tool.
    pub fn from_call_result(name: ToolName, result: &Value) -> Result<Self, ToolError> {
        if result["isError"].as_bool().unwrap_or(false) {
            return Err(ToolError::Remote(first_text(result).unwrap_or_default()));
        }

        let structured = match result.get("structuredContent") {
            Some(value) => value.clone(),
            None => {
                // fall back to the last text block, which carries the payload
                let text = last_text(result).ok_or_else(|| {
                    ToolError::Remote("tool result has no content".to_string())
                })?;
                serde_json::from_str(&text).map_err(|e| ToolError::Remote(e.to_string()))?
            }
        };
        let decode_err = |e: serde_json::Error| ToolError::Remote(format!("bad payload: {}", e));

        Ok(match name {
            ToolName::ShowDashboard => ToolResponse::Dashboard {
                digest: first_text(result).unwrap_or_default(),
                snapshot: serde_json::from_value(structured).map_err(decode_err)?,
            },
            ToolName::RefreshDashboard => {
                ToolResponse::Snapshot(serde_json::from_value(structured).map_err(decode_err)?)
            }
            ToolName::ApplicationDetails => {
                ToolResponse::Detail(serde_json::from_value(structured).map_err(decode_err)?)
            }
        })
    }
}

fn texts(result: &Value) -> impl Iterator<Item = &str> {
    result["content"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|block| block["text"].as_str())
}

fn first_text(result: &Value) -> Option<String> {
    texts(result).next().map(str::to_string)
}

fn last_text(result: &Value) -> Option<String> {
    texts(result).last().map(str::to_string)
}
