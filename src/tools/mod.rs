//! The tool surface: three operations over the telemetry aggregations.
//!
//! | Tool | Visible to | Returns |
//! |------|------------|---------|
//! | `show_network_dashboard` | model and app | digest, then snapshot |
//! | `refresh_dashboard_data` | app only | snapshot |
//! | `get_application_details` | app only | application detail |
//!
//! Visibility is enforced here, not only advertised: a
//! [`CallerClass::Agent`] caller neither lists nor invokes app-only tools.

mod request;
pub mod schema;
pub mod summary;

pub use request::{ToolRequest, ToolResponse};

use netwatch_store::{StoreError, TelemetryAggregator};
use netwatch_types::{DEFAULT_HOURS, DEFAULT_LIMIT};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::resource::ui_meta;

/// Who is invoking a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallerClass {
    /// The conversational model.
    Agent,
    /// The embedded dashboard UI.
    App,
}

/// Which callers may see a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    ModelAndApp,
    AppOnly,
}

impl Visibility {
    pub fn allows(self, caller: CallerClass) -> bool {
        match self {
            Visibility::ModelAndApp => true,
            Visibility::AppOnly => caller == CallerClass::App,
        }
    }
}

/// The tools this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ShowDashboard,
    RefreshDashboard,
    ApplicationDetails,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [
        ToolName::ShowDashboard,
        ToolName::RefreshDashboard,
        ToolName::ApplicationDetails,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::ShowDashboard => "show_network_dashboard",
            ToolName::RefreshDashboard => "refresh_dashboard_data",
            ToolName::ApplicationDetails => "get_application_details",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    pub fn visibility(self) -> Visibility {
        match self {
            ToolName::ShowDashboard => Visibility::ModelAndApp,
            ToolName::RefreshDashboard | ToolName::ApplicationDetails => Visibility::AppOnly,
        }
    }

    fn title(self) -> &'static str {
        match self {
            ToolName::ShowDashboard => "Network Health Dashboard",
            ToolName::RefreshDashboard => "Refresh Dashboard Data",
            ToolName::ApplicationDetails => "Application Details",
        }
    }

    fn description(self) -> &'static str {
        match self {
            ToolName::ShowDashboard => {
                "Display an interactive network health dashboard showing overall metrics, \
                 application breakdown, top talkers, and traffic trends. Use this when the \
                 user wants to see network status, health overview, or traffic visualization."
            }
            ToolName::RefreshDashboard => "Refresh network health dashboard data",
            ToolName::ApplicationDetails => "Get detailed metrics for a specific application",
        }
    }
}

/// A tool as published by `tools/list`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: ToolName,
    pub visibility: Visibility,
}

impl ToolDescriptor {
    pub fn to_json(&self) -> Value {
        let input_schema = match self.name {
            ToolName::ApplicationDetails => schema::detail_schema(),
            _ => schema::filter_schema(),
        };
        json!({
            "name": self.name.as_str(),
            "title": self.name.title(),
            "description": self.name.description(),
            "inputSchema": input_schema,
            "_meta": ui_meta(self.visibility == Visibility::AppOnly),
        })
    }
}

/// Errors from tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool not available to this caller: {0}")]
    NotVisible(&'static str),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Failed to load details for {application}: {source}")]
    Detail {
        application: String,
        #[source]
        source: StoreError,
    },

    /// An error reported by a remote tool server.
    #[error("{0}")]
    Remote(String),
}

impl ToolError {
    /// Whether this error is about the call itself rather than its outcome.
    ///
    /// Protocol errors become JSON-RPC errors; the rest become tool results
    /// flagged with `isError`.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, ToolError::UnknownTool(_) | ToolError::NotVisible(_))
    }

    /// Encode as a `tools/call` result with `isError` set.
    pub fn into_call_result(self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.to_string() }],
            "isError": true,
            "_meta": ui_meta(false),
        })
    }
}

/// Executes tool calls against the aggregations.
#[derive(Debug, Clone)]
pub struct ToolSurface {
    aggregator: TelemetryAggregator,
    default_hours: u32,
    default_limit: u32,
}

impl ToolSurface {
    pub fn new(aggregator: TelemetryAggregator) -> Self {
        Self {
            aggregator,
            default_hours: DEFAULT_HOURS,
            default_limit: DEFAULT_LIMIT,
        }
    }

    /// Use deployment specific defaults for absent filter fields.
    pub fn with_defaults(mut self, default_hours: u32, default_limit: u32) -> Self {
        self.default_hours = default_hours;
        self.default_limit = default_limit;
        self
    }

    /// Tools visible to `caller`.
    pub fn descriptors(&self, caller: CallerClass) -> Vec<ToolDescriptor> {
        ToolName::ALL
            .into_iter()
            .filter(|tool| tool.visibility().allows(caller))
            .map(|name| ToolDescriptor {
                name,
                visibility: name.visibility(),
            })
            .collect()
    }

    /// Resolve and validate a raw call.
    pub fn parse(
        &self,
        caller: CallerClass,
        name: &str,
        arguments: &Value,
    ) -> Result<ToolRequest, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        check_visible(caller, tool)?;
        ToolRequest::parse(tool, arguments, self.default_hours, self.default_limit)
    }

    /// Parse and execute a raw call.
    pub async fn call(
        &self,
        caller: CallerClass,
        name: &str,
        arguments: &Value,
    ) -> Result<ToolResponse, ToolError> {
        let request = self.parse(caller, name, arguments)?;
        self.execute(caller, request).await
    }

    /// Execute a validated request.
    pub async fn execute(
        &self,
        caller: CallerClass,
        request: ToolRequest,
    ) -> Result<ToolResponse, ToolError> {
        check_visible(caller, request.name())?;

        info!(
            tool = request.name().as_str(),
            hours = request.filter().hours(),
            sensor_ip = request.filter().sensor_ip().unwrap_or("*"),
            sensor_name = request.filter().sensor_name().unwrap_or("*"),
            "Tool call"
        );

        match request {
            ToolRequest::ShowDashboard(filter) => {
                let snapshot = self.aggregator.snapshot(&filter).await;
                let digest = summary::digest(
                    &snapshot.health_overview,
                    &snapshot.top_talkers,
                    &snapshot.filter,
                );
                Ok(ToolResponse::Dashboard { digest, snapshot })
            }
            ToolRequest::RefreshDashboard(filter) => {
                Ok(ToolResponse::Snapshot(self.aggregator.snapshot(&filter).await))
            }
            ToolRequest::ApplicationDetails {
                filter,
                application,
            } => match self.aggregator.application_detail(&filter, &application).await {
                Ok(detail) => Ok(ToolResponse::Detail(detail)),
                Err(source) => Err(ToolError::Detail {
                    application,
                    source,
                }),
            },
        }
    }
}

fn check_visible(caller: CallerClass, tool: ToolName) -> Result<(), ToolError> {
    if tool.visibility().allows(caller) {
        Ok(())
    } else {
        warn!(tool = tool.as_str(), ?caller, "Rejected call to hidden tool");
        Err(ToolError::NotVisible(tool.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwatch_store::ScriptedStore;
    use serde_json::json;
    use std::sync::Arc;

    fn surface(store: ScriptedStore) -> ToolSurface {
        ToolSurface::new(TelemetryAggregator::new(Arc::new(store)))
    }

    fn busy_store() -> ScriptedStore {
        ScriptedStore::new()
            .with_rows(
                "uniq(client_host_ip_address)",
                vec![json!({"total_transactions": "1000", "error_count": "20"})],
            )
            .with_rows(
                "GROUP BY application_name",
                vec![json!({"application_name": "HTTPS", "total_transactions": "900"})],
            )
    }

    #[test]
    fn test_agent_sees_only_dashboard() {
        let surface = surface(ScriptedStore::new());

        let agent: Vec<_> = surface
            .descriptors(CallerClass::Agent)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(agent, vec![ToolName::ShowDashboard]);

        assert_eq!(surface.descriptors(CallerClass::App).len(), 3);
    }

    #[test]
    fn test_descriptor_meta() {
        let surface = surface(ScriptedStore::new());
        let tools: Vec<Value> = surface
            .descriptors(CallerClass::App)
            .iter()
            .map(ToolDescriptor::to_json)
            .collect();

        assert_eq!(tools[0]["name"], "show_network_dashboard");
        assert!(tools[0]["_meta"]["ui"].get("visibility").is_none());
        assert_eq!(tools[1]["_meta"]["ui"]["visibility"], json!(["app"]));
        assert_eq!(tools[2]["inputSchema"]["required"][0], "applicationName");
    }

    #[tokio::test]
    async fn test_agent_cannot_invoke_app_only_tools() {
        let store = Arc::new(ScriptedStore::new());
        let surface = ToolSurface::new(TelemetryAggregator::new(store.clone()));

        for name in ["refresh_dashboard_data", "get_application_details"] {
            let err = surface
                .call(CallerClass::Agent, name, &json!({"applicationName": "DNS"}))
                .await
                .unwrap_err();
            assert!(matches!(err, ToolError::NotVisible(_)));
            assert!(err.is_protocol_error());
        }
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = surface(ScriptedStore::new())
            .call(CallerClass::App, "drop_tables", &Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn test_full_load_returns_digest_and_snapshot() {
        let response = surface(busy_store())
            .call(CallerClass::Agent, "show_network_dashboard", &json!({"timeWindowHours": 6}))
            .await
            .unwrap();

        match response {
            ToolResponse::Dashboard { digest, snapshot } => {
                assert!(digest.contains("last 6 hours"));
                assert!(digest.contains("2.00%"));
                assert!(digest.contains("1. HTTPS"));
                assert_eq!(snapshot.health_overview.error_rate, 2.0);
                assert_eq!(snapshot.filter.hours(), 6);
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_returns_snapshot_only() {
        let response = surface(busy_store())
            .call(CallerClass::App, "refresh_dashboard_data", &Value::Null)
            .await
            .unwrap();
        assert!(matches!(response, ToolResponse::Snapshot(_)));
    }

    #[tokio::test]
    async fn test_refresh_degrades_when_store_fails() {
        let store = ScriptedStore::failing(StoreError::Timeout);
        let response = surface(store)
            .call(CallerClass::App, "refresh_dashboard_data", &Value::Null)
            .await
            .unwrap();

        let snapshot = response.snapshot().unwrap();
        assert_eq!(snapshot.health_overview.total_transactions, 0);
        assert!(snapshot.top_talkers.is_empty());
    }

    #[tokio::test]
    async fn test_drilldown_failure_is_tool_error() {
        let store = ScriptedStore::failing(StoreError::Query("table missing".into()));
        let err = surface(store)
            .call(
                CallerClass::App,
                "get_application_details",
                &json!({"applicationName": "DNS"}),
            )
            .await
            .unwrap_err();

        assert!(!err.is_protocol_error());
        let result = err.into_call_result();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "Failed to load details for DNS: Query failed: table missing"
        );
    }

    #[tokio::test]
    async fn test_drilldown_without_rows_is_empty_detail() {
        let response = surface(ScriptedStore::new())
            .call(
                CallerClass::App,
                "get_application_details",
                &json!({"applicationName": "Gopher", "timeWindowHours": 2}),
            )
            .await
            .unwrap();

        match response {
            ToolResponse::Detail(detail) => {
                assert!(!detail.has_data());
                assert_eq!(detail.filter.hours(), 2);
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deployment_defaults_apply() {
        let response = surface(ScriptedStore::new())
            .with_defaults(6, 5)
            .call(CallerClass::App, "refresh_dashboard_data", &json!({}))
            .await
            .unwrap();
        let filter = &response.snapshot().unwrap().filter;
        assert_eq!(filter.hours(), 6);
        assert_eq!(filter.limit(), 5);
    }
}
