use async_trait::async_trait;

use super::{ToolTransport, TransportError};
use crate::tools::{CallerClass, ToolRequest, ToolResponse, ToolSurface};

/// Calls the tool surface in-process, as the dashboard app.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    tools: ToolSurface,
}

impl LocalTransport {
    pub fn new(tools: ToolSurface) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl ToolTransport for LocalTransport {
    async fn call(&self, request: ToolRequest) -> Result<ToolResponse, TransportError> {
        Ok(self.tools.execute(CallerClass::App, request).await?)
    }

    fn description(&self) -> String {
        "in-process".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwatch_store::{ScriptedStore, StoreError, TelemetryAggregator};
    use netwatch_types::Filter;
    use std::sync::Arc;

    fn transport(store: ScriptedStore) -> LocalTransport {
        LocalTransport::new(ToolSurface::new(TelemetryAggregator::new(Arc::new(store))))
    }

    #[tokio::test]
    async fn test_app_only_tools_are_reachable() {
        let response = transport(ScriptedStore::new())
            .call(ToolRequest::RefreshDashboard(Filter::last_hours(2)))
            .await
            .unwrap();
        assert_eq!(response.snapshot().unwrap().filter.hours(), 2);
    }

    #[tokio::test]
    async fn test_detail_failure_is_tool_error() {
        let err = transport(ScriptedStore::failing(StoreError::Timeout))
            .call(ToolRequest::ApplicationDetails {
                filter: Filter::default(),
                application: "DNS".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Tool(_)));
    }
}
