//! Application drilldown - everything known about one application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Filter, TimelinePoint};

/// Row cap for the top clients and top servers lists.
pub const DETAIL_ROW_LIMIT: usize = 10;

/// Detail view for a single application within the filter window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    pub overview: ApplicationOverview,
    /// Busiest clients first.
    pub top_clients: Vec<ClientMetrics>,
    /// Busiest servers first.
    pub top_servers: Vec<ServerMetrics>,
    pub timeline: Vec<TimelinePoint>,
    pub filter: Filter,
    pub generated_at: DateTime<Utc>,
}

impl ApplicationDetail {
    /// Whether any traffic for the application was found in the window.
    ///
    /// A detail without data is a valid answer, not an error: the
    /// application simply was not observed.
    pub fn has_data(&self) -> bool {
        self.overview.total_transactions > 0
            || !self.top_clients.is_empty()
            || !self.top_servers.is_empty()
            || !self.timeline.is_empty()
    }

    /// Name of the application this detail describes.
    pub fn application_name(&self) -> &str {
        &self.overview.application_name
    }
}

/// Scoped rollup for one application, with a wider latency distribution
/// than the dashboard overview.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationOverview {
    pub application_name: String,
    pub total_transactions: u64,
    pub error_count: u64,
    pub error_rate: f64,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub total_bytes: u64,
    pub unique_clients: u64,
    pub unique_servers: u64,
}

impl ApplicationOverview {
    /// An all-zero overview for the named application.
    pub fn empty(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            ..Default::default()
        }
    }
}

/// Client activity towards one application.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMetrics {
    pub client_ip: String,
    pub transactions: u64,
    pub errors: u64,
    pub bytes: u64,
}

/// A server endpoint serving one application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMetrics {
    pub server_ip: String,
    pub server_port: u16,
    pub transactions: u64,
    pub avg_latency_ms: f64,
}

/// Sort clients busiest first and cap at [`DETAIL_ROW_LIMIT`].
pub fn rank_clients(clients: &mut Vec<ClientMetrics>) {
    clients.sort_by(|a, b| b.transactions.cmp(&a.transactions));
    clients.truncate(DETAIL_ROW_LIMIT);
}

/// Sort servers busiest first and cap at [`DETAIL_ROW_LIMIT`].
pub fn rank_servers(servers: &mut Vec<ServerMetrics>) {
    servers.sort_by(|a, b| b.transactions.cmp(&a.transactions));
    servers.truncate(DETAIL_ROW_LIMIT);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_detail(name: &str) -> ApplicationDetail {
        ApplicationDetail {
            overview: ApplicationOverview::empty(name),
            top_clients: Vec::new(),
            top_servers: Vec::new(),
            timeline: Vec::new(),
            filter: Filter::default(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_detail_has_no_data() {
        let detail = empty_detail("SMB");
        assert!(!detail.has_data());
        assert_eq!(detail.application_name(), "SMB");
    }

    #[test]
    fn test_detail_with_clients_has_data() {
        let mut detail = empty_detail("SMB");
        detail.top_clients.push(ClientMetrics {
            client_ip: "10.0.0.1".into(),
            transactions: 1,
            ..Default::default()
        });
        assert!(detail.has_data());
    }

    #[test]
    fn test_rank_servers() {
        let mut servers: Vec<ServerMetrics> = (0..12)
            .map(|i| ServerMetrics {
                server_ip: format!("10.9.0.{i}"),
                server_port: 443,
                transactions: i,
                avg_latency_ms: 1.0,
            })
            .collect();

        rank_servers(&mut servers);

        assert_eq!(servers.len(), DETAIL_ROW_LIMIT);
        assert_eq!(servers[0].transactions, 11);
    }

    #[test]
    fn test_detail_json_shape() {
        let json = serde_json::to_value(empty_detail("LDAP")).unwrap();
        assert_eq!(json["overview"]["applicationName"], "LDAP");
        assert_eq!(json["overview"]["p99LatencyMs"], 0.0);
        assert!(json["topClients"].as_array().unwrap().is_empty());
        assert_eq!(json["filter"]["timeWindowHours"], 24);
    }
}
