//! Health overview - the headline numbers of the dashboard.

use serde::{Deserialize, Serialize};

use crate::error_rate;

/// Maximum number of applications carried in a [`HealthOverview`].
pub const MAX_APPLICATIONS: usize = 20;

/// Overall health metrics and the per-application breakdown.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOverview {
    pub total_transactions: u64,
    pub error_count: u64,
    /// Percentage of failed transactions in `[0, 100]`.
    pub error_rate: f64,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub unique_clients: u64,
    pub unique_servers: u64,
    /// Ordered by `total_transactions`, busiest first.
    pub applications: Vec<ApplicationMetrics>,
}

impl HealthOverview {
    /// Overview carrying only transaction totals, with the error rate derived.
    pub fn from_totals(total_transactions: u64, error_count: u64) -> Self {
        Self {
            total_transactions,
            error_count,
            error_rate: error_rate(error_count, total_transactions),
            ..Default::default()
        }
    }

    /// True when the window saw no traffic at all.
    pub fn is_empty(&self) -> bool {
        self.total_transactions == 0 && self.applications.is_empty()
    }

    /// Sort applications busiest first and cap them at [`MAX_APPLICATIONS`].
    ///
    /// The sort is stable so equal volumes keep the store's order.
    pub fn rank_applications(&mut self) {
        self.applications
            .sort_by(|a, b| b.total_transactions.cmp(&a.total_transactions));
        self.applications.truncate(MAX_APPLICATIONS);
    }
}

/// Per-application rollup inside the time window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationMetrics {
    pub application_name: String,
    pub total_transactions: u64,
    pub error_count: u64,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
}

impl ApplicationMetrics {
    /// Share of failed transactions for this application.
    pub fn error_rate(&self) -> f64 {
        error_rate(self.error_count, self.total_transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str, total: u64) -> ApplicationMetrics {
        ApplicationMetrics {
            application_name: name.to_string(),
            total_transactions: total,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_totals() {
        let overview = HealthOverview::from_totals(1000, 20);
        assert_eq!(overview.error_rate, 2.0);

        let empty = HealthOverview::from_totals(0, 0);
        assert_eq!(empty.error_rate, 0.0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_rank_applications() {
        let mut overview = HealthOverview::default();
        overview.applications = (0..30).map(|i| app(&format!("app-{i}"), i)).collect();

        overview.rank_applications();

        assert_eq!(overview.applications.len(), MAX_APPLICATIONS);
        assert_eq!(overview.applications[0].total_transactions, 29);
        assert!(overview
            .applications
            .windows(2)
            .all(|w| w[0].total_transactions >= w[1].total_transactions));
    }

    #[test]
    fn test_application_error_rate() {
        let mut http = app("HTTP", 200);
        http.error_count = 5;
        assert_eq!(http.error_rate(), 2.5);
        assert_eq!(app("DNS", 0).error_rate(), 0.0);
    }

    #[test]
    fn test_serialize_camel_case() {
        let overview = HealthOverview {
            applications: vec![app("HTTPS", 10)],
            ..HealthOverview::from_totals(10, 1)
        };
        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["totalTransactions"], 10);
        assert_eq!(json["errorRate"], 10.0);
        assert_eq!(json["applications"][0]["applicationName"], "HTTPS");
    }
}
