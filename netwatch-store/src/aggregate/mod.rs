//! Aggregations over `f_aggregate_telemetry`.
//!
//! Each aggregation builds its query from a shared [`Predicate`], runs its
//! independent queries concurrently and decodes the rows explicitly.
//!
//! The three dashboard aggregations ([`health_overview`], [`top_talkers`],
//! [`traffic_timeline`]) never fail: a store or decode error is logged and
//! the empty shape is returned. [`application_detail`] reports errors to the
//! caller.
//!
//! [`Predicate`]: crate::Predicate
//! [`health_overview`]: TelemetryAggregator::health_overview
//! [`top_talkers`]: TelemetryAggregator::top_talkers
//! [`traffic_timeline`]: TelemetryAggregator::traffic_timeline
//! [`application_detail`]: TelemetryAggregator::application_detail

mod drilldown;
mod overview;
mod talkers;
mod timeline;

use std::sync::Arc;

use netwatch_types::{DashboardSnapshot, Filter};
use tracing::{debug, error};

use crate::{QueryParams, Row, StoreError, TelemetryStore};

/// Fact table holding pre-aggregated flow telemetry.
pub const TABLE: &str = "f_aggregate_telemetry";

/// Transactions in a row, successful and failed.
const TRANSACTIONS: &str = "agt_successful_transactions_count + agt_failed_transactions_count";
/// Bytes in a row, both directions.
const BYTES: &str = "agt_to_server_octets_count + agt_from_server_octets_count";

/// Runs the dashboard aggregations against a store.
#[derive(Debug, Clone)]
pub struct TelemetryAggregator {
    store: Arc<dyn TelemetryStore>,
}

impl TelemetryAggregator {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TelemetryStore> {
        &self.store
    }

    /// Compute the full overview page: health, talkers and timeline run
    /// concurrently.
    pub async fn snapshot(&self, filter: &Filter) -> DashboardSnapshot {
        let (overview, talkers, timeline) = tokio::join!(
            self.health_overview(filter),
            self.top_talkers(filter),
            self.traffic_timeline(filter),
        );
        DashboardSnapshot::new(overview, talkers, timeline, filter.clone())
    }

    async fn run(
        &self,
        name: &'static str,
        sql: &str,
        params: &QueryParams,
    ) -> Result<Vec<Row>, StoreError> {
        debug!(query = name, store = self.store.description(), "Querying telemetry");
        self.store.query(sql, params).await
    }
}

/// Log a failed dashboard aggregation and fall back to its empty shape.
fn or_empty<T: Default>(aggregation: &'static str, result: Result<T, StoreError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            error!(aggregation, error = %err, "Aggregation failed, returning empty result");
            T::default()
        }
    }
}

/// Decode every row with `decode`, failing on the first malformed row.
fn decode_rows<T>(
    rows: &[Row],
    decode: impl Fn(&Row) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    rows.iter().map(decode).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDateTime;
    use serde_json::{json, Value};

    /// A timeline row as ClickHouse emits it, `hour` given as UTC text
    /// and sent as unix seconds.
    pub fn timeline_row(hour: &str, requests: u64, errors: u64) -> Value {
        let secs = NaiveDateTime::parse_from_str(hour, "%Y-%m-%d %H:%M:%S")
            .map(|t| t.and_utc().timestamp())
            .unwrap();
        json!({
            "hour": secs,
            "requests": requests.to_string(),
            "errors": errors.to_string(),
        })
    }
}
