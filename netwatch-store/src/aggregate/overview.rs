//! Health overview: global rollup plus the per-application breakdown.

use netwatch_types::{error_rate, ApplicationMetrics, Filter, HealthOverview, MAX_APPLICATIONS};

use super::{decode_rows, or_empty, TelemetryAggregator, TABLE, TRANSACTIONS};
use crate::{decode, Predicate, Row, StoreError};

impl TelemetryAggregator {
    /// Headline health metrics for the filter window.
    ///
    /// Returns an all-zero overview if the store fails.
    pub async fn health_overview(&self, filter: &Filter) -> HealthOverview {
        or_empty("health_overview", self.try_health_overview(filter).await)
    }

    async fn try_health_overview(&self, filter: &Filter) -> Result<HealthOverview, StoreError> {
        let predicate = Predicate::for_filter(filter);
        let where_clause = predicate.where_clause();

        let global_sql = global_query(&where_clause);
        let apps_sql = applications_query(&where_clause);

        let (global, apps) = tokio::try_join!(
            self.run("overview_global", &global_sql, predicate.params()),
            self.run("overview_applications", &apps_sql, predicate.params()),
        )?;

        let mut overview = match global.first() {
            Some(row) => decode_global(row)?,
            None => HealthOverview::default(),
        };
        overview.applications = decode_rows(&apps, decode_application)?;
        overview.rank_applications();
        Ok(overview)
    }
}

fn global_query(where_clause: &str) -> String {
    format!(
        "SELECT
    sum({TRANSACTIONS}) AS total_transactions,
    sum(agt_failed_transactions_count) AS error_count,
    sum(agt_total_response_time) / nullIf(total_transactions, 0) / 1000 AS avg_latency_ms,
    quantile(0.95)(agt_peak_response_time_usec / 1000) AS p95_latency_ms,
    uniq(client_host_ip_address) AS unique_clients,
    uniq(server_host_ip_address) AS unique_servers
FROM {TABLE}
{where_clause}"
    )
}

fn applications_query(where_clause: &str) -> String {
    format!(
        "SELECT
    application_name,
    sum({TRANSACTIONS}) AS total_transactions,
    sum(agt_failed_transactions_count) AS error_count,
    sum(agt_total_response_time) / nullIf(total_transactions, 0) / 1000 AS avg_latency_ms,
    quantile(0.95)(agt_peak_response_time_usec / 1000) AS p95_latency_ms
FROM {TABLE}
{where_clause}
GROUP BY application_name
ORDER BY total_transactions DESC
LIMIT {MAX_APPLICATIONS}"
    )
}

fn decode_global(row: &Row) -> Result<HealthOverview, StoreError> {
    let total = decode::uint(row, "total_transactions")?;
    let errors = decode::uint(row, "error_count")?;

    Ok(HealthOverview {
        total_transactions: total,
        error_count: errors,
        error_rate: error_rate(errors, total),
        avg_latency_ms: decode::float(row, "avg_latency_ms")?,
        p95_latency_ms: decode::float(row, "p95_latency_ms")?,
        unique_clients: decode::uint(row, "unique_clients")?,
        unique_servers: decode::uint(row, "unique_servers")?,
        applications: Vec::new(),
    })
}

fn decode_application(row: &Row) -> Result<ApplicationMetrics, StoreError> {
    Ok(ApplicationMetrics {
        application_name: decode::text(row, "application_name")?,
        total_transactions: decode::uint(row, "total_transactions")?,
        error_count: decode::uint(row, "error_count")?,
        avg_latency_ms: decode::float(row, "avg_latency_ms")?,
        p95_latency_ms: decode::float(row, "p95_latency_ms")?,
    })
}
