//! Application drilldown.

use chrono::Utc;
use netwatch_types::{
    error_rate, rank_clients, rank_servers, ApplicationDetail, ApplicationOverview,
    ClientMetrics, Filter, ServerMetrics, DETAIL_ROW_LIMIT,
};

use super::timeline::{decode_timeline, timeline_query};
use super::{decode_rows, TelemetryAggregator, BYTES, TABLE, TRANSACTIONS};
use crate::{decode, Predicate, Row, StoreError};

impl TelemetryAggregator {
    /// Everything known about one application in the filter window.
    ///
    /// Unlike the dashboard aggregations this reports store and decode
    /// failures. An application without traffic is not an error: the
    /// returned detail is zeroed and [`ApplicationDetail::has_data`] is
    /// false.
    pub async fn application_detail(
        &self,
        filter: &Filter,
        application: &str,
    ) -> Result<ApplicationDetail, StoreError> {
        let mut predicate = Predicate::for_filter(filter).with_application(application)?;
        let limit = predicate.bind_limit(DETAIL_ROW_LIMIT as u32);
        let where_clause = predicate.where_clause();
        let params = predicate.params();

        let overview_sql = overview_query(&where_clause);
        let clients_sql = clients_query(&where_clause, &limit);
        let servers_sql = servers_query(&where_clause, &limit);
        let timeline_sql = timeline_query(&where_clause);

        let (overview, clients, servers, timeline) = tokio::try_join!(
            self.run("detail_overview", &overview_sql, params),
            self.run("detail_clients", &clients_sql, params),
            self.run("detail_servers", &servers_sql, params),
            self.run("detail_timeline", &timeline_sql, params),
        )?;

        let overview = match overview.first() {
            Some(row) => decode_overview(row, application)?,
            None => ApplicationOverview::empty(application),
        };

        let mut top_clients = decode_rows(&clients, decode_client)?;
        rank_clients(&mut top_clients);
        let mut top_servers = decode_rows(&servers, decode_server)?;
        rank_servers(&mut top_servers);

        Ok(ApplicationDetail {
            overview,
            top_clients,
            top_servers,
            timeline: decode_timeline(&timeline)?,
            filter: filter.clone(),
            generated_at: Utc::now(),
        })
    }
}

fn overview_query(where_clause: &str) -> String {
    format!(
        "SELECT
    sum({TRANSACTIONS}) AS total_transactions,
    sum(agt_failed_transactions_count) AS error_count,
    sum(agt_total_response_time) / nullIf(total_transactions, 0) / 1000 AS avg_latency_ms,
    quantile(0.50)(agt_peak_response_time_usec / 1000) AS p50_latency_ms,
    quantile(0.95)(agt_peak_response_time_usec / 1000) AS p95_latency_ms,
    quantile(0.99)(agt_peak_response_time_usec / 1000) AS p99_latency_ms,
    sum({BYTES}) AS total_bytes,
    uniq(client_host_ip_address) AS unique_clients,
    uniq(server_host_ip_address) AS unique_servers
FROM {TABLE}
{where_clause}"
    )
}

fn clients_query(where_clause: &str, limit: &str) -> String {
    format!(
        "SELECT
    client_host_ip_address AS client_ip,
    sum({TRANSACTIONS}) AS transactions,
    sum(agt_failed_transactions_count) AS errors,
    sum({BYTES}) AS bytes
FROM {TABLE}
{where_clause}
GROUP BY client_host_ip_address
ORDER BY transactions DESC
LIMIT {limit}"
    )
}

fn servers_query(where_clause: &str, limit: &str) -> String {
    format!(
        "SELECT
    server_host_ip_address AS server_ip,
    server_port,
    sum({TRANSACTIONS}) AS transactions,
    sum(agt_total_response_time) / nullIf(transactions, 0) / 1000 AS avg_latency_ms
FROM {TABLE}
{where_clause}
GROUP BY server_host_ip_address, server_port
ORDER BY transactions DESC
LIMIT {limit}"
    )
}

fn decode_overview(row: &Row, application: &str) -> Result<ApplicationOverview, StoreError> {
    let total = decode::uint(row, "total_transactions")?;
    let errors = decode::uint(row, "error_count")?;

    Ok(ApplicationOverview {
        application_name: application.to_string(),
        total_transactions: total,
        error_count: errors,
        error_rate: error_rate(errors, total),
        avg_latency_ms: decode::float(row, "avg_latency_ms")?,
        p50_latency_ms: decode::float(row, "p50_latency_ms")?,
        p95_latency_ms: decode::float(row, "p95_latency_ms")?,
        p99_latency_ms: decode::float(row, "p99_latency_ms")?,
        total_bytes: decode::uint(row, "total_bytes")?,
        unique_clients: decode::uint(row, "unique_clients")?,
        unique_servers: decode::uint(row, "unique_servers")?,
    })
}

fn decode_client(row: &Row) -> Result<ClientMetrics, StoreError> {
    Ok(ClientMetrics {
        client_ip: decode::text(row, "client_ip")?,
        transactions: decode::uint(row, "transactions")?,
        errors: decode::uint(row, "errors")?,
        bytes: decode::uint(row, "bytes")?,
    })
}

fn decode_server(row: &Row) -> Result<ServerMetrics, StoreError> {
    Ok(ServerMetrics {
        server_ip: decode::text(row, "server_ip")?,
        server_port: decode::port(row, "server_port")?,
        transactions: decode::uint(row, "transactions")?,
        avg_latency_ms: decode::float(row, "avg_latency_ms")?,
    })
}
