//! Hourly traffic timeline.

use netwatch_types::{normalize_timeline, Filter, TimelinePoint};

use super::{decode_rows, or_empty, TelemetryAggregator, TABLE, TRANSACTIONS};
use crate::{decode, Predicate, Row, StoreError};

impl TelemetryAggregator {
    /// Requests and errors per hour, oldest first. Hours without traffic
    /// are absent.
    pub async fn traffic_timeline(&self, filter: &Filter) -> Vec<TimelinePoint> {
        or_empty("traffic_timeline", self.try_traffic_timeline(filter).await)
    }

    async fn try_traffic_timeline(&self, filter: &Filter) -> Result<Vec<TimelinePoint>, StoreError> {
        let predicate = Predicate::for_filter(filter);
        let sql = timeline_query(&predicate.where_clause());
        let rows = self.run("traffic_timeline", &sql, predicate.params()).await?;
        decode_timeline(&rows)
    }
}

/// Hour-bucketed request and error counts under a predicate.
///
/// Buckets are selected as unix seconds so the server timezone never
/// leaks into the text form.
pub(super) fn timeline_query(where_clause: &str) -> String {
    format!(
        "SELECT
    toUnixTimestamp(toStartOfHour(cal_timestamp_time)) AS hour,
    sum({TRANSACTIONS}) AS requests,
    sum(agt_failed_transactions_count) AS errors
FROM {TABLE}
{where_clause}
GROUP BY hour
ORDER BY hour"
    )
}

pub(super) fn decode_timeline(rows: &[Row]) -> Result<Vec<TimelinePoint>, StoreError> {
    let points = decode_rows(rows, |row| {
        Ok(TimelinePoint {
            bucket_start: decode::timestamp(row, "hour")?,
            request_count: decode::uint(row, "requests")?,
            error_count: decode::uint(row, "errors")?,
        })
    })?;
    Ok(normalize_timeline(points))
}
