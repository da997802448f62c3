//! Top talkers: client/server pairs by byte volume.

use netwatch_types::{rank_talkers, Filter, TopTalker};

use super::{decode_rows, or_empty, TelemetryAggregator, BYTES, TABLE, TRANSACTIONS};
use crate::{decode, Predicate, Row, StoreError};

impl TelemetryAggregator {
    /// The busiest client/server pairs, largest first, at most
    /// `filter.limit()` of them.
    pub async fn top_talkers(&self, filter: &Filter) -> Vec<TopTalker> {
        or_empty("top_talkers", self.try_top_talkers(filter).await)
    }

    async fn try_top_talkers(&self, filter: &Filter) -> Result<Vec<TopTalker>, StoreError> {
        let mut predicate = Predicate::for_filter(filter);
        let limit = predicate.bind_limit(filter.limit());

        let sql = format!(
            "SELECT
    client_host_ip_address AS client_ip,
    server_host_ip_address AS server_ip,
    sum({BYTES}) AS bytes,
    sum({TRANSACTIONS}) AS request_count
FROM {TABLE}
{where_clause}
GROUP BY client_host_ip_address, server_host_ip_address
ORDER BY bytes DESC
LIMIT {limit}",
            where_clause = predicate.where_clause(),
        );

        let rows = self.run("top_talkers", &sql, predicate.params()).await?;
        let mut talkers = decode_rows(&rows, decode_talker)?;
        rank_talkers(&mut talkers, filter.limit() as usize);
        Ok(talkers)
    }
}

fn decode_talker(row: &Row) -> Result<TopTalker, StoreError> {
    Ok(TopTalker {
        client_ip: decode::text(row, "client_ip")?,
        server_ip: decode::text(row, "server_ip")?,
        bytes: decode::uint(row, "bytes")?,
        request_count: decode::uint(row, "request_count")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParamValue, ScriptedStore};
    use netwatch_types::FilterInput;
    use serde_json::{json, Value};
    use std::sync::Arc;

    const TALKERS: &str = "GROUP BY client_host_ip_address, server_host_ip_address";

    fn rows(count: u64) -> Vec<Value> {
        // deliberately out of order: the store's ordering is not trusted
        (0..count)
            .map(|i| {
                json!({
                    "client_ip": format!("10.0.0.{i}"),
                    "server_ip": "10.1.0.1",
                    "bytes": ((i * 7) % count * 1000).to_string(),
                    "request_count": "3",
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_truncated_to_default_limit_largest_first() {
        let store = Arc::new(ScriptedStore::new().with_rows(TALKERS, rows(15)));
        let aggregator = TelemetryAggregator::new(store.clone());

        let talkers = aggregator.top_talkers(&Filter::default()).await;

        assert_eq!(talkers.len(), 10);
        assert_eq!(talkers[0].bytes, 14_000);
        assert!(talkers.windows(2).all(|w| w[0].bytes >= w[1].bytes));

        let params = store.recorded_params();
        assert_eq!(params[0].get("query_limit"), Some(&ParamValue::UInt32(10)));
    }

    #[tokio::test]
    async fn test_custom_limit_bound_as_param() {
        let store = Arc::new(ScriptedStore::new().with_rows(TALKERS, rows(15)));
        let aggregator = TelemetryAggregator::new(store.clone());
        let filter = FilterInput {
            result_limit: Some(3),
            ..Default::default()
        }
        .normalize();

        let talkers = aggregator.top_talkers(&filter).await;

        assert_eq!(talkers.len(), 3);
        assert_eq!(
            store.recorded_params()[0].get("query_limit"),
            Some(&ParamValue::UInt32(3))
        );
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty() {
        let store = ScriptedStore::failing(StoreError::Connection("refused".into()));
        let aggregator = TelemetryAggregator::new(Arc::new(store));
        assert!(aggregator.top_talkers(&Filter::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_bytes_degrades_to_empty() {
        let store = ScriptedStore::new().with_rows(
            TALKERS,
            vec![json!({"client_ip": "a", "server_ip": "b", "bytes": [1, 2]})],
        );
        let aggregator = TelemetryAggregator::new(Arc::new(store));
        assert!(aggregator.top_talkers(&Filter::default()).await.is_empty());
    }
}
