//! Store abstraction.
//!
//! Aggregations talk to a [`TelemetryStore`]; the ClickHouse store is the
//! production implementation and [`ScriptedStore`] answers from canned rows.

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::{QueryParams, StoreError};

/// One result row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// A read-only source of aggregate telemetry rows.
#[async_trait]
pub trait TelemetryStore: Send + Sync + Debug {
    /// Run a parameterized query and return its rows.
    async fn query(&self, sql: &str, params: &QueryParams) -> Result<Vec<Row>, StoreError>;

    /// Human-readable description of where rows come from.
    fn description(&self) -> &str;
}

#[derive(Debug, Clone)]
struct Script {
    fragment: String,
    response: Result<Vec<Row>, StoreError>,
}

/// An in-memory store that answers by matching SQL fragments.
///
/// The first registered fragment contained in the query text wins. A query
/// matching nothing returns no rows.
///
/// ```rust
/// use netwatch_store::{QueryParams, ScriptedStore, StoreError, TelemetryStore};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let store = ScriptedStore::new()
///     .with_rows("GROUP BY application_name", vec![json!({"application_name": "DNS"})])
///     .with_error("toStartOfHour", StoreError::Timeout);
///
/// let rows = store
///     .query("SELECT ... GROUP BY application_name", &QueryParams::new())
///     .await
///     .unwrap();
/// assert_eq!(rows.len(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct ScriptedStore {
    scripts: Vec<Script>,
    calls: AtomicUsize,
    last_params: Mutex<Vec<QueryParams>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries containing `fragment` with these rows.
    ///
    /// Values that are not JSON objects are skipped.
    pub fn with_rows(mut self, fragment: impl Into<String>, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.scripts.push(Script {
            fragment: fragment.into(),
            response: Ok(rows),
        });
        self
    }

    /// Fail queries containing `fragment` with this error.
    pub fn with_error(mut self, fragment: impl Into<String>, error: StoreError) -> Self {
        self.scripts.push(Script {
            fragment: fragment.into(),
            response: Err(error),
        });
        self
    }

    /// Fail every query with this error.
    pub fn failing(error: StoreError) -> Self {
        Self::new().with_error("", error)
    }

    /// Number of queries answered so far.
    pub fn query_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Parameter tables seen so far, in call order.
    pub fn recorded_params(&self) -> Vec<QueryParams> {
        self.last_params.lock().clone()
    }
}

#[async_trait]
impl TelemetryStore for ScriptedStore {
    async fn query(&self, sql: &str, params: &QueryParams) -> Result<Vec<Row>, StoreError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.last_params.lock().push(params.clone());

        self.scripts
            .iter()
            .find(|script| sql.contains(&script.fragment))
            .map(|script| script.response.clone())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn description(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParamValue;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_match_wins() {
        let store = ScriptedStore::new()
            .with_rows("FROM a", vec![json!({"n": 1})])
            .with_rows("FROM", vec![json!({"n": 2}), json!({"n": 3})]);

        let rows = store.query("SELECT n FROM a", &QueryParams::new()).await.unwrap();
        assert_eq!(rows.len(), 1);

        let rows = store.query("SELECT n FROM b", &QueryParams::new()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(store.query_count(), 2);
    }

    #[tokio::test]
    async fn test_unmatched_query_is_empty() {
        let store = ScriptedStore::new().with_rows("FROM a", vec![json!({"n": 1})]);
        let rows = store.query("SELECT 1", &QueryParams::new()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = ScriptedStore::failing(StoreError::Query("boom".into()));
        let err = store.query("SELECT 1", &QueryParams::new()).await.unwrap_err();
        assert_eq!(err, StoreError::Query("boom".into()));
    }

    #[tokio::test]
    async fn test_records_params() {
        let store = ScriptedStore::new();
        let mut params = QueryParams::new();
        params.bind("query_limit", ParamValue::UInt32(3));

        store.query("SELECT 1", &params).await.unwrap();

        let recorded = store.recorded_params();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].get("query_limit"), Some(&ParamValue::UInt32(3)));
    }
}
