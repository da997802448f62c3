//! ClickHouse store using the HTTP interface.
//!
//! Queries are sent as `POST` bodies with `FORMAT JSONEachRow` appended;
//! bound parameters travel in the query string as `param_<name>` and the
//! server substitutes them into the `{name:Type}` placeholders. Every
//! request carries `readonly=1`.
//!
//! The HTTP client is created lazily on first use and shared by every
//! subsequent query until [`ClickHouseStore::close`] releases it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use netwatch_store::{ClickHouseStore, TelemetryAggregator};
//! use netwatch_types::Filter;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = ClickHouseStore::builder()
//!         .url("http://clickhouse.internal:8123")
//!         .database("omnis")
//!         .credentials("reader", "secret")
//!         .timeout(Duration::from_secs(10))
//!         .build();
//!
//!     let aggregator = TelemetryAggregator::new(Arc::new(store));
//!     let overview = aggregator.health_overview(&Filter::default()).await;
//!     println!("{} transactions", overview.total_transactions);
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::{QueryParams, Row, StoreError, TelemetryStore};

/// Default HTTP endpoint.
pub const DEFAULT_URL: &str = "http://localhost:8123";
/// Default database holding `f_aggregate_telemetry`.
pub const DEFAULT_DATABASE: &str = "omnis";
/// Default user.
pub const DEFAULT_USERNAME: &str = "default";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings, fixed for the lifetime of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickHouseConfig {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A live HTTP client bound to one endpoint.
#[derive(Debug)]
pub struct Connection {
    client: Client,
    endpoint: String,
}

/// ClickHouse-backed [`TelemetryStore`].
#[derive(Debug)]
pub struct ClickHouseStore {
    config: ClickHouseConfig,
    description: String,
    connection: Mutex<Option<Arc<Connection>>>,
}

impl ClickHouseStore {
    /// Create a new builder for configuring the store.
    pub fn builder() -> ClickHouseStoreBuilder {
        ClickHouseStoreBuilder::default()
    }

    /// Create a store from complete settings.
    pub fn new(config: ClickHouseConfig) -> Self {
        let description = format!(
            "clickhouse {}/{}",
            config.url.trim_end_matches('/'),
            config.database
        );
        Self {
            config,
            description,
            connection: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }

    /// Get the shared connection, creating it on first use.
    ///
    /// Creation happens under the lock, so concurrent first callers all
    /// receive the same connection.
    pub fn connection(&self) -> Result<Arc<Connection>, StoreError> {
        let mut slot = self.connection.lock();
        if let Some(conn) = slot.as_ref() {
            return Ok(Arc::clone(conn));
        }

        let client = Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!(url = %self.config.url, database = %self.config.database, "Connected to ClickHouse");

        let conn = Arc::new(Connection {
            client,
            endpoint: format!("{}/", self.config.url.trim_end_matches('/')),
        });
        *slot = Some(Arc::clone(&conn));
        Ok(conn)
    }

    /// Whether a connection has been created and not yet closed.
    pub fn is_connected(&self) -> bool {
        self.connection.lock().is_some()
    }

    /// Release the shared connection. A later query reconnects.
    pub fn close(&self) {
        if self.connection.lock().take().is_some() {
            info!("Closed ClickHouse connection");
        }
    }

    fn query_string(&self, params: &QueryParams) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("database".to_string(), self.config.database.clone()),
            ("readonly".to_string(), "1".to_string()),
        ];
        pairs.extend(
            params
                .iter()
                .map(|(name, value)| (format!("param_{}", name), value.to_string())),
        );
        pairs
    }
}

#[async_trait]
impl TelemetryStore for ClickHouseStore {
    async fn query(&self, sql: &str, params: &QueryParams) -> Result<Vec<Row>, StoreError> {
        let conn = self.connection()?;
        let body = format!("{}\nFORMAT JSONEachRow", sql.trim_end());

        debug!(params = params.len(), "Running ClickHouse query");

        let response = conn
            .client
            .post(&conn.endpoint)
            .query(&self.query_string(params))
            .header("X-ClickHouse-User", &self.config.username)
            .header("X-ClickHouse-Key", &self.config.password)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        check_status(status, &text)?;
        parse_rows(&text)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

fn check_status(status: StatusCode, body: &str) -> Result<(), StoreError> {
    if status.is_success() {
        return Ok(());
    }

    let message = body.trim();
    let message = if message.is_empty() {
        format!("server returned status {}", status)
    } else {
        message.to_string()
    };

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || message.contains("AUTHENTICATION_FAILED")
    {
        Err(StoreError::Auth(message))
    } else {
        Err(StoreError::Query(message))
    }
}

/// Parse a `JSONEachRow` body: one JSON object per line.
pub(crate) fn parse_rows(body: &str) -> Result<Vec<Row>, StoreError> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::Malformed(format!(
                "row {} is not a JSON object",
                index
            ))),
            Err(e) => Err(StoreError::Malformed(format!("row {}: {}", index, e))),
        })
        .collect()
}

/// Builder for [`ClickHouseStore`].
#[derive(Debug, Default)]
pub struct ClickHouseStoreBuilder {
    url: Option<String>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<Duration>,
}

impl ClickHouseStoreBuilder {
    /// Set the HTTP endpoint (e.g., "http://localhost:8123").
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the database (default: "omnis").
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the username and password.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the store. No connection is made until the first query.
    pub fn build(self) -> ClickHouseStore {
        let defaults = ClickHouseConfig::default();
        ClickHouseStore::new(ClickHouseConfig {
            url: self.url.unwrap_or(defaults.url),
            database: self.database.unwrap_or(defaults.database),
            username: self.username.unwrap_or(defaults.username),
            password: self.password.unwrap_or(defaults.password),
            timeout: self.timeout.unwrap_or(defaults.timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParamValue;

    #[test]
    fn test_builder_defaults() {
        let store = ClickHouseStore::builder().build();
        assert_eq!(store.config(), &ClickHouseConfig::default());
        assert_eq!(store.config().url, "http://localhost:8123");
        assert_eq!(store.config().database, "omnis");
        assert_eq!(store.config().username, "default");
        assert_eq!(store.config().timeout, Duration::from_secs(30));
        assert!(!store.is_connected());
    }

    #[test]
    fn test_builder_custom() {
        let store = ClickHouseStore::builder()
            .url("http://ch.local:8123/")
            .database("flows")
            .credentials("reader", "secret")
            .timeout(Duration::from_secs(5))
            .build();

        assert_eq!(store.config().database, "flows");
        assert_eq!(store.config().password, "secret");
        assert_eq!(store.description(), "clickhouse http://ch.local:8123/flows");
    }

    #[test]
    fn test_connection_is_single_flight() {
        let store = Arc::new(ClickHouseStore::builder().build());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.connection().unwrap())
            })
            .collect();
        let conns: Vec<Arc<Connection>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(conns.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(conns[0].endpoint, "http://localhost:8123/");
        assert!(store.is_connected());
    }

    #[test]
    fn test_close_releases_connection() {
        let store = ClickHouseStore::builder().build();
        let first = store.connection().unwrap();

        store.close();
        assert!(!store.is_connected());

        let second = store.connection().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_query_string_carries_params() {
        let store = ClickHouseStore::builder().database("flows").build();
        let mut params = QueryParams::new();
        params.bind("filter_hours", ParamValue::UInt32(6));
        params.bind("filter_sensor_ip", ParamValue::String("10.0.0.1".into()));

        let pairs = store.query_string(&params);

        assert_eq!(pairs[0], ("database".to_string(), "flows".to_string()));
        assert_eq!(pairs[1], ("readonly".to_string(), "1".to_string()));
        assert!(pairs.contains(&("param_filter_hours".to_string(), "6".to_string())));
        assert!(pairs.contains(&("param_filter_sensor_ip".to_string(), "10.0.0.1".to_string())));
    }

    #[test]
    fn test_parse_rows() {
        let body = "{\"a\":1}\n\n{\"a\":\"2\"}\n";
        let rows = parse_rows(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["a"], "2");

        assert!(parse_rows("").unwrap().is_empty());
        assert!(matches!(parse_rows("[1,2]"), Err(StoreError::Malformed(_))));
        assert!(matches!(parse_rows("{oops"), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK, "").is_ok());
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, ""),
            Err(StoreError::Auth(_))
        ));
        assert!(matches!(
            check_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Code: 516. DB::Exception: default: Authentication failed. (AUTHENTICATION_FAILED)"
            ),
            Err(StoreError::Auth(_))
        ));
        assert_eq!(
            check_status(StatusCode::BAD_REQUEST, "Code: 62. Syntax error\n"),
            Err(StoreError::Query("Code: 62. Syntax error".to_string()))
        );
    }
}
