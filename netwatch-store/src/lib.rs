//! # netwatch-store
//!
//! Telemetry access for netwatch: a [`TelemetryStore`] abstraction, the
//! ClickHouse HTTP implementation, the parameterized query builder and the
//! dashboard aggregations.
//!
//! ## Quick Start
//!
//! ```rust
//! use netwatch_store::{ScriptedStore, TelemetryAggregator};
//! use netwatch_types::Filter;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let store = ScriptedStore::new().with_rows(
//!     "uniq(client_host_ip_address)",
//!     vec![json!({"total_transactions": "1000", "error_count": "20"})],
//! );
//! let aggregator = TelemetryAggregator::new(Arc::new(store));
//!
//! let overview = aggregator.health_overview(&Filter::default()).await;
//! assert_eq!(overview.error_rate, 2.0);
//! # });
//! ```

pub mod aggregate;
pub mod clickhouse;
pub mod decode;
pub mod error;
pub mod query;
pub mod store;

pub use aggregate::TelemetryAggregator;
pub use clickhouse::{ClickHouseConfig, ClickHouseStore, ClickHouseStoreBuilder};
pub use error::StoreError;
pub use query::{ParamValue, Predicate, QueryParams};
pub use store::{Row, ScriptedStore, TelemetryStore};
