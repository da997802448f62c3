//! Parameterized predicates for telemetry queries.
//!
//! This is the only place where filter values meet query text, and they
//! never actually meet: the predicate only ever contains fixed column names
//! and ClickHouse `{name:Type}` placeholders, while the values travel in a
//! separate [`QueryParams`] table that the store sends out of band.
//!
//! ```rust
//! use netwatch_store::Predicate;
//! use netwatch_types::Filter;
//!
//! let filter = Filter::last_hours(6).with_sensor_ip(Some("10.0.0.9".into()));
//! let predicate = Predicate::for_filter(&filter);
//!
//! assert_eq!(
//!     predicate.where_clause(),
//!     "WHERE cal_timestamp_time >= now() - INTERVAL {filter_hours:UInt32} HOUR \
//!      AND device_ip_address = {filter_sensor_ip:String}"
//! );
//! assert!(!predicate.where_clause().contains("10.0.0.9"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use netwatch_types::Filter;

use crate::StoreError;

/// Bound parameter names. These are the only names a query may bind.
pub const PARAM_HOURS: &str = "filter_hours";
pub const PARAM_SENSOR_IP: &str = "filter_sensor_ip";
pub const PARAM_SENSOR_NAME: &str = "filter_sensor_name";
pub const PARAM_APPLICATION: &str = "filter_application";
pub const PARAM_LIMIT: &str = "query_limit";

/// A value bound to a query placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    UInt32(u32),
    String(String),
}

impl ParamValue {
    /// ClickHouse type used in the placeholder.
    pub fn clickhouse_type(&self) -> &'static str {
        match self {
            ParamValue::UInt32(_) => "UInt32",
            ParamValue::String(_) => "String",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::UInt32(v) => write!(f, "{}", v),
            ParamValue::String(v) => f.write_str(v),
        }
    }
}

/// Parameter binding table, keyed by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    values: BTreeMap<&'static str, ParamValue>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value and return the placeholder to embed in query text.
    pub fn bind(&mut self, name: &'static str, value: ParamValue) -> String {
        let placeholder = format!("{{{}:{}}}", name, value.clickhouse_type());
        self.values.insert(name, value);
        placeholder
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A `WHERE` clause plus the parameters it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    conditions: Vec<String>,
    params: QueryParams,
}

impl Predicate {
    /// Build the predicate shared by every aggregation for a filter.
    ///
    /// The time window is always applied. Sensor address and sensor name
    /// are each applied when present; when both are present they narrow
    /// the result together.
    pub fn for_filter(filter: &Filter) -> Self {
        let mut params = QueryParams::new();
        let mut conditions = Vec::with_capacity(3);

        let hours = params.bind(PARAM_HOURS, ParamValue::UInt32(filter.hours()));
        conditions.push(format!(
            "cal_timestamp_time >= now() - INTERVAL {} HOUR",
            hours
        ));

        if let Some(ip) = filter.sensor_ip() {
            let placeholder = params.bind(PARAM_SENSOR_IP, ParamValue::String(ip.to_string()));
            conditions.push(format!("device_ip_address = {}", placeholder));
        }

        if let Some(name) = filter.sensor_name() {
            let placeholder =
                params.bind(PARAM_SENSOR_NAME, ParamValue::String(name.to_string()));
            conditions.push(format!("device_name = {}", placeholder));
        }

        Self { conditions, params }
    }

    /// Narrow the predicate to one application.
    ///
    /// The name is bound exactly as given; stored names may carry
    /// surrounding whitespace.
    pub fn with_application(mut self, application: &str) -> Result<Self, StoreError> {
        if application.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "application name must not be empty".to_string(),
            ));
        }

        let placeholder = self.params.bind(
            PARAM_APPLICATION,
            ParamValue::String(application.to_string()),
        );
        self.conditions
            .push(format!("application_name = {}", placeholder));
        Ok(self)
    }

    /// Bind a row limit and return its placeholder for a `LIMIT` clause.
    pub fn bind_limit(&mut self, limit: u32) -> String {
        self.params.bind(PARAM_LIMIT, ParamValue::UInt32(limit))
    }

    /// The `WHERE ...` clause text.
    pub fn where_clause(&self) -> String {
        format!("WHERE {}", self.conditions.join(" AND "))
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }
}
