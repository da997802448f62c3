//! Dashboard filters.
//!
//! Every query the dashboard issues is scoped by a [`Filter`]. Raw input
//! arrives as a [`FilterInput`] (all fields optional, possibly out of range)
//! and is normalized once per tool invocation.

use serde::{Deserialize, Serialize};

/// Default time window when none is supplied.
pub const DEFAULT_HOURS: u32 = 24;
/// Smallest accepted time window.
pub const MIN_HOURS: u32 = 1;
/// Largest accepted time window (one week).
pub const MAX_HOURS: u32 = 168;
/// Default number of rows for ranked results such as top talkers.
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound for caller supplied row limits.
pub const MAX_LIMIT: u32 = 1000;

/// Raw, possibly absent filter fields as received from a caller.
///
/// Accepts the canonical camelCase names as well as the snake_case names
/// used by older dashboard builds (`hours`, `sensor_ip`, `sensor_name`,
/// `limit`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterInput {
    #[serde(default, alias = "hours")]
    pub time_window_hours: Option<i64>,
    #[serde(default, alias = "sensor_ip")]
    pub sensor_ip: Option<String>,
    #[serde(default, alias = "sensor_name")]
    pub sensor_name: Option<String>,
    #[serde(default, alias = "limit", alias = "result_limit")]
    pub result_limit: Option<i64>,
}

impl FilterInput {
    /// Apply defaults and clamp every field into its accepted range.
    pub fn normalize(self) -> Filter {
        self.normalize_with(DEFAULT_HOURS, DEFAULT_LIMIT)
    }

    /// Like [`normalize`](Self::normalize) but with deployment specific
    /// defaults for absent fields.
    pub fn normalize_with(self, default_hours: u32, default_limit: u32) -> Filter {
        let hours = self
            .time_window_hours
            .unwrap_or(i64::from(default_hours))
            .clamp(i64::from(MIN_HOURS), i64::from(MAX_HOURS)) as u32;
        let limit = self
            .result_limit
            .unwrap_or(i64::from(default_limit))
            .clamp(1, i64::from(MAX_LIMIT)) as u32;

        Filter {
            time_window_hours: hours,
            sensor_ip: non_blank(self.sensor_ip),
            sensor_name: non_blank(self.sensor_name),
            result_limit: limit,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A canonical, immutable filter.
///
/// Fields are private: the only ways to obtain a `Filter` go through
/// normalization, including deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "FilterInput")]
pub struct Filter {
    time_window_hours: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensor_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensor_name: Option<String>,
    result_limit: u32,
}

impl From<FilterInput> for Filter {
    fn from(input: FilterInput) -> Self {
        input.normalize()
    }
}

impl Default for Filter {
    fn default() -> Self {
        FilterInput::default().normalize()
    }
}

impl Filter {
    /// A filter over the last `hours` hours for all sensors.
    pub fn last_hours(hours: u32) -> Self {
        FilterInput {
            time_window_hours: Some(i64::from(hours)),
            ..Default::default()
        }
        .normalize()
    }

    /// Time window in hours, always within `[MIN_HOURS, MAX_HOURS]`.
    pub fn hours(&self) -> u32 {
        self.time_window_hours
    }

    pub fn sensor_ip(&self) -> Option<&str> {
        self.sensor_ip.as_deref()
    }

    pub fn sensor_name(&self) -> Option<&str> {
        self.sensor_name.as_deref()
    }

    /// Row limit for ranked results.
    pub fn limit(&self) -> u32 {
        self.result_limit
    }

    /// True when no sensor narrows the result set.
    pub fn is_all_sensors(&self) -> bool {
        self.sensor_ip.is_none() && self.sensor_name.is_none()
    }

    /// Return a copy with a different time window.
    pub fn with_hours(self, hours: u32) -> Self {
        Self {
            time_window_hours: hours.clamp(MIN_HOURS, MAX_HOURS),
            ..self
        }
    }

    /// Return a copy scoped to a sensor address. Blank clears it.
    pub fn with_sensor_ip(self, sensor_ip: Option<String>) -> Self {
        Self {
            sensor_ip: non_blank(sensor_ip),
            ..self
        }
    }

    /// Return a copy scoped to a sensor name. Blank clears it.
    pub fn with_sensor_name(self, sensor_name: Option<String>) -> Self {
        Self {
            sensor_name: non_blank(sensor_name),
            ..self
        }
    }

    /// Return a copy with a different row limit.
    pub fn with_limit(self, limit: u32) -> Self {
        Self {
            result_limit: limit.clamp(1, MAX_LIMIT),
            ..self
        }
    }

    /// Human readable window, e.g. "last 24 hours".
    pub fn describe_window(&self) -> String {
        let plural = if self.time_window_hours == 1 { "" } else { "s" };
        format!("last {} hour{}", self.time_window_hours, plural)
    }
}
