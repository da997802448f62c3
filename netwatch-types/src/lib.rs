//! # netwatch-types
//!
//! The result contract shared by every netwatch component. These are the
//! shapes the aggregation layer produces, the tool surface serializes and the
//! dashboard client keeps as its view state.
//!
//! ## Design Goals
//!
//! - **Stable wire format**: camelCase JSON, identical for in-process and
//!   remote consumers
//! - **Normalized filters**: a [`Filter`] can only be obtained through
//!   normalization, so an out-of-range time window never reaches a query
//! - **Owned values**: every shape is returned fresh per call, there is no
//!   shared mutable cache
//!
//! ## Example
//!
//! ```rust
//! use netwatch_types::{FilterInput, HealthOverview};
//!
//! let filter = FilterInput {
//!     time_window_hours: Some(500),
//!     sensor_ip: Some("10.0.0.7".into()),
//!     ..Default::default()
//! }
//! .normalize();
//!
//! assert_eq!(filter.hours(), 168);
//! assert_eq!(filter.sensor_ip(), Some("10.0.0.7"));
//!
//! let overview = HealthOverview::from_totals(1000, 20);
//! assert_eq!(overview.error_rate, 2.0);
//! ```

mod detail;
mod filter;
mod overview;
mod snapshot;
mod traffic;

pub use detail::*;
pub use filter::*;
pub use overview::*;
pub use snapshot::*;
pub use traffic::*;

/// Error rate as a percentage in `[0, 100]`.
///
/// Returns exactly `0.0` when there were no transactions.
pub fn error_rate(errors: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (errors as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}
