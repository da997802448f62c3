//! Snapshot - a point-in-time view of the whole dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Filter, HealthOverview, TimelinePoint, TopTalker};

/// Everything the dashboard shows on its overview page.
///
/// Snapshots are replaced wholesale on every successful fetch; a consumer
/// never patches one field by field.
///
/// # Example
///
/// ```rust
/// use netwatch_types::{DashboardSnapshot, Filter, HealthOverview};
///
/// let snapshot = DashboardSnapshot::new(
///     HealthOverview::from_totals(1000, 20),
///     Vec::new(),
///     Vec::new(),
///     Filter::last_hours(6),
/// );
///
/// let json = serde_json::to_string(&snapshot).unwrap();
/// assert!(json.contains("\"healthOverview\""));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub health_overview: HealthOverview,
    pub top_talkers: Vec<TopTalker>,
    pub traffic_timeline: Vec<TimelinePoint>,
    /// The filter the snapshot was computed for.
    pub filter: Filter,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// Create a snapshot stamped with the current time.
    pub fn new(
        health_overview: HealthOverview,
        top_talkers: Vec<TopTalker>,
        traffic_timeline: Vec<TimelinePoint>,
        filter: Filter,
    ) -> Self {
        Self {
            health_overview,
            top_talkers,
            traffic_timeline,
            filter,
            generated_at: Utc::now(),
        }
    }

    /// The busiest client/server pair, if any traffic was seen.
    pub fn top_talker(&self) -> Option<&TopTalker> {
        self.top_talkers.first()
    }

    /// Total requests over the timeline buckets.
    pub fn timeline_requests(&self) -> u64 {
        self.traffic_timeline.iter().map(|p| p.request_count).sum()
    }
}
