//! Traffic shapes: top talkers and the hourly timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A client/server pair ranked by byte volume.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTalker {
    pub client_ip: String,
    pub server_ip: String,
    pub bytes: u64,
    pub request_count: u64,
}

/// Sort talkers by bytes (largest first) and keep at most `limit`.
pub fn rank_talkers(talkers: &mut Vec<TopTalker>, limit: usize) {
    talkers.sort_by(|a, b| b.bytes.cmp(&a.bytes));
    talkers.truncate(limit);
}

/// Activity within one hour bucket.
///
/// Timelines are sparse: an hour without traffic has no point at all, so
/// consumers must not assume uniform spacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    /// Start of the hour bucket (UTC).
    pub bucket_start: DateTime<Utc>,
    pub request_count: u64,
    pub error_count: u64,
}

/// Order a timeline by bucket and merge duplicate buckets.
///
/// The result is strictly increasing in `bucket_start`. Merged counts
/// saturate at `u64::MAX`.
pub fn normalize_timeline(mut points: Vec<TimelinePoint>) -> Vec<TimelinePoint> {
    points.sort_by_key(|p| p.bucket_start);

    let mut merged: Vec<TimelinePoint> = Vec::with_capacity(points.len());
    for point in points {
        match merged.last_mut() {
            Some(last) if last.bucket_start == point.bucket_start => {
                last.request_count = last.request_count.saturating_add(point.request_count);
                last.error_count = last.error_count.saturating_add(point.error_count);
            }
            _ => merged.push(point),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(hour: u32, requests: u64) -> TimelinePoint {
        TimelinePoint {
            bucket_start: Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
            request_count: requests,
            error_count: 0,
        }
    }

    #[test]
    fn test_rank_talkers_truncates_largest_first() {
        let mut talkers: Vec<TopTalker> = (0..15)
            .map(|i| TopTalker {
                client_ip: format!("10.0.0.{i}"),
                server_ip: "10.0.1.1".into(),
                bytes: i * 100,
                request_count: 1,
            })
            .collect();

        rank_talkers(&mut talkers, 10);

        assert_eq!(talkers.len(), 10);
        assert_eq!(talkers[0].bytes, 1400);
        assert!(talkers.windows(2).all(|w| w[0].bytes >= w[1].bytes));
    }

    #[test]
    fn test_normalize_timeline_sorts_and_merges() {
        let timeline = normalize_timeline(vec![point(5, 1), point(2, 4), point(5, 3)]);

        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].request_count, 4);
        assert_eq!(timeline[1].request_count, 4);
        assert!(timeline
            .windows(2)
            .all(|w| w[0].bucket_start < w[1].bucket_start));
    }

    #[test]
    fn test_timeline_keeps_gaps() {
        let timeline = normalize_timeline(vec![point(1, 1), point(9, 1)]);
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_bucket_start_serializes_rfc3339() {
        let json = serde_json::to_value(point(7, 2)).unwrap();
        assert_eq!(json["bucketStart"], "2024-03-01T07:00:00Z");
        assert_eq!(json["requestCount"], 2);
    }
}
