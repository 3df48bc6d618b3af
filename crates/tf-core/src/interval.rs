//! Persisted time intervals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{IntervalId, TaskId};

/// Label used in interval names when the owner supplies none.
pub const DEFAULT_TASK_LABEL: &str = "Task";

/// One continuous tracking session for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub id: IntervalId,
    pub task_id: TaskId,
    pub name: String,
    pub started_at: DateTime<Utc>,
    /// Absent while the interval is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Whole seconds between start and end; 0 while running.
    pub duration_seconds: u64,
    pub running: bool,
}

/// Result of closing an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedInterval {
    pub id: IntervalId,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: u64,
}

/// Builds the stored name of an interval.
pub fn interval_name(task_label: &str) -> String {
    let label = task_label.trim();
    let label = if label.is_empty() {
        DEFAULT_TASK_LABEL
    } else {
        label
    };
    format!("Time tracking: {label}")
}

/// Whole seconds from `started_at` to `ended_at`.
///
/// An end before the start (clock skew between writers) yields 0.
pub fn duration_seconds(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> u64 {
    u64::try_from(ended_at.signed_duration_since(started_at).num_seconds()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn duration_floors_to_whole_seconds() {
        let start = Utc::now();
        let end = start + Duration::milliseconds(3_999);
        assert_eq!(duration_seconds(start, end), 3);
    }

    #[test]
    fn duration_clamps_negative_skew() {
        let start = Utc::now();
        let end = start - Duration::seconds(30);
        assert_eq!(duration_seconds(start, end), 0);
    }

    #[test]
    fn interval_name_falls_back_to_default_label() {
        assert_eq!(interval_name("Write docs"), "Time tracking: Write docs");
        assert_eq!(interval_name("  "), "Time tracking: Task");
    }
}
