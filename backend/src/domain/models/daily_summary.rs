use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::duration_format::{format_hours_minutes, format_minutes};

/// Bumped whenever the way summaries are derived changes
pub const CALCULATION_VERSION: u32 = 1;

/// Aggregate of every qualifying sleep session for one child on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub id: String,
    pub child_id: String,
    pub date: NaiveDate,
    pub timezone: String,
    pub total_sleep: String,
    pub total_sleep_minutes: i64,
    pub total_awake_in_bed: String,
    pub total_awake_in_bed_minutes: i64,
    pub longest_stretch: String,
    pub longest_stretch_minutes: i64,
    pub wake_ups: u32,
    pub time_to_fall_asleep: String,
    pub time_to_fall_asleep_minutes: i64,
    pub average_wake_up_length: String,
    pub average_wake_up_length_minutes: i64,
    pub source_log_ids: Vec<String>,
    pub calculation_version: u32,
    pub last_updated: DateTime<Utc>,
}

impl DailySummary {
    /// Deterministic document key so recomputation always overwrites
    pub fn generate_id(child_id: &str, date: NaiveDate) -> String {
        format!("child_{}_date_{}", child_id, date.format("%Y-%m-%d"))
    }

    /// Summary for a date without any sessions
    pub fn empty(child_id: &str, date: NaiveDate, timezone: &str) -> Self {
        Self {
            id: Self::generate_id(child_id, date),
            child_id: child_id.to_string(),
            date,
            timezone: timezone.to_string(),
            total_sleep: format_hours_minutes(0),
            total_sleep_minutes: 0,
            total_awake_in_bed: format_hours_minutes(0),
            total_awake_in_bed_minutes: 0,
            longest_stretch: format_hours_minutes(0),
            longest_stretch_minutes: 0,
            wake_ups: 0,
            time_to_fall_asleep: format_minutes(0),
            time_to_fall_asleep_minutes: 0,
            average_wake_up_length: format_minutes(0),
            average_wake_up_length_minutes: 0,
            source_log_ids: Vec::new(),
            calculation_version: CALCULATION_VERSION,
            last_updated: Utc::now(),
        }
    }

    /// Compare two summaries ignoring the write timestamp
    pub fn same_metrics(&self, other: &DailySummary) -> bool {
        let mut other = other.clone();
        other.last_updated = self.last_updated;
        *self == other
    }
}
