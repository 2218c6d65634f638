use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-in-time marker kinds within a sleep session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepEventType {
    PutInBed,
    FellAsleep,
    WokeUp,
    OutOfBed,
}

impl fmt::Display for SleepEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            SleepEventType::PutInBed => "put_in_bed",
            SleepEventType::FellAsleep => "fell_asleep",
            SleepEventType::WokeUp => "woke_up",
            SleepEventType::OutOfBed => "out_of_bed",
        };
        write!(f, "{}", value)
    }
}

/// Whether a sleep session is a daytime nap or the night's bedtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepType {
    Nap,
    Bedtime,
}

impl fmt::Display for SleepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SleepType::Nap => write!(f, "nap"),
            SleepType::Bedtime => write!(f, "bedtime"),
        }
    }
}

impl SleepType {
    pub fn from_string(value: &str) -> Result<Self, String> {
        match value {
            "nap" => Ok(SleepType::Nap),
            "bedtime" => Ok(SleepType::Bedtime),
            other => Err(format!("Unknown sleep type: {}", other)),
        }
    }
}

/// Kind of log document. Only sleep logs feed daily sleep summaries;
/// every other kind (feeding, diaper, ...) collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Sleep,
    #[serde(other)]
    Other,
}

/// A sleep event as exchanged over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepEvent {
    #[serde(rename = "type")]
    pub event_type: SleepEventType,
    /// Child-local timestamp with offset (RFC 3339)
    pub local_timestamp: String,
}

/// One nap or bedtime session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepLog {
    pub id: String,
    pub child_id: String,
    /// IANA zone name valid when the session was recorded
    pub child_timezone: String,
    pub sleep_type: SleepType,
    /// Calendar date (YYYY-MM-DD) the session is filed under
    pub local_date: String,
    pub events: Vec<SleepEvent>,
    pub is_complete: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSleepLogRequest {
    pub child_timezone: String,
    pub sleep_type: SleepType,
    /// Child-local timestamp of the initial `put_in_bed` event (RFC 3339)
    pub put_in_bed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendSleepEventRequest {
    pub event: SleepEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepLogResponse {
    pub sleep_log: SleepLog,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepLogListRequest {
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepLogListResponse {
    pub sleep_logs: Vec<SleepLog>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSleepLogResponse {
    pub deleted: bool,
    pub success_message: String,
}

/// Per-child, per-calendar-date sleep aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    /// Deterministic key: `child_{childId}_date_{date}`
    pub id: String,
    pub child_id: String,
    pub date: String,
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
    /// Write timestamp (RFC 3339, UTC)
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryListRequest {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryListResponse {
    pub summaries: Vec<DailySummary>,
}

/// Manual recalculation input. Fields are optional on the wire so that a
/// missing parameter can be reported instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateSummariesRequest {
    pub child_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateSummariesResponse {
    pub success: bool,
    pub message: String,
    pub dates_processed: usize,
}

/// The fields of a log document the change trigger looks at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSnapshot {
    pub log_type: LogType,
    pub local_date: Option<String>,
    pub sleep_type: Option<SleepType>,
    #[serde(default)]
    pub events: Vec<SleepEvent>,
    pub child_id: String,
    pub child_timezone: String,
}

/// Before/after state of a log document that was created, updated or deleted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogChangeRequest {
    pub before: Option<LogSnapshot>,
    pub after: Option<LogSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRecomputeOutcome {
    pub date: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogChangeResponse {
    pub affected_dates: Vec<String>,
    pub outcomes: Vec<DateRecomputeOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_event_wire_shape() {
        let json = r#"{"type":"fell_asleep","localTimestamp":"2024-03-10T20:20:00-05:00"}"#;
        let event: SleepEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, SleepEventType::FellAsleep);
        assert_eq!(event.local_timestamp, "2024-03-10T20:20:00-05:00");
    }

    #[test]
    fn test_unknown_log_type_maps_to_other() {
        let json = r#"{"logType":"feeding","localDate":"2024-03-10","sleepType":null,"childId":"c1","childTimezone":"America/New_York"}"#;
        let snapshot: LogSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.log_type, LogType::Other);
        assert!(snapshot.events.is_empty());
    }

    #[test]
    fn test_recalculate_request_tolerates_missing_fields() {
        let request: RecalculateSummariesRequest =
            serde_json::from_str(r#"{"childId":"c1"}"#).unwrap();
        assert_eq!(request.child_id.as_deref(), Some("c1"));
        assert!(request.start_date.is_none());
        assert!(request.end_date.is_none());
    }

    #[test]
    fn test_recalculate_response_uses_camel_case() {
        let response = RecalculateSummariesResponse {
            success: false,
            message: "No sleep logs".to_string(),
            dates_processed: 0,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["datesProcessed"], 0);
        assert_eq!(json["success"], false);
    }

    #[test]
    fn test_sleep_type_round_trip_from_string() {
        assert_eq!(SleepType::from_string("nap").unwrap(), SleepType::Nap);
        assert_eq!(SleepType::from_string(&SleepType::Bedtime.to_string()).unwrap(), SleepType::Bedtime);
        assert!(SleepType::from_string("siesta").is_err());
    }
}
