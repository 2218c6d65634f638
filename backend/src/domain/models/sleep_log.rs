use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shared::{LogType, SleepEventType, SleepType};

/// Parse an IANA zone name such as `America/New_York`
pub fn parse_child_timezone(name: &str) -> Result<Tz, SleepLogError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| SleepLogError::InvalidTimezone(name.to_string()))
}

/// A single event inside a sleep session.
///
/// The timestamp keeps the child's UTC offset alongside the instant, so the
/// same value answers both "how long" (via [`SleepEvent::instant`]) and
/// "which calendar day" (via [`SleepEvent::local_date`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepEvent {
    pub event_type: SleepEventType,
    pub local_timestamp: DateTime<FixedOffset>,
}

impl SleepEvent {
    pub fn new(event_type: SleepEventType, local_timestamp: DateTime<FixedOffset>) -> Self {
        Self { event_type, local_timestamp }
    }

    /// Absolute instant, used for elapsed-time math
    pub fn instant(&self) -> DateTime<Utc> {
        self.local_timestamp.with_timezone(&Utc)
    }

    /// Wall-clock time as the child experienced it
    pub fn naive_local(&self) -> NaiveDateTime {
        self.local_timestamp.naive_local()
    }

    pub fn local_date(&self) -> NaiveDate {
        self.local_timestamp.date_naive()
    }

    /// Calendar date of this instant on the child's wall clock in `tz`,
    /// whatever offset the timestamp was supplied with
    pub fn local_date_in(&self, tz: &Tz) -> NaiveDate {
        self.instant().with_timezone(tz).date_naive()
    }

    /// Same instant, re-expressed with the offset `tz` has at that moment
    pub fn in_timezone(&self, tz: &Tz) -> SleepEvent {
        SleepEvent::new(
            self.event_type,
            self.instant().with_timezone(tz).fixed_offset(),
        )
    }
}

/// One nap or bedtime session ("sleep log")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepLog {
    pub id: String,
    pub child_id: String,
    pub child_timezone: String,
    pub sleep_type: SleepType,
    /// Assigned from the first event when the session starts; never recomputed
    pub local_date: NaiveDate,
    pub events: Vec<SleepEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SleepLog {
    pub fn generate_id(child_id: &str) -> String {
        format!("sleep::{}_{}", child_id, uuid::Uuid::new_v4().simple())
    }

    /// Event that occurred last, regardless of storage order
    pub fn last_event(&self) -> Option<&SleepEvent> {
        self.events.iter().max_by_key(|event| event.instant())
    }

    /// A session is complete once its final event is `out_of_bed`
    pub fn is_complete(&self) -> bool {
        matches!(
            self.last_event().map(|event| event.event_type),
            Some(SleepEventType::OutOfBed)
        )
    }

    pub fn to_snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            log_type: LogType::Sleep,
            local_date: Some(self.local_date),
            sleep_type: Some(self.sleep_type),
            events: self.events.clone(),
            child_id: self.child_id.clone(),
            child_timezone: self.child_timezone.clone(),
        }
    }
}

/// The part of a log document the change trigger inspects
#[derive(Debug, Clone, PartialEq)]
pub struct LogSnapshot {
    pub log_type: LogType,
    pub local_date: Option<NaiveDate>,
    pub sleep_type: Option<SleepType>,
    pub events: Vec<SleepEvent>,
    pub child_id: String,
    pub child_timezone: String,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SleepLogError {
    #[error("Sleep log not found: {0}")]
    NotFound(String),
    #[error("Sleep log {0} is already complete")]
    SessionComplete(String),
    #[error("Invalid sleep event: {0}")]
    InvalidEvent(String),
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: SleepEventType, ts: &str) -> SleepEvent {
        SleepEvent::new(event_type, DateTime::parse_from_rfc3339(ts).unwrap())
    }

    fn log_with(events: Vec<SleepEvent>) -> SleepLog {
        SleepLog {
            id: "sleep::1".to_string(),
            child_id: "child-1".to_string(),
            child_timezone: "America/New_York".to_string(),
            sleep_type: SleepType::Bedtime,
            local_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            events,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_local_date_uses_wall_clock() {
        // 23:30 local is already the next day in UTC
        let e = event(SleepEventType::PutInBed, "2024-03-09T23:30:00-05:00");
        assert_eq!(e.local_date(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(e.instant().date_naive(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_local_date_in_child_timezone() {
        let new_york = parse_child_timezone("America/New_York").unwrap();
        // 01:00 UTC is still the previous evening in New York
        let e = event(SleepEventType::PutInBed, "2024-01-16T01:00:00Z");
        assert_eq!(e.local_date(), NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        assert_eq!(e.local_date_in(&new_york), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let normalized = e.in_timezone(&new_york);
        assert_eq!(normalized.instant(), e.instant());
        assert_eq!(normalized.local_timestamp.to_rfc3339(), "2024-01-15T20:00:00-05:00");
    }

    #[test]
    fn test_in_timezone_follows_dst() {
        let new_york = parse_child_timezone("America/New_York").unwrap();
        let summer = event(SleepEventType::FellAsleep, "2024-07-01T02:00:00Z").in_timezone(&new_york);
        assert_eq!(summer.local_timestamp.offset().local_minus_utc(), -4 * 3600);
    }

    #[test]
    fn test_parse_child_timezone_rejects_unknown_zone() {
        assert!(parse_child_timezone(" Europe/Berlin ").is_ok());
        assert_eq!(
            parse_child_timezone("Not/A_Zone"),
            Err(SleepLogError::InvalidTimezone("Not/A_Zone".to_string()))
        );
        assert!(parse_child_timezone("").is_err());
    }

    #[test]
    fn test_is_complete_checks_latest_event() {
        let open = log_with(vec![
            event(SleepEventType::PutInBed, "2024-03-09T20:00:00-05:00"),
            event(SleepEventType::FellAsleep, "2024-03-09T20:20:00-05:00"),
        ]);
        assert!(!open.is_complete());

        let complete = log_with(vec![
            event(SleepEventType::OutOfBed, "2024-03-10T06:30:00-05:00"),
            event(SleepEventType::PutInBed, "2024-03-09T20:00:00-05:00"),
        ]);
        assert!(complete.is_complete());
        assert!(!log_with(Vec::new()).is_complete());
    }

    #[test]
    fn test_snapshot_carries_sleep_fields() {
        let log = log_with(vec![event(SleepEventType::PutInBed, "2024-03-09T20:00:00-05:00")]);
        let snapshot = log.to_snapshot();
        assert_eq!(snapshot.log_type, LogType::Sleep);
        assert_eq!(snapshot.local_date, Some(log.local_date));
        assert_eq!(snapshot.sleep_type, Some(SleepType::Bedtime));
        assert_eq!(snapshot.events.len(), 1);
    }
}
