/// Test utilities module for automatic cleanup and consistent test infrastructure
///
/// This module provides RAII-based cleanup that guarantees test data is removed
/// even if tests panic or fail.
use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use shared::{SleepEventType, SleepType};
use std::path::PathBuf;
use tempfile::TempDir;

use super::connection::CsvConnection;
use crate::domain::models::{SleepEvent, SleepLog};

/// RAII Test Environment that automatically cleans up on drop
pub struct TestEnvironment {
    /// The temporary directory - kept alive to prevent auto-cleanup until drop
    _temp_dir: TempDir,
    pub connection: CsvConnection,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = CsvConnection::new(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }
}

pub fn event(event_type: SleepEventType, ts: &str) -> SleepEvent {
    SleepEvent::new(
        event_type,
        DateTime::parse_from_rfc3339(ts).expect("valid RFC 3339 timestamp"),
    )
}

/// A one-hour nap (13:00-14:15, asleep from 13:15) on `local_date`, created
/// `created_offset_minutes` after a fixed base instant
pub fn sample_sleep_log(
    child_id: &str,
    id: &str,
    sleep_type: SleepType,
    local_date: &str,
    created_offset_minutes: i64,
) -> SleepLog {
    let date = NaiveDate::parse_from_str(local_date, "%Y-%m-%d").expect("valid date");
    let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        + Duration::minutes(created_offset_minutes);

    SleepLog {
        id: id.to_string(),
        child_id: child_id.to_string(),
        child_timezone: "America/New_York".to_string(),
        sleep_type,
        local_date: date,
        events: vec![
            event(SleepEventType::PutInBed, &format!("{}T13:00:00-05:00", local_date)),
            event(SleepEventType::FellAsleep, &format!("{}T13:15:00-05:00", local_date)),
            event(SleepEventType::OutOfBed, &format!("{}T14:15:00-05:00", local_date)),
        ],
        created_at,
        updated_at: created_at,
    }
}
