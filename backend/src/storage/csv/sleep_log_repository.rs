//! # Sleep Log Repository
//!
//! File-based sleep log storage. Each child's sessions live in
//! `{child_directory}/sleep_logs.yaml` as a list of records; the nested event
//! list is why this file is YAML rather than CSV.
//!
//! ```yaml
//! - id: sleep::child-1_9f1c2a7e4b3d4e5f8a6b0c1d2e3f4a5b
//!   child_id: child-1
//!   child_timezone: America/New_York
//!   sleep_type: bedtime
//!   local_date: 2024-01-15
//!   events:
//!     - event_type: put_in_bed
//!       local_timestamp: 2024-01-15T20:00:00-05:00
//!   created_at: 2024-01-16T01:00:00+00:00
//!   updated_at: 2024-01-16T01:00:00+00:00
//! ```
//!
//! Writes go to a temp file first and are renamed over the original. Writes
//! work on the raw YAML entries, so a record that fails to parse is still
//! written back as it was. Reads only return records whose `child_id`
//! matches the requested child.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use shared::{SleepEventType, SleepType};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::connection::CsvConnection;
use crate::domain::date_impact::{format_date, parse_date};
use crate::domain::models::{SleepEvent, SleepLog};
use crate::storage::traits::SleepLogStorage;

const SLEEP_LOGS_FILE: &str = "sleep_logs.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SleepEventRecord {
    event_type: SleepEventType,
    local_timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SleepLogRecord {
    id: String,
    child_id: String,
    child_timezone: String,
    sleep_type: String,
    local_date: String,
    #[serde(default)]
    events: Vec<SleepEventRecord>,
    created_at: String,
    updated_at: String,
}

impl From<&SleepLog> for SleepLogRecord {
    fn from(log: &SleepLog) -> Self {
        SleepLogRecord {
            id: log.id.clone(),
            child_id: log.child_id.clone(),
            child_timezone: log.child_timezone.clone(),
            sleep_type: log.sleep_type.to_string(),
            local_date: format_date(log.local_date),
            events: log
                .events
                .iter()
                .map(|event| SleepEventRecord {
                    event_type: event.event_type,
                    local_timestamp: event.local_timestamp.to_rfc3339(),
                })
                .collect(),
            created_at: log.created_at.to_rfc3339(),
            updated_at: log.updated_at.to_rfc3339(),
        }
    }
}

impl TryFrom<SleepLogRecord> for SleepLog {
    type Error = anyhow::Error;

    fn try_from(record: SleepLogRecord) -> Result<Self> {
        let sleep_type = SleepType::from_string(&record.sleep_type).map_err(|e| anyhow!(e))?;
        let local_date = parse_date(&record.local_date)
            .ok_or_else(|| anyhow!("Invalid local date: {}", record.local_date))?;

        let events = record
            .events
            .into_iter()
            .map(|event| {
                let timestamp = DateTime::parse_from_rfc3339(&event.local_timestamp)
                    .with_context(|| format!("Invalid event timestamp: {}", event.local_timestamp))?;
                Ok(SleepEvent::new(event.event_type, timestamp))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SleepLog {
            id: record.id,
            child_id: record.child_id,
            child_timezone: record.child_timezone,
            sleep_type,
            local_date,
            events,
            created_at: parse_utc(&record.created_at)?,
            updated_at: parse_utc(&record.updated_at)?,
        })
    }
}

fn parse_utc(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp: {}", value))?
        .with_timezone(&Utc))
}

/// YAML-backed sleep log repository using one file per child
#[derive(Clone)]
pub struct SleepLogRepository {
    connection: CsvConnection,
}

impl SleepLogRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn get_sleep_logs_file_path(&self, child_id: &str) -> PathBuf {
        self.connection.get_child_directory(child_id).join(SLEEP_LOGS_FILE)
    }

    /// Every entry of a child's file as untyped YAML. Fails only when the
    /// file itself is unreadable or not a YAML list.
    fn read_entries(&self, child_id: &str) -> Result<Vec<Value>> {
        let path = self.get_sleep_logs_file_path(child_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Sleep logs owned by `child_id`. Entries that fail to parse are
    /// skipped with a warning; they stay untouched on disk.
    fn read_sleep_logs(&self, child_id: &str) -> Result<Vec<SleepLog>> {
        let mut logs = Vec::new();
        for entry in self.read_entries(child_id)? {
            let entry_id = entry_field(&entry, "id").unwrap_or("<no id>").to_string();
            let parsed = serde_yaml::from_value::<SleepLogRecord>(entry)
                .map_err(anyhow::Error::from)
                .and_then(SleepLog::try_from);
            match parsed {
                Ok(log) if log.child_id == child_id => logs.push(log),
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to parse sleep log record {}: {}. Skipping.", entry_id, e);
                }
            }
        }
        Ok(logs)
    }

    /// Rewrite the file from raw entries, so records this version cannot
    /// parse are carried over unchanged.
    fn write_entries(&self, child_id: &str, entries: &[Value]) -> Result<()> {
        self.connection.ensure_child_directory(child_id)?;
        let path = self.get_sleep_logs_file_path(child_id);
        let temp_path = path.with_extension("yaml.tmp");

        let content = serde_yaml::to_string(entries)?;

        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write {:?}", temp_path))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to replace {:?}", path))?;

        debug!("Wrote {} sleep log entries to {:?}", entries.len(), path);
        Ok(())
    }
}

fn entry_field<'a>(entry: &'a Value, field: &str) -> Option<&'a str> {
    entry.get(field).and_then(Value::as_str)
}

/// True when a raw entry is the log `log_id` owned by `child_id`
fn is_entry_for(entry: &Value, child_id: &str, log_id: &str) -> bool {
    entry_field(entry, "id") == Some(log_id) && entry_field(entry, "child_id") == Some(child_id)
}

#[async_trait]
impl SleepLogStorage for SleepLogRepository {
    async fn store_sleep_log(&self, sleep_log: &SleepLog) -> Result<()> {
        let _guard = self.connection.lock_writes().await;

        let mut entries = self.read_entries(&sleep_log.child_id)?;
        let value = serde_yaml::to_value(SleepLogRecord::from(sleep_log))?;
        match entries
            .iter_mut()
            .find(|entry| is_entry_for(entry, &sleep_log.child_id, &sleep_log.id))
        {
            Some(existing) => *existing = value,
            None => entries.push(value),
        }
        self.write_entries(&sleep_log.child_id, &entries)?;

        info!("Stored sleep log {} for child {}", sleep_log.id, sleep_log.child_id);
        Ok(())
    }

    async fn get_sleep_log(&self, child_id: &str, log_id: &str) -> Result<Option<SleepLog>> {
        let logs = self.read_sleep_logs(child_id)?;
        Ok(logs.into_iter().find(|log| log.id == log_id))
    }

    async fn list_sleep_logs_for_date(&self, child_id: &str, date: NaiveDate) -> Result<Vec<SleepLog>> {
        let logs = self.read_sleep_logs(child_id)?;
        Ok(logs.into_iter().filter(|log| log.local_date == date).collect())
    }

    async fn get_latest_sleep_log(&self, child_id: &str) -> Result<Option<SleepLog>> {
        let logs = self.read_sleep_logs(child_id)?;
        Ok(logs.into_iter().max_by_key(|log| log.created_at))
    }

    async fn delete_sleep_log(&self, child_id: &str, log_id: &str) -> Result<bool> {
        let _guard = self.connection.lock_writes().await;

        let mut entries = self.read_entries(child_id)?;
        let original_len = entries.len();
        entries.retain(|entry| !is_entry_for(entry, child_id, log_id));

        if entries.len() == original_len {
            return Ok(false);
        }

        self.write_entries(child_id, &entries)?;
        info!("Deleted sleep log {} for child {}", log_id, child_id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::{sample_sleep_log, TestEnvironment};

    #[tokio::test]
    async fn test_store_and_get_sleep_log() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SleepLogRepository::new(env.connection.clone());
        let log = sample_sleep_log("child-1", "sleep::a", SleepType::Bedtime, "2024-01-15", 0);

        repo.store_sleep_log(&log).await.unwrap();

        let loaded = repo.get_sleep_log("child-1", "sleep::a").await.unwrap().unwrap();
        assert_eq!(loaded, log);
        assert!(repo.get_sleep_log("child-1", "missing").await.unwrap().is_none());
        assert!(repo.get_sleep_log("other-child", "sleep::a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_replaces_existing_log() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SleepLogRepository::new(env.connection.clone());
        let mut log = sample_sleep_log("child-1", "sleep::a", SleepType::Nap, "2024-01-15", 0);
        repo.store_sleep_log(&log).await.unwrap();

        log.events.truncate(1);
        repo.store_sleep_log(&log).await.unwrap();

        let logs = repo
            .list_sleep_logs_for_date("child-1", parse_date("2024-01-15").unwrap())
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].events.len(), 1);
    }

    #[tokio::test]
    async fn test_list_for_date_filters_by_local_date() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SleepLogRepository::new(env.connection.clone());
        repo.store_sleep_log(&sample_sleep_log("child-1", "a", SleepType::Nap, "2024-01-15", 0))
            .await
            .unwrap();
        repo.store_sleep_log(&sample_sleep_log("child-1", "b", SleepType::Bedtime, "2024-01-15", 1))
            .await
            .unwrap();
        repo.store_sleep_log(&sample_sleep_log("child-1", "c", SleepType::Nap, "2024-01-16", 2))
            .await
            .unwrap();

        let logs = repo
            .list_sleep_logs_for_date("child-1", parse_date("2024-01-15").unwrap())
            .await
            .unwrap();
        let ids: Vec<_> = logs.iter().map(|log| log.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_latest_sleep_log_uses_created_at() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SleepLogRepository::new(env.connection.clone());
        assert!(repo.get_latest_sleep_log("child-1").await.unwrap().is_none());

        repo.store_sleep_log(&sample_sleep_log("child-1", "newer", SleepType::Nap, "2024-01-10", 5))
            .await
            .unwrap();
        repo.store_sleep_log(&sample_sleep_log("child-1", "older", SleepType::Nap, "2024-01-20", 1))
            .await
            .unwrap();

        let latest = repo.get_latest_sleep_log("child-1").await.unwrap().unwrap();
        assert_eq!(latest.id, "newer");
    }

    #[tokio::test]
    async fn test_delete_sleep_log() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SleepLogRepository::new(env.connection.clone());
        repo.store_sleep_log(&sample_sleep_log("child-1", "a", SleepType::Nap, "2024-01-15", 0))
            .await
            .unwrap();

        assert!(repo.delete_sleep_log("child-1", "a").await.unwrap());
        assert!(!repo.delete_sleep_log("child-1", "a").await.unwrap());
        assert!(repo.get_sleep_log("child-1", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SleepLogRepository::new(env.connection.clone());
        repo.store_sleep_log(&sample_sleep_log("child-1", "good", SleepType::Nap, "2024-01-15", 0))
            .await
            .unwrap();

        let path = repo.get_sleep_logs_file_path("child-1");
        let content = fs::read_to_string(&path).unwrap();
        let broken = content.replacen("sleep_type: nap", "sleep_type: siesta", 1);
        fs::write(&path, format!("{}{}", content, broken.replacen("id: good", "id: bad", 1)))
            .unwrap();

        let logs = repo.read_sleep_logs("child-1").unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, "good");
    }

    #[tokio::test]
    async fn test_unparseable_records_survive_unrelated_writes() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SleepLogRepository::new(env.connection.clone());
        repo.store_sleep_log(&sample_sleep_log("child-1", "good", SleepType::Nap, "2024-01-15", 0))
            .await
            .unwrap();

        let path = repo.get_sleep_logs_file_path("child-1");
        let content = fs::read_to_string(&path).unwrap();
        let broken = content
            .replacen("sleep_type: nap", "sleep_type: Nap", 1)
            .replacen("id: good", "id: bad", 1);
        fs::write(&path, format!("{}{}", content, broken)).unwrap();

        repo.store_sleep_log(&sample_sleep_log("child-1", "other", SleepType::Nap, "2024-01-16", 1))
            .await
            .unwrap();
        assert!(repo.delete_sleep_log("child-1", "good").await.unwrap());

        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("id: bad"));
        assert!(on_disk.contains("sleep_type: Nap"));
        let ids: Vec<_> = repo
            .read_sleep_logs("child-1")
            .unwrap()
            .into_iter()
            .map(|log| log.id)
            .collect();
        assert_eq!(ids, vec!["other"]);
    }

    #[tokio::test]
    async fn test_similar_child_ids_stay_separate() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SleepLogRepository::new(env.connection.clone());
        repo.store_sleep_log(&sample_sleep_log("a.b", "dotted", SleepType::Nap, "2024-01-15", 0))
            .await
            .unwrap();
        repo.store_sleep_log(&sample_sleep_log("a_b", "underscored", SleepType::Nap, "2024-01-15", 1))
            .await
            .unwrap();

        let date = parse_date("2024-01-15").unwrap();
        let dotted = repo.list_sleep_logs_for_date("a.b", date).await.unwrap();
        let underscored = repo.list_sleep_logs_for_date("a_b", date).await.unwrap();
        assert_eq!(dotted.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(), vec!["dotted"]);
        assert_eq!(underscored.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(), vec!["underscored"]);
        assert_eq!(repo.get_latest_sleep_log("a.b").await.unwrap().unwrap().id, "dotted");
        assert!(!repo.delete_sleep_log("a_b", "dotted").await.unwrap());
    }

    #[tokio::test]
    async fn test_reads_ignore_logs_owned_by_another_child() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SleepLogRepository::new(env.connection.clone());
        repo.store_sleep_log(&sample_sleep_log("child-1", "mine", SleepType::Nap, "2024-01-15", 0))
            .await
            .unwrap();

        // A foreign record that ended up in this child's file
        let path = repo.get_sleep_logs_file_path("child-1");
        let content = fs::read_to_string(&path).unwrap();
        let foreign = content
            .replacen("child_id: child-1", "child_id: child-2", 1)
            .replacen("id: mine", "id: theirs", 1);
        fs::write(&path, format!("{}{}", content, foreign)).unwrap();

        let logs = repo
            .list_sleep_logs_for_date("child-1", parse_date("2024-01-15").unwrap())
            .await
            .unwrap();
        assert_eq!(logs.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(), vec!["mine"]);
        assert!(repo.get_sleep_log("child-1", "theirs").await.unwrap().is_none());
        assert!(!repo.delete_sleep_log("child-1", "theirs").await.unwrap());
    }
}
