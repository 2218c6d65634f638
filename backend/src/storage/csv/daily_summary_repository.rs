//! # Daily Summary Repository
//!
//! CSV-backed summary storage. Each child's summaries live in
//! `{child_directory}/daily_summaries.csv`, one row per date:
//!
//! ```csv
//! id,child_id,date,timezone,total_sleep,total_sleep_minutes,...,source_log_ids,calculation_version,last_updated
//! child_c1_date_2024-01-15,c1,2024-01-15,America/New_York,10h,600,...,"[""sleep::a"",""sleep::b""]",1,2024-01-16T12:00:00+00:00
//! ```
//!
//! Source log ids are kept as a JSON array in a single column, since ids
//! embed caller-supplied child ids and may contain any separator.
//!
//! Upserts rewrite the whole file through a temp file so a summary is always
//! replaced in full, never merged. An upsert refuses to run over a file with
//! rows it cannot parse rather than drop them.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use csv::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::connection::CsvConnection;
use crate::domain::date_impact::{format_date, parse_date};
use crate::domain::models::DailySummary;
use crate::storage::traits::DailySummaryStorage;

const DAILY_SUMMARIES_FILE: &str = "daily_summaries.csv";

/// CSV record structure for daily summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailySummaryRecord {
    id: String,
    child_id: String,
    date: String,
    timezone: String,
    total_sleep: String,
    total_sleep_minutes: i64,
    total_awake_in_bed: String,
    total_awake_in_bed_minutes: i64,
    longest_stretch: String,
    longest_stretch_minutes: i64,
    wake_ups: u32,
    time_to_fall_asleep: String,
    time_to_fall_asleep_minutes: i64,
    average_wake_up_length: String,
    average_wake_up_length_minutes: i64,
    source_log_ids: String,
    calculation_version: u32,
    last_updated: String,
}

impl From<&DailySummary> for DailySummaryRecord {
    fn from(summary: &DailySummary) -> Self {
        DailySummaryRecord {
            id: summary.id.clone(),
            child_id: summary.child_id.clone(),
            date: format_date(summary.date),
            timezone: summary.timezone.clone(),
            total_sleep: summary.total_sleep.clone(),
            total_sleep_minutes: summary.total_sleep_minutes,
            total_awake_in_bed: summary.total_awake_in_bed.clone(),
            total_awake_in_bed_minutes: summary.total_awake_in_bed_minutes,
            longest_stretch: summary.longest_stretch.clone(),
            longest_stretch_minutes: summary.longest_stretch_minutes,
            wake_ups: summary.wake_ups,
            time_to_fall_asleep: summary.time_to_fall_asleep.clone(),
            time_to_fall_asleep_minutes: summary.time_to_fall_asleep_minutes,
            average_wake_up_length: summary.average_wake_up_length.clone(),
            average_wake_up_length_minutes: summary.average_wake_up_length_minutes,
            source_log_ids: serde_json::Value::from(summary.source_log_ids.clone()).to_string(),
            calculation_version: summary.calculation_version,
            last_updated: summary.last_updated.to_rfc3339(),
        }
    }
}

impl TryFrom<DailySummaryRecord> for DailySummary {
    type Error = anyhow::Error;

    fn try_from(record: DailySummaryRecord) -> Result<Self> {
        let date = parse_date(&record.date)
            .ok_or_else(|| anyhow!("Invalid summary date: {}", record.date))?;
        let last_updated = DateTime::parse_from_rfc3339(&record.last_updated)
            .with_context(|| format!("Invalid last_updated: {}", record.last_updated))?
            .with_timezone(&Utc);
        let source_log_ids: Vec<String> = serde_json::from_str(&record.source_log_ids)
            .with_context(|| format!("Invalid source_log_ids: {}", record.source_log_ids))?;

        Ok(DailySummary {
            id: record.id,
            child_id: record.child_id,
            date,
            timezone: record.timezone,
            total_sleep: record.total_sleep,
            total_sleep_minutes: record.total_sleep_minutes,
            total_awake_in_bed: record.total_awake_in_bed,
            total_awake_in_bed_minutes: record.total_awake_in_bed_minutes,
            longest_stretch: record.longest_stretch,
            longest_stretch_minutes: record.longest_stretch_minutes,
            wake_ups: record.wake_ups,
            time_to_fall_asleep: record.time_to_fall_asleep,
            time_to_fall_asleep_minutes: record.time_to_fall_asleep_minutes,
            average_wake_up_length: record.average_wake_up_length,
            average_wake_up_length_minutes: record.average_wake_up_length_minutes,
            source_log_ids,
            calculation_version: record.calculation_version,
            last_updated,
        })
    }
}

/// CSV-based daily summary repository using per-child CSV files
#[derive(Clone)]
pub struct DailySummaryRepository {
    connection: CsvConnection,
}

impl DailySummaryRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn get_summaries_file_path(&self, child_id: &str) -> PathBuf {
        self.connection
            .get_child_directory(child_id)
            .join(DAILY_SUMMARIES_FILE)
    }

    /// Every row of the child's file, each parsed on its own
    fn read_rows(&self, child_id: &str) -> Result<Vec<Result<DailySummary>>> {
        let path = self.get_summaries_file_path(child_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path).with_context(|| format!("Failed to open {:?}", path))?;
        let mut csv_reader = Reader::from_reader(BufReader::new(file));

        Ok(csv_reader
            .deserialize::<DailySummaryRecord>()
            .map(|row| row.map_err(anyhow::Error::from).and_then(DailySummary::try_from))
            .collect())
    }

    /// Summaries owned by `child_id`; rows that fail to parse are skipped
    fn read_summaries(&self, child_id: &str) -> Result<Vec<DailySummary>> {
        let mut summaries = Vec::new();
        for row in self.read_rows(child_id)? {
            match row {
                Ok(summary) if summary.child_id == child_id => summaries.push(summary),
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to parse daily summary record for child {}: {}. Skipping.", child_id, e);
                }
            }
        }
        Ok(summaries)
    }

    /// Every row in the file, any owner, failing on the first bad row
    fn read_all_summaries_strict(&self, child_id: &str) -> Result<Vec<DailySummary>> {
        let path = self.get_summaries_file_path(child_id);
        self.read_rows(child_id)?
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                row.with_context(|| format!("Unparseable row {} in {:?}; refusing to rewrite", index + 1, path))
            })
            .collect()
    }

    fn write_summaries(&self, child_id: &str, summaries: &[DailySummary]) -> Result<()> {
        self.connection.ensure_child_directory(child_id)?;
        let path = self.get_summaries_file_path(child_id);
        let temp_path = path.with_extension("csv.tmp");

        {
            let temp_file = File::create(&temp_path)
                .with_context(|| format!("Failed to create {:?}", temp_path))?;
            let mut csv_writer = Writer::from_writer(BufWriter::new(temp_file));
            for summary in summaries {
                csv_writer.serialize(DailySummaryRecord::from(summary))?;
            }
            csv_writer.flush()?;
        }

        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to replace {:?}", path))?;

        debug!("Wrote {} daily summaries to {:?}", summaries.len(), path);
        Ok(())
    }
}

#[async_trait]
impl DailySummaryStorage for DailySummaryRepository {
    async fn upsert_daily_summary(&self, summary: &DailySummary) -> Result<()> {
        let _guard = self.connection.lock_writes().await;

        let mut summaries = self.read_all_summaries_strict(&summary.child_id)?;
        match summaries.iter_mut().find(|existing| existing.id == summary.id) {
            Some(existing) => *existing = summary.clone(),
            None => summaries.push(summary.clone()),
        }
        summaries.sort_by_key(|s| s.date);
        self.write_summaries(&summary.child_id, &summaries)?;

        info!("Upserted daily summary {}", summary.id);
        Ok(())
    }

    async fn get_daily_summary(&self, child_id: &str, date: NaiveDate) -> Result<Option<DailySummary>> {
        let id = DailySummary::generate_id(child_id, date);
        let summaries = self.read_summaries(child_id)?;
        Ok(summaries.into_iter().find(|summary| summary.id == id))
    }

    async fn list_daily_summaries(
        &self,
        child_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailySummary>> {
        let mut summaries: Vec<DailySummary> = self
            .read_summaries(child_id)?
            .into_iter()
            .filter(|summary| summary.date >= start_date && summary.date <= end_date)
            .collect();
        summaries.sort_by_key(|summary| summary.date);
        Ok(summaries)
    }
}
