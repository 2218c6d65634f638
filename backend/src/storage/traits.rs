//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::models::{DailySummary, SleepLog};

/// Trait defining the interface for sleep log storage operations
///
/// Queries always return the complete current set of sessions, never a delta.
#[async_trait]
pub trait SleepLogStorage: Send + Sync {
    /// Insert a sleep log, or replace the stored log with the same ID
    async fn store_sleep_log(&self, sleep_log: &SleepLog) -> Result<()>;

    /// Retrieve a specific sleep log by ID
    async fn get_sleep_log(&self, child_id: &str, log_id: &str) -> Result<Option<SleepLog>>;

    /// All sleep logs filed under a calendar date, in storage order
    async fn list_sleep_logs_for_date(&self, child_id: &str, date: NaiveDate) -> Result<Vec<SleepLog>>;

    /// The most recently created sleep log for a child
    async fn get_latest_sleep_log(&self, child_id: &str) -> Result<Option<SleepLog>>;

    /// Delete a sleep log
    /// Returns true if the log was found and deleted, false otherwise
    async fn delete_sleep_log(&self, child_id: &str, log_id: &str) -> Result<bool>;
}

/// Trait defining the interface for daily summary storage operations
#[async_trait]
pub trait DailySummaryStorage: Send + Sync {
    /// Write a summary, fully replacing any summary with the same ID
    async fn upsert_daily_summary(&self, summary: &DailySummary) -> Result<()>;

    async fn get_daily_summary(&self, child_id: &str, date: NaiveDate) -> Result<Option<DailySummary>>;

    /// Summaries between two dates (inclusive), ordered by date ascending
    async fn list_daily_summaries(
        &self,
        child_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailySummary>>;
}

/// Trait defining the interface for storage connections
///
/// This trait abstracts away the specific connection type and provides
/// factory methods for creating repositories, so the domain layer can work
/// with any storage backend without knowing the implementation details.
pub trait Connection: Send + Sync + Clone + 'static {
    type SleepLogRepository: SleepLogStorage + Clone + 'static;
    type DailySummaryRepository: DailySummaryStorage + Clone + 'static;

    fn create_sleep_log_repository(&self) -> Self::SleepLogRepository;

    fn create_daily_summary_repository(&self) -> Self::DailySummaryRepository;
}
