//! Daily summary aggregation for the sleep tracker.
//!
//! A daily summary is always rebuilt from the complete set of sleep logs
//! filed under one (child, date) and written back as a full replacement, so
//! recomputation is idempotent and independent dates can be processed
//! concurrently without coordination.
//!
//! ## Aggregation rules
//!
//! - Sessions with fewer than two events are skipped and not listed as sources
//! - Asleep, awake-in-bed, wake-up counts and wake-up durations are summed
//! - The longest stretch is the maximum across sessions, not a sum
//! - Time to fall asleep comes from the earliest bedtime session that has one
//! - Average wake-up length is total wake-up time over wake-up count

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use shared::SleepType;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::commands::{DateRecomputeOutcome, LogChangeResult};
use crate::domain::date_impact::affected_dates;
use crate::domain::duration_format::{average_minutes, format_hours_minutes, format_minutes, ms_to_minutes};
use crate::domain::models::{DailySummary, LogSnapshot, SleepLog, CALCULATION_VERSION};
use crate::domain::session_stats::calculate_session_stats;
use crate::storage::{Connection, DailySummaryStorage, SleepLogStorage};

#[derive(Debug, Default)]
struct DailyTotals {
    asleep_ms: i64,
    awake_in_bed_ms: i64,
    wake_up_count: u32,
    wake_up_ms: i64,
    longest_stretch_ms: i64,
    time_to_fall_asleep_ms: Option<i64>,
    source_log_ids: Vec<String>,
}

/// Build the summary for one child and date from every session filed there.
///
/// Sessions are visited in chronological order of their first event (ties
/// broken by ID), so the result does not depend on the order storage
/// returned them in.
pub fn aggregate_daily_summary(
    child_id: &str,
    date: NaiveDate,
    timezone: &str,
    sessions: &[SleepLog],
) -> DailySummary {
    let mut ordered: Vec<&SleepLog> = sessions.iter().collect();
    ordered.sort_by(|a, b| {
        session_start(a)
            .cmp(&session_start(b))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut totals = DailyTotals::default();
    for session in ordered {
        let stats = calculate_session_stats(&session.events, session.sleep_type);
        if !stats.qualifies {
            continue;
        }

        totals.asleep_ms += stats.asleep_ms;
        totals.awake_in_bed_ms += stats.awake_in_bed_ms;
        totals.wake_up_count += stats.wake_up_count;
        totals.wake_up_ms += stats.wake_up_ms;
        totals.longest_stretch_ms = totals.longest_stretch_ms.max(stats.longest_stretch_ms);

        if session.sleep_type == SleepType::Bedtime && totals.time_to_fall_asleep_ms.is_none() {
            totals.time_to_fall_asleep_ms = stats.time_to_fall_asleep_ms;
        }

        totals.source_log_ids.push(session.id.clone());
    }

    if totals.source_log_ids.is_empty() {
        return DailySummary::empty(child_id, date, timezone);
    }

    let total_sleep_minutes = ms_to_minutes(totals.asleep_ms);
    let total_awake_in_bed_minutes = ms_to_minutes(totals.awake_in_bed_ms);
    let longest_stretch_minutes = ms_to_minutes(totals.longest_stretch_ms);
    let time_to_fall_asleep_minutes = ms_to_minutes(totals.time_to_fall_asleep_ms.unwrap_or(0));
    let average_wake_up_length_minutes = average_minutes(totals.wake_up_ms, totals.wake_up_count);

    DailySummary {
        id: DailySummary::generate_id(child_id, date),
        child_id: child_id.to_string(),
        date,
        timezone: timezone.to_string(),
        total_sleep: format_hours_minutes(total_sleep_minutes),
        total_sleep_minutes,
        total_awake_in_bed: format_hours_minutes(total_awake_in_bed_minutes),
        total_awake_in_bed_minutes,
        longest_stretch: format_hours_minutes(longest_stretch_minutes),
        longest_stretch_minutes,
        wake_ups: totals.wake_up_count,
        time_to_fall_asleep: format_minutes(time_to_fall_asleep_minutes),
        time_to_fall_asleep_minutes,
        average_wake_up_length: format_minutes(average_wake_up_length_minutes),
        average_wake_up_length_minutes,
        source_log_ids: totals.source_log_ids,
        calculation_version: CALCULATION_VERSION,
        last_updated: Utc::now(),
    }
}

fn session_start(session: &SleepLog) -> Option<DateTime<Utc>> {
    session.events.iter().map(|event| event.instant()).min()
}

/// Service that recomputes and serves daily summaries
#[derive(Clone)]
pub struct DailySummaryService<C: Connection> {
    sleep_log_repository: C::SleepLogRepository,
    daily_summary_repository: C::DailySummaryRepository,
}

impl<C: Connection> DailySummaryService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            sleep_log_repository: connection.create_sleep_log_repository(),
            daily_summary_repository: connection.create_daily_summary_repository(),
        }
    }

    /// Rebuild and overwrite the summary for one (child, date).
    ///
    /// Failures are logged with the child and date and returned to the caller.
    pub async fn recompute_for_date(
        &self,
        child_id: &str,
        date: NaiveDate,
        timezone: &str,
    ) -> Result<DailySummary> {
        let result = self.rebuild_summary(child_id, date, timezone).await;
        match &result {
            Ok(summary) => info!(
                "Recomputed daily summary for child {} on {}: {} sources, {}m asleep",
                child_id,
                date,
                summary.source_log_ids.len(),
                summary.total_sleep_minutes
            ),
            Err(e) => error!(
                "Failed to recompute daily summary for child {} on {}: {:#}",
                child_id, date, e
            ),
        }
        result
    }

    async fn rebuild_summary(&self, child_id: &str, date: NaiveDate, timezone: &str) -> Result<DailySummary> {
        let sessions = self
            .sleep_log_repository
            .list_sleep_logs_for_date(child_id, date)
            .await
            .with_context(|| format!("Failed to load sleep logs for {} on {}", child_id, date))?;

        let summary = aggregate_daily_summary(child_id, date, timezone, &sessions);

        self.daily_summary_repository
            .upsert_daily_summary(&summary)
            .await
            .with_context(|| format!("Failed to write daily summary {}", summary.id))?;

        Ok(summary)
    }

    /// Recompute several dates concurrently. One date failing never stops
    /// the others; every date gets its own outcome.
    pub async fn recompute_dates(
        &self,
        child_id: &str,
        timezone: &str,
        dates: &[NaiveDate],
    ) -> Vec<DateRecomputeOutcome> {
        let recomputations = dates.iter().map(|&date| async move {
            let error = self
                .recompute_for_date(child_id, date, timezone)
                .await
                .err()
                .map(|e| format!("{:#}", e));
            DateRecomputeOutcome { date, error }
        });

        let outcomes = join_all(recomputations).await;

        let failures = outcomes.iter().filter(|outcome| !outcome.is_success()).count();
        if failures > 0 {
            warn!(
                "{} of {} daily summary recomputations failed for child {}",
                failures,
                outcomes.len(),
                child_id
            );
        }
        outcomes
    }

    /// React to a sleep log being created, updated or deleted by recomputing
    /// every date the change touches.
    pub async fn handle_log_change(
        &self,
        before: Option<&LogSnapshot>,
        after: Option<&LogSnapshot>,
    ) -> LogChangeResult {
        let dates: Vec<NaiveDate> = affected_dates(before, after).into_iter().collect();
        let Some(owner) = after.or(before) else {
            return LogChangeResult::default();
        };

        if dates.is_empty() {
            info!("Log change for child {} touches no sleep summaries", owner.child_id);
            return LogChangeResult::default();
        }

        info!(
            "Log change for child {} affects {} date(s): {:?}",
            owner.child_id,
            dates.len(),
            dates
        );

        let outcomes = self
            .recompute_dates(&owner.child_id, &owner.child_timezone, &dates)
            .await;

        LogChangeResult {
            affected_dates: dates,
            outcomes,
        }
    }

    pub async fn get_daily_summary(&self, child_id: &str, date: NaiveDate) -> Result<Option<DailySummary>> {
        self.daily_summary_repository.get_daily_summary(child_id, date).await
    }

    pub async fn list_daily_summaries(
        &self,
        child_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailySummary>> {
        self.daily_summary_repository
            .list_daily_summaries(child_id, start_date, end_date)
            .await
    }
}
