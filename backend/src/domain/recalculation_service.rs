//! Manual (bulk) recalculation of daily summaries over a date range.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::recalculation::{RecalculateSummariesCommand, RecalculateSummariesResult};
use crate::domain::daily_summary_service::DailySummaryService;
use crate::domain::date_impact::{date_range, parse_date};
use crate::storage::{Connection, SleepLogStorage};

/// Longest range one manual recalculation may cover, in days
pub const MAX_RECALCULATION_DAYS: i64 = 366;

#[derive(Debug, thiserror::Error)]
pub enum RecalculationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Date range of {days} days exceeds the maximum of {max}")]
    RangeTooLarge { days: i64, max: i64 },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct RecalculationService<C: Connection> {
    sleep_log_repository: C::SleepLogRepository,
    daily_summary_service: DailySummaryService<C>,
}

impl<C: Connection> RecalculationService<C> {
    pub fn new(connection: Arc<C>, daily_summary_service: DailySummaryService<C>) -> Self {
        Self {
            sleep_log_repository: connection.create_sleep_log_repository(),
            daily_summary_service,
        }
    }

    /// Recompute every date from `start_date` to `end_date` inclusive.
    ///
    /// The child's timezone is taken from their most recently created sleep
    /// log; a child without any sleep logs yields `success: false` rather
    /// than an error.
    pub async fn recalculate_summaries(
        &self,
        command: RecalculateSummariesCommand,
    ) -> Result<RecalculateSummariesResult, RecalculationError> {
        let child_id = required(command.child_id, "childId")?;
        let start_raw = required(command.start_date, "startDate")?;
        let end_raw = required(command.end_date, "endDate")?;
        let start_date = parse_param_date(&start_raw)?;
        let end_date = parse_param_date(&end_raw)?;

        let days = (end_date - start_date).num_days() + 1;
        if days > MAX_RECALCULATION_DAYS {
            return Err(RecalculationError::RangeTooLarge {
                days,
                max: MAX_RECALCULATION_DAYS,
            });
        }

        info!(
            "Manual recalculation requested for child {} from {} to {}",
            child_id, start_date, end_date
        );

        let Some(latest) = self.sleep_log_repository.get_latest_sleep_log(&child_id).await? else {
            warn!("No sleep logs found for child {}, cannot determine timezone", child_id);
            return Ok(RecalculateSummariesResult {
                success: false,
                message: format!(
                    "No sleep logs found for child {}; timezone cannot be determined",
                    child_id
                ),
                dates_processed: 0,
                outcomes: Vec::new(),
            });
        };

        let dates: Vec<NaiveDate> = date_range(start_date, end_date);
        let outcomes = self
            .daily_summary_service
            .recompute_dates(&child_id, &latest.child_timezone, &dates)
            .await;

        let dates_processed = outcomes.iter().filter(|outcome| outcome.is_success()).count();
        let failed: Vec<String> = outcomes
            .iter()
            .filter(|outcome| !outcome.is_success())
            .map(|outcome| outcome.date.to_string())
            .collect();

        let (success, message) = if failed.is_empty() {
            (
                true,
                format!("Recalculated {} daily summaries for child {}", dates_processed, child_id),
            )
        } else {
            (
                false,
                format!(
                    "Recalculated {} of {} daily summaries for child {}; failed dates: {}",
                    dates_processed,
                    dates.len(),
                    child_id,
                    failed.join(", ")
                ),
            )
        };

        info!("{}", message);
        Ok(RecalculateSummariesResult {
            success,
            message,
            dates_processed,
            outcomes,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, RecalculationError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(RecalculationError::MissingParameter(name)),
    }
}

fn parse_param_date(value: &str) -> Result<NaiveDate, RecalculationError> {
    parse_date(value).ok_or_else(|| RecalculationError::InvalidDate(value.to_string()))
}
