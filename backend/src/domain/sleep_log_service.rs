//! Sleep log lifecycle: start a session, append events until `out_of_bed`
//! closes it, or delete it. Every mutation is followed by a recomputation of
//! the daily summaries it touches; a failed recomputation is logged and
//! reported but never undoes the mutation.

use anyhow::Result;
use chrono::Utc;
use shared::SleepEventType;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::sleep_logs::{
    AppendSleepEventCommand, CreateSleepLogCommand, DeleteSleepLogCommand, DeleteSleepLogResult,
    SleepLogListQuery, SleepLogMutationResult,
};
use crate::domain::commands::LogChangeResult;
use crate::domain::daily_summary_service::DailySummaryService;
use crate::domain::models::{parse_child_timezone, LogSnapshot, SleepEvent, SleepLog, SleepLogError};
use crate::storage::{Connection, SleepLogStorage};

#[derive(Clone)]
pub struct SleepLogService<C: Connection> {
    sleep_log_repository: C::SleepLogRepository,
    daily_summary_service: DailySummaryService<C>,
}

impl<C: Connection> SleepLogService<C> {
    pub fn new(connection: Arc<C>, daily_summary_service: DailySummaryService<C>) -> Self {
        Self {
            sleep_log_repository: connection.create_sleep_log_repository(),
            daily_summary_service,
        }
    }

    /// Start a session with its initial `put_in_bed` event. The session is
    /// filed under the date of that event on the child's wall clock for its
    /// whole life.
    pub async fn create_sleep_log(&self, command: CreateSleepLogCommand) -> Result<SleepLogMutationResult> {
        if command.child_id.trim().is_empty() {
            return Err(SleepLogError::InvalidEvent("child id is required".to_string()).into());
        }
        if command.child_timezone.trim().is_empty() {
            return Err(SleepLogError::InvalidEvent("child timezone is required".to_string()).into());
        }
        let timezone = parse_child_timezone(&command.child_timezone)?;

        let now = Utc::now();
        let first_event = SleepEvent::new(SleepEventType::PutInBed, command.put_in_bed_at).in_timezone(&timezone);
        let sleep_log = SleepLog {
            id: SleepLog::generate_id(&command.child_id),
            child_id: command.child_id,
            child_timezone: timezone.name().to_string(),
            sleep_type: command.sleep_type,
            local_date: first_event.local_date(),
            events: vec![first_event],
            created_at: now,
            updated_at: now,
        };

        self.sleep_log_repository.store_sleep_log(&sleep_log).await?;
        info!(
            "Started {} sleep log {} for child {} on {}",
            sleep_log.sleep_type, sleep_log.id, sleep_log.child_id, sleep_log.local_date
        );

        let recompute = self.notify_change(None, Some(&sleep_log.to_snapshot())).await;
        Ok(SleepLogMutationResult { sleep_log, recompute })
    }

    /// Append one event to an open session
    pub async fn append_event(&self, command: AppendSleepEventCommand) -> Result<SleepLogMutationResult> {
        let Some(existing) = self
            .sleep_log_repository
            .get_sleep_log(&command.child_id, &command.log_id)
            .await?
        else {
            return Err(SleepLogError::NotFound(command.log_id).into());
        };

        if existing.is_complete() {
            return Err(SleepLogError::SessionComplete(existing.id).into());
        }
        if command.event.event_type == SleepEventType::PutInBed {
            return Err(SleepLogError::InvalidEvent(
                "put_in_bed can only start a session".to_string(),
            )
            .into());
        }
        if let Some(last) = existing.last_event() {
            if command.event.instant() < last.instant() {
                warn!(
                    "Event {} for sleep log {} is earlier than the latest event; statistics sort events by time",
                    command.event.event_type, existing.id
                );
            }
        }

        let timezone = parse_child_timezone(&existing.child_timezone)?;
        let mut updated = existing.clone();
        updated.events.push(command.event.in_timezone(&timezone));
        updated.updated_at = Utc::now();

        self.sleep_log_repository.store_sleep_log(&updated).await?;
        info!(
            "Appended event to sleep log {} ({} events, complete: {})",
            updated.id,
            updated.events.len(),
            updated.is_complete()
        );

        let recompute = self
            .notify_change(Some(&existing.to_snapshot()), Some(&updated.to_snapshot()))
            .await;
        Ok(SleepLogMutationResult {
            sleep_log: updated,
            recompute,
        })
    }

    pub async fn delete_sleep_log(&self, command: DeleteSleepLogCommand) -> Result<DeleteSleepLogResult> {
        let Some(existing) = self
            .sleep_log_repository
            .get_sleep_log(&command.child_id, &command.log_id)
            .await?
        else {
            info!("Sleep log {} not found, nothing to delete", command.log_id);
            return Ok(DeleteSleepLogResult {
                deleted: false,
                recompute: LogChangeResult::default(),
            });
        };

        let deleted = self
            .sleep_log_repository
            .delete_sleep_log(&command.child_id, &command.log_id)
            .await?;

        let recompute = if deleted {
            self.notify_change(Some(&existing.to_snapshot()), None).await
        } else {
            LogChangeResult::default()
        };
        Ok(DeleteSleepLogResult { deleted, recompute })
    }

    pub async fn list_sleep_logs(&self, query: SleepLogListQuery) -> Result<Vec<SleepLog>> {
        self.sleep_log_repository
            .list_sleep_logs_for_date(&query.child_id, query.date)
            .await
    }

    async fn notify_change(&self, before: Option<&LogSnapshot>, after: Option<&LogSnapshot>) -> LogChangeResult {
        let result = self.daily_summary_service.handle_log_change(before, after).await;
        let failed = result.failed_dates();
        if !failed.is_empty() {
            warn!("Summary recomputation failed for dates {:?}; the log change itself was saved", failed);
        }
        result
    }
}
