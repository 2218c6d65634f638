//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer is responsible for mapping the
//! public DTOs defined in the `shared` crate to these internal types.

use chrono::NaiveDate;

/// Outcome of recomputing one date's summary inside a batch
#[derive(Debug, Clone, PartialEq)]
pub struct DateRecomputeOutcome {
    pub date: NaiveDate,
    pub error: Option<String>,
}

impl DateRecomputeOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of reacting to one sleep log change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogChangeResult {
    pub affected_dates: Vec<NaiveDate>,
    pub outcomes: Vec<DateRecomputeOutcome>,
}

impl LogChangeResult {
    pub fn failed_dates(&self) -> Vec<NaiveDate> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.is_success())
            .map(|outcome| outcome.date)
            .collect()
    }
}

pub mod recalculation {
    use super::DateRecomputeOutcome;

    /// Input for a manual recalculation over a date range.
    #[derive(Debug, Clone, Default)]
    pub struct RecalculateSummariesCommand {
        pub child_id: Option<String>,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
    }

    /// Result of a manual recalculation.
    #[derive(Debug, Clone)]
    pub struct RecalculateSummariesResult {
        pub success: bool,
        pub message: String,
        /// Dates whose summaries were written
        pub dates_processed: usize,
        pub outcomes: Vec<DateRecomputeOutcome>,
    }
}

pub mod sleep_logs {
    use super::LogChangeResult;
    use crate::domain::models::{SleepEvent, SleepLog};
    use chrono::{DateTime, FixedOffset, NaiveDate};
    use shared::SleepType;

    /// Input for starting a new sleep session.
    #[derive(Debug, Clone)]
    pub struct CreateSleepLogCommand {
        pub child_id: String,
        pub child_timezone: String,
        pub sleep_type: SleepType,
        pub put_in_bed_at: DateTime<FixedOffset>,
    }

    /// Input for appending one event to an open session.
    #[derive(Debug, Clone)]
    pub struct AppendSleepEventCommand {
        pub child_id: String,
        pub log_id: String,
        pub event: SleepEvent,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteSleepLogCommand {
        pub child_id: String,
        pub log_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct SleepLogListQuery {
        pub child_id: String,
        pub date: NaiveDate,
    }

    /// A mutated sleep log together with the summary recomputation it caused.
    #[derive(Debug, Clone)]
    pub struct SleepLogMutationResult {
        pub sleep_log: SleepLog,
        pub recompute: LogChangeResult,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteSleepLogResult {
        pub deleted: bool,
        pub recompute: LogChangeResult,
    }
}
