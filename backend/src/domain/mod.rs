//! # Domain Module
//!
//! Contains all business logic for the sleep tracker backend.
//!
//! ## Module Organization
//!
//! - **session_stats**: Elapsed-time metrics for a single sleep session
//! - **daily_summary_service**: Aggregation of a day's sessions into one summary,
//!   and concurrent recomputation of affected dates
//! - **date_impact**: Which calendar dates a log change touches; date ranges
//! - **recalculation_service**: Manual recalculation over a date range
//! - **sleep_log_service**: Session lifecycle (start, append, delete)
//! - **duration_format**: Minute rounding and display strings
//!
//! ## Core Concepts
//!
//! - **Session (sleep log)**: One nap or bedtime period, an ordered event list
//! - **Segment**: The interval between two consecutive events of a session
//! - **Stretch**: An unbroken run of asleep segments
//! - **Daily summary**: Per-child, per-date aggregate of all qualifying sessions
//!
//! ## Business Rules
//!
//! - A session needs at least two events to contribute to a summary
//! - Elapsed time is measured between absolute instants; calendar dates come
//!   from the child's local wall-clock time
//! - Summaries are always recomputed in full and overwritten by key
//! - A bedtime session crossing local midnight also affects the next date

pub mod commands;
pub mod daily_summary_service;
pub mod date_impact;
pub mod duration_format;
pub mod models;
pub mod recalculation_service;
pub mod session_stats;
pub mod sleep_log_service;

pub use commands::*;
pub use daily_summary_service::{aggregate_daily_summary, DailySummaryService};
pub use recalculation_service::{RecalculationError, RecalculationService};
pub use session_stats::{calculate_session_stats, SessionStats};
pub use sleep_log_service::SleepLogService;
