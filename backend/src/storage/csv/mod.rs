//! # CSV Storage Module
//!
//! File-based storage for sleep logs and daily summaries. Every child gets
//! a directory under the data directory; sleep logs are kept in YAML (they
//! nest an event list) and summaries in CSV (one flat row per date).
//!
//! ## Features
//!
//! - Per-child files, so one child's data never touches another's
//! - Atomic rewrites through a temp file and rename
//! - Connection-wide write lock around every read-modify-write cycle

pub mod connection;
pub mod daily_summary_repository;
pub mod sleep_log_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::CsvConnection;
pub use daily_summary_repository::DailySummaryRepository;
pub use sleep_log_repository::SleepLogRepository;
