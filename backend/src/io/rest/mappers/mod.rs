//! Conversions between the `shared` DTOs and domain types.

pub mod daily_summary_mapper;
pub mod sleep_log_mapper;

pub use daily_summary_mapper::DailySummaryMapper;
pub use sleep_log_mapper::SleepLogMapper;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MappingError {
    #[error("Invalid timestamp '{0}', expected RFC 3339 with offset")]
    InvalidTimestamp(String),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Unknown timezone '{0}', expected an IANA zone name")]
    InvalidTimezone(String),
}
