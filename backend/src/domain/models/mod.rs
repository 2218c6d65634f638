pub mod daily_summary;
pub mod sleep_log;

pub use daily_summary::{DailySummary, CALCULATION_VERSION};
pub use sleep_log::{parse_child_timezone, LogSnapshot, SleepEvent, SleepLog, SleepLogError};
