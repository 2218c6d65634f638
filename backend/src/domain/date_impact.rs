//! Calendar-date bookkeeping for sleep summaries.
//!
//! Decides which dates a changed sleep log touches, and walks inclusive
//! date ranges for bulk recalculation. All dates are plain calendar dates
//! built from year/month/day components, so no timezone conversion can
//! shift them.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use shared::{LogType, SleepType};

use crate::domain::models::{parse_child_timezone, LogSnapshot};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Dates whose summaries must be recomputed after a log changed from
/// `before` to `after`. Either side is `None` for creates and deletes.
pub fn affected_dates(before: Option<&LogSnapshot>, after: Option<&LogSnapshot>) -> BTreeSet<NaiveDate> {
    let mut dates = BTreeSet::new();
    for snapshot in [before, after].into_iter().flatten() {
        dates.extend(dates_for_snapshot(snapshot));
    }
    dates
}

/// The filing date of a sleep log, plus the following day when a bedtime
/// session runs past local midnight.
pub fn dates_for_snapshot(snapshot: &LogSnapshot) -> Vec<NaiveDate> {
    if snapshot.log_type != LogType::Sleep {
        return Vec::new();
    }
    let Some(local_date) = snapshot.local_date else {
        return Vec::new();
    };

    let mut dates = vec![local_date];
    if snapshot.sleep_type == Some(SleepType::Bedtime) && spans_midnight(snapshot) {
        if let Some(next) = local_date.succ_opt() {
            dates.push(next);
        }
    }
    dates
}

/// True when the earliest and latest events fall on different days of the
/// child's wall clock. An unparseable zone falls back to the offsets the
/// timestamps carry.
fn spans_midnight(snapshot: &LogSnapshot) -> bool {
    let first = snapshot.events.iter().min_by_key(|event| event.instant());
    let last = snapshot.events.iter().max_by_key(|event| event.instant());
    let (Some(first), Some(last)) = (first, last) else {
        return false;
    };

    match parse_child_timezone(&snapshot.child_timezone) {
        Ok(tz) => first.local_date_in(&tz) != last.local_date_in(&tz),
        Err(_) => first.local_date() != last.local_date(),
    }
}

/// Every calendar date from `start` to `end`, inclusive. Empty when
/// `start` is after `end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}
