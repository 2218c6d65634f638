//! Millisecond → minute conversion and human-readable duration strings
//! used by the daily summary fields.

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Round an elapsed millisecond value to the nearest whole minute
pub fn ms_to_minutes(ms: i64) -> i64 {
    (ms as f64 / MILLIS_PER_MINUTE).round() as i64
}

/// Mean of `count` durations totalling `total_ms`, in rounded minutes.
/// Zero when there is nothing to average.
pub fn average_minutes(total_ms: i64, count: u32) -> i64 {
    if count == 0 {
        return 0;
    }
    (total_ms as f64 / count as f64 / MILLIS_PER_MINUTE).round() as i64
}

/// `"{h}h {m}m"`, dropping a zero hour or zero minute component. A zero
/// duration keeps both, as `"0h 0m"`.
pub fn format_hours_minutes(total_minutes: i64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if total_minutes == 0 {
        "0h 0m".to_string()
    } else if hours == 0 {
        format!("{}m", minutes)
    } else if minutes == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}m", hours, minutes)
    }
}

/// Minutes only, no hour component
pub fn format_minutes(total_minutes: i64) -> String {
    format!("{}m", total_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_to_minutes_rounds_to_nearest() {
        assert_eq!(ms_to_minutes(0), 0);
        assert_eq!(ms_to_minutes(29_999), 0);
        assert_eq!(ms_to_minutes(30_000), 1);
        assert_eq!(ms_to_minutes(600 * 60_000), 600);
        assert_eq!(ms_to_minutes(90_000), 2);
    }

    #[test]
    fn test_average_minutes() {
        assert_eq!(average_minutes(0, 0), 0);
        assert_eq!(average_minutes(10 * 60_000, 0), 0);
        assert_eq!(average_minutes(25 * 60_000, 2), 13);
        assert_eq!(average_minutes(30 * 60_000, 3), 10);
    }

    #[test]
    fn test_format_hours_minutes() {
        assert_eq!(format_hours_minutes(0), "0h 0m");
        assert_eq!(format_hours_minutes(1), "1m");
        assert_eq!(format_hours_minutes(45), "45m");
        assert_eq!(format_hours_minutes(600), "10h");
        assert_eq!(format_hours_minutes(440), "7h 20m");
    }

    #[test]
    fn test_format_minutes_has_no_hours() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(95), "95m");
    }
}
