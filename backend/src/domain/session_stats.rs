//! Session statistics calculator.
//!
//! Turns one sleep session's event list into elapsed-time metrics. The
//! calculation is pure and never fails: malformed input (too few events,
//! odd orderings, stray `out_of_bed` markers) degrades to zero or partial
//! metrics instead of an error.
//!
//! ## Segments
//!
//! After sorting by instant, every adjacent pair of events `(current, next)`
//! forms a segment. The type of `current` decides where the segment goes:
//!
//! - `fell_asleep` → asleep time, extends the running stretch
//! - `put_in_bed` → awake-in-bed time
//! - `woke_up` → awake-in-bed time **and** one wake-up with its duration
//! - `out_of_bed` → neither (counted as "other")

use shared::{SleepEventType, SleepType};

use crate::domain::models::SleepEvent;

/// Elapsed-time metrics for a single session, all in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub asleep_ms: i64,
    pub awake_in_bed_ms: i64,
    /// Segments that are neither asleep nor awake in bed
    pub other_ms: i64,
    pub wake_up_count: u32,
    pub wake_up_ms: i64,
    pub longest_stretch_ms: i64,
    /// Only computed for bedtime sessions
    pub time_to_fall_asleep_ms: Option<i64>,
    /// False when the session has fewer than two events and must not be
    /// listed as a source of the daily summary
    pub qualifies: bool,
}

/// Derive statistics for one session's events.
pub fn calculate_session_stats(events: &[SleepEvent], sleep_type: SleepType) -> SessionStats {
    if events.len() < 2 {
        return SessionStats::default();
    }

    let mut sorted: Vec<&SleepEvent> = events.iter().collect();
    sorted.sort_by_key(|event| event.instant());

    let mut stats = SessionStats {
        qualifies: true,
        ..SessionStats::default()
    };
    let mut current_stretch_ms = 0_i64;

    for pair in sorted.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        let segment_ms = segment_length_ms(current, next);

        match current.event_type {
            SleepEventType::FellAsleep => {
                stats.asleep_ms += segment_ms;
                current_stretch_ms += segment_ms;
            }
            SleepEventType::PutInBed => {
                stats.awake_in_bed_ms += segment_ms;
                close_stretch(&mut stats, &mut current_stretch_ms);
            }
            SleepEventType::WokeUp => {
                stats.awake_in_bed_ms += segment_ms;
                stats.wake_up_count += 1;
                stats.wake_up_ms += segment_ms;
                close_stretch(&mut stats, &mut current_stretch_ms);
            }
            SleepEventType::OutOfBed => {
                stats.other_ms += segment_ms;
                close_stretch(&mut stats, &mut current_stretch_ms);
            }
        }
    }

    // Session may still be in progress while asleep
    close_stretch(&mut stats, &mut current_stretch_ms);

    if sleep_type == SleepType::Bedtime {
        stats.time_to_fall_asleep_ms = time_to_fall_asleep_ms(&sorted);
    }

    stats
}

/// Gap between the first `put_in_bed` and the first `fell_asleep` of a
/// chronologically sorted event list.
fn time_to_fall_asleep_ms(sorted: &[&SleepEvent]) -> Option<i64> {
    let put_in_bed = sorted
        .iter()
        .find(|event| event.event_type == SleepEventType::PutInBed)?;
    let fell_asleep = sorted
        .iter()
        .find(|event| event.event_type == SleepEventType::FellAsleep)?;

    Some(segment_length_ms(put_in_bed, fell_asleep))
}

/// Negative lengths count as zero
fn segment_length_ms(current: &SleepEvent, next: &SleepEvent) -> i64 {
    (next.instant() - current.instant()).num_milliseconds().max(0)
}

fn close_stretch(stats: &mut SessionStats, current_stretch_ms: &mut i64) {
    if *current_stretch_ms > stats.longest_stretch_ms {
        stats.longest_stretch_ms = *current_stretch_ms;
    }
    *current_stretch_ms = 0;
}
