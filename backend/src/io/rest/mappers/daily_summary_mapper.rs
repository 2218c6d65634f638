use shared::{
    DailySummary as SharedDailySummary, DateRecomputeOutcome as SharedDateRecomputeOutcome,
    LogChangeResponse, RecalculateSummariesRequest, RecalculateSummariesResponse,
};

use crate::domain::commands::recalculation::{RecalculateSummariesCommand, RecalculateSummariesResult};
use crate::domain::commands::{DateRecomputeOutcome, LogChangeResult};
use crate::domain::date_impact::format_date;
use crate::domain::models::DailySummary;

pub struct DailySummaryMapper;

impl DailySummaryMapper {
    /// Convert a domain DailySummary to the shared DTO
    pub fn to_dto(domain: DailySummary) -> SharedDailySummary {
        SharedDailySummary {
            id: domain.id,
            child_id: domain.child_id,
            date: format_date(domain.date),
            timezone: domain.timezone,
            total_sleep: domain.total_sleep,
            total_sleep_minutes: domain.total_sleep_minutes,
            total_awake_in_bed: domain.total_awake_in_bed,
            total_awake_in_bed_minutes: domain.total_awake_in_bed_minutes,
            longest_stretch: domain.longest_stretch,
            longest_stretch_minutes: domain.longest_stretch_minutes,
            wake_ups: domain.wake_ups,
            time_to_fall_asleep: domain.time_to_fall_asleep,
            time_to_fall_asleep_minutes: domain.time_to_fall_asleep_minutes,
            average_wake_up_length: domain.average_wake_up_length,
            average_wake_up_length_minutes: domain.average_wake_up_length_minutes,
            source_log_ids: domain.source_log_ids,
            calculation_version: domain.calculation_version,
            last_updated: domain.last_updated.to_rfc3339(),
        }
    }

    pub fn to_dto_list(domain_summaries: Vec<DailySummary>) -> Vec<SharedDailySummary> {
        domain_summaries.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_recalculate_command(request: RecalculateSummariesRequest) -> RecalculateSummariesCommand {
        RecalculateSummariesCommand {
            child_id: request.child_id,
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }

    pub fn to_recalculate_response(result: RecalculateSummariesResult) -> RecalculateSummariesResponse {
        RecalculateSummariesResponse {
            success: result.success,
            message: result.message,
            dates_processed: result.dates_processed,
        }
    }

    pub fn outcome_to_dto(outcome: DateRecomputeOutcome) -> SharedDateRecomputeOutcome {
        SharedDateRecomputeOutcome {
            date: format_date(outcome.date),
            success: outcome.is_success(),
            error: outcome.error,
        }
    }

    pub fn to_log_change_response(result: LogChangeResult) -> LogChangeResponse {
        LogChangeResponse {
            affected_dates: result.affected_dates.into_iter().map(format_date).collect(),
            outcomes: result.outcomes.into_iter().map(Self::outcome_to_dto).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::date_impact::parse_date;

    #[test]
    fn test_to_dto_formats_dates() {
        let summary = DailySummary::empty("c1", parse_date("2024-02-01").unwrap(), "UTC");
        let dto = DailySummaryMapper::to_dto(summary);
        assert_eq!(dto.date, "2024-02-01");
        assert_eq!(dto.id, "child_c1_date_2024-02-01");
        assert_eq!(dto.total_sleep, "0h 0m");
    }

    #[test]
    fn test_log_change_response() {
        let result = LogChangeResult {
            affected_dates: vec![parse_date("2024-01-15").unwrap(), parse_date("2024-01-16").unwrap()],
            outcomes: vec![
                DateRecomputeOutcome { date: parse_date("2024-01-15").unwrap(), error: None },
                DateRecomputeOutcome {
                    date: parse_date("2024-01-16").unwrap(),
                    error: Some("write failed".to_string()),
                },
            ],
        };
        let response = DailySummaryMapper::to_log_change_response(result);
        assert_eq!(response.affected_dates, vec!["2024-01-15", "2024-01-16"]);
        assert!(response.outcomes[0].success);
        assert!(!response.outcomes[1].success);
        assert_eq!(response.outcomes[1].error.as_deref(), Some("write failed"));
    }
}
