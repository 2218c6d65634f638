use chrono::{DateTime, FixedOffset};
use shared::{
    LogSnapshot as SharedLogSnapshot, LogType, SleepEvent as SharedSleepEvent, SleepLog as SharedSleepLog,
};

use super::MappingError;
use crate::domain::date_impact::{format_date, parse_date};
use crate::domain::models::{parse_child_timezone, LogSnapshot, SleepEvent, SleepLog};

pub struct SleepLogMapper;

impl SleepLogMapper {
    pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, MappingError> {
        DateTime::parse_from_rfc3339(value.trim())
            .map_err(|_| MappingError::InvalidTimestamp(value.to_string()))
    }

    /// Convert a shared SleepEvent DTO to a domain SleepEvent
    pub fn event_to_domain(dto: SharedSleepEvent) -> Result<SleepEvent, MappingError> {
        let local_timestamp = Self::parse_timestamp(&dto.local_timestamp)?;
        Ok(SleepEvent::new(dto.event_type, local_timestamp))
    }

    pub fn event_to_dto(domain: &SleepEvent) -> SharedSleepEvent {
        SharedSleepEvent {
            event_type: domain.event_type,
            local_timestamp: domain.local_timestamp.to_rfc3339(),
        }
    }

    /// Convert a domain SleepLog to the shared SleepLog DTO
    pub fn to_dto(domain: SleepLog) -> SharedSleepLog {
        let is_complete = domain.is_complete();
        SharedSleepLog {
            id: domain.id,
            child_id: domain.child_id,
            child_timezone: domain.child_timezone,
            sleep_type: domain.sleep_type,
            local_date: format_date(domain.local_date),
            events: domain.events.iter().map(Self::event_to_dto).collect(),
            is_complete,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn to_dto_list(domain_logs: Vec<SleepLog>) -> Vec<SharedSleepLog> {
        domain_logs.into_iter().map(Self::to_dto).collect()
    }

    /// Convert a change-trigger snapshot DTO to the domain snapshot
    pub fn snapshot_to_domain(dto: SharedLogSnapshot) -> Result<LogSnapshot, MappingError> {
        let local_date = match dto.local_date {
            Some(value) => Some(parse_date(&value).ok_or(MappingError::InvalidDate(value))?),
            None => None,
        };
        let mut events = dto
            .events
            .into_iter()
            .map(Self::event_to_domain)
            .collect::<Result<Vec<_>, _>>()?;

        if dto.log_type == LogType::Sleep {
            let tz = parse_child_timezone(&dto.child_timezone)
                .map_err(|_| MappingError::InvalidTimezone(dto.child_timezone.clone()))?;
            events = events.iter().map(|event| event.in_timezone(&tz)).collect();
        }

        Ok(LogSnapshot {
            log_type: dto.log_type,
            local_date,
            sleep_type: dto.sleep_type,
            events,
            child_id: dto.child_id,
            child_timezone: dto.child_timezone,
        })
    }
}
