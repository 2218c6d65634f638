//! # REST API for Sleep Logs
//!
//! Endpoints for starting sessions, appending events, deleting sessions, and
//! the change-trigger entry point used by external log writers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use tracing::{error, info};

use super::mappers::{DailySummaryMapper, SleepLogMapper};
use crate::domain::commands::sleep_logs::{
    AppendSleepEventCommand, CreateSleepLogCommand, DeleteSleepLogCommand, SleepLogListQuery,
};
use crate::domain::date_impact::parse_date;
use crate::domain::models::SleepLogError;
use crate::AppState;
use shared::{
    AppendSleepEventRequest, CreateSleepLogRequest, DeleteSleepLogResponse, LogChangeRequest,
    SleepLogListRequest, SleepLogListResponse, SleepLogResponse,
};

/// Create a router for sleep log related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/children/:child_id/sleep-logs",
            get(list_sleep_logs).post(create_sleep_log),
        )
        .route(
            "/children/:child_id/sleep-logs/:log_id",
            delete(delete_sleep_log),
        )
        .route(
            "/children/:child_id/sleep-logs/:log_id/events",
            post(append_sleep_event),
        )
        .route("/sleep-logs/changes", post(handle_log_change))
}

/// Map a sleep log service error to an HTTP response
fn error_response(e: anyhow::Error, context: &str) -> Response {
    error!("{}: {:#}", context, e);
    let status = match e.downcast_ref::<SleepLogError>() {
        Some(SleepLogError::NotFound(_)) => StatusCode::NOT_FOUND,
        Some(SleepLogError::SessionComplete(_)) => StatusCode::CONFLICT,
        Some(SleepLogError::InvalidEvent(_) | SleepLogError::InvalidTimezone(_)) => StatusCode::BAD_REQUEST,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string()).into_response()
}

/// List the sleep logs filed under one date
pub async fn list_sleep_logs(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
    Query(request): Query<SleepLogListRequest>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/sleep-logs?date={}", child_id, request.date);

    let Some(date) = parse_date(&request.date) else {
        return (StatusCode::BAD_REQUEST, format!("Invalid date: {}", request.date)).into_response();
    };

    match state
        .sleep_log_service
        .list_sleep_logs(SleepLogListQuery { child_id, date })
        .await
    {
        Ok(logs) => {
            let response = SleepLogListResponse {
                sleep_logs: SleepLogMapper::to_dto_list(logs),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e, "Failed to list sleep logs"),
    }
}

/// Start a new sleep session
pub async fn create_sleep_log(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
    Json(request): Json<CreateSleepLogRequest>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/sleep-logs - request: {:?}", child_id, request);

    let put_in_bed_at = match SleepLogMapper::parse_timestamp(&request.put_in_bed_at) {
        Ok(ts) => ts,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let command = CreateSleepLogCommand {
        child_id,
        child_timezone: request.child_timezone,
        sleep_type: request.sleep_type,
        put_in_bed_at,
    };

    match state.sleep_log_service.create_sleep_log(command).await {
        Ok(result) => {
            let response = SleepLogResponse {
                sleep_log: SleepLogMapper::to_dto(result.sleep_log),
                success_message: "Sleep log started".to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => error_response(e, "Failed to create sleep log"),
    }
}

/// Append one event to an open sleep session
pub async fn append_sleep_event(
    State(state): State<AppState>,
    Path((child_id, log_id)): Path<(String, String)>,
    Json(request): Json<AppendSleepEventRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/children/{}/sleep-logs/{}/events - request: {:?}",
        child_id, log_id, request
    );

    let event = match SleepLogMapper::event_to_domain(request.event) {
        Ok(event) => event,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let command = AppendSleepEventCommand { child_id, log_id, event };
    match state.sleep_log_service.append_event(command).await {
        Ok(result) => {
            let message = if result.sleep_log.is_complete() {
                "Sleep log completed"
            } else {
                "Sleep event recorded"
            };
            let response = SleepLogResponse {
                sleep_log: SleepLogMapper::to_dto(result.sleep_log),
                success_message: message.to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e, "Failed to append sleep event"),
    }
}

/// Delete a sleep session
pub async fn delete_sleep_log(
    State(state): State<AppState>,
    Path((child_id, log_id)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("DELETE /api/children/{}/sleep-logs/{}", child_id, log_id);

    let command = DeleteSleepLogCommand { child_id, log_id };
    match state.sleep_log_service.delete_sleep_log(command).await {
        Ok(result) if result.deleted => {
            let response = DeleteSleepLogResponse {
                deleted: true,
                success_message: "Sleep log deleted".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(_) => (StatusCode::NOT_FOUND, "Sleep log not found").into_response(),
        Err(e) => error_response(e, "Failed to delete sleep log"),
    }
}

/// Change-trigger entry point: recompute the summaries touched by a log
/// document going from `before` to `after`
pub async fn handle_log_change(
    State(state): State<AppState>,
    Json(request): Json<LogChangeRequest>,
) -> impl IntoResponse {
    info!("POST /api/sleep-logs/changes");

    let before = match request.before.map(SleepLogMapper::snapshot_to_domain).transpose() {
        Ok(snapshot) => snapshot,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let after = match request.after.map(SleepLogMapper::snapshot_to_domain).transpose() {
        Ok(snapshot) => snapshot,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let result = state
        .daily_summary_service
        .handle_log_change(before.as_ref(), after.as_ref())
        .await;

    (StatusCode::OK, Json(DailySummaryMapper::to_log_change_response(result))).into_response()
}
