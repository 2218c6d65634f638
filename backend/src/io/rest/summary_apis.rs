//! # REST API for Daily Summaries
//!
//! Read access to daily summaries and the manual recalculation entry point.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::{error, info};

use super::mappers::DailySummaryMapper;
use crate::domain::date_impact::parse_date;
use crate::domain::RecalculationError;
use crate::AppState;
use shared::{DailySummaryListRequest, DailySummaryListResponse, RecalculateSummariesRequest};

/// Create a router for daily summary related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/children/:child_id/daily-summaries", get(list_daily_summaries))
        .route("/children/:child_id/daily-summaries/:date", get(get_daily_summary))
        .route("/daily-summaries/recalculate", post(recalculate_summaries))
}

/// Get the summary for one date
pub async fn get_daily_summary(
    State(state): State<AppState>,
    Path((child_id, date)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/daily-summaries/{}", child_id, date);

    let Some(parsed) = parse_date(&date) else {
        return (StatusCode::BAD_REQUEST, format!("Invalid date: {}", date)).into_response();
    };

    match state.daily_summary_service.get_daily_summary(&child_id, parsed).await {
        Ok(Some(summary)) => (StatusCode::OK, Json(DailySummaryMapper::to_dto(summary))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Daily summary not found").into_response(),
        Err(e) => {
            error!("Failed to get daily summary: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving daily summary").into_response()
        }
    }
}

/// List summaries for an inclusive date range
pub async fn list_daily_summaries(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
    Query(request): Query<DailySummaryListRequest>,
) -> impl IntoResponse {
    info!(
        "GET /api/children/{}/daily-summaries?start_date={}&end_date={}",
        child_id, request.start_date, request.end_date
    );

    let (Some(start_date), Some(end_date)) = (parse_date(&request.start_date), parse_date(&request.end_date))
    else {
        return (StatusCode::BAD_REQUEST, "Dates must be formatted as YYYY-MM-DD").into_response();
    };

    match state
        .daily_summary_service
        .list_daily_summaries(&child_id, start_date, end_date)
        .await
    {
        Ok(summaries) => {
            let response = DailySummaryListResponse {
                summaries: DailySummaryMapper::to_dto_list(summaries),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to list daily summaries: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing daily summaries").into_response()
        }
    }
}

/// Manually recompute every summary in a date range
pub async fn recalculate_summaries(
    State(state): State<AppState>,
    Json(request): Json<RecalculateSummariesRequest>,
) -> impl IntoResponse {
    info!("POST /api/daily-summaries/recalculate - request: {:?}", request);

    let command = DailySummaryMapper::to_recalculate_command(request);
    match state.recalculation_service.recalculate_summaries(command).await {
        Ok(result) => {
            let response = DailySummaryMapper::to_recalculate_response(result);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(
            e @ (RecalculationError::MissingParameter(_)
            | RecalculationError::InvalidDate(_)
            | RecalculationError::RangeTooLarge { .. }),
        ) => {
            error!("Rejected recalculation request: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => {
            error!("Failed to recalculate summaries: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error recalculating summaries").into_response()
        }
    }
}
