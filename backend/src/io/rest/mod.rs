//! # REST API Interface Layer
//!
//! Provides HTTP REST endpoints for the sleep tracker backend.
//! This layer handles:
//! - HTTP request/response serialization and deserialization
//! - Input validation of dates and timestamps
//! - Error translation from domain to HTTP status codes
//! - Request logging
//!
//! ## Design Principles
//!
//! - **Domain Separation**: Pure translation layer without business logic
//! - **Idempotent Recalculation**: Recalculation endpoints can be retried safely

pub mod mappers;
pub mod sleep_log_apis;
pub mod summary_apis;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

/// All API routes, to be nested under `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(sleep_log_apis::router())
        .merge(summary_apis::router())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
