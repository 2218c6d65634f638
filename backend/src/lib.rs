//! # Sleep Tracker Backend
//!
//! Contains all non-UI logic for the sleep tracker: per-session sleep
//! statistics, per-day summary aggregation, and the recomputation triggered
//! by sleep log changes or requested manually.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (statistics, aggregation, services)
//!     ↓
//! Storage Layer (file-backed repositories)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::domain::{DailySummaryService, RecalculationService, SleepLogService};
use crate::storage::CsvConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub sleep_log_service: SleepLogService<CsvConnection>,
    pub daily_summary_service: DailySummaryService<CsvConnection>,
    pub recalculation_service: RecalculationService<CsvConnection>,
}

/// Initialize the backend with file storage rooted at `data_directory`
pub fn initialize_backend(data_directory: &std::path::Path) -> Result<AppState> {
    info!("Setting up storage");
    let connection = CsvConnection::new_with_redirect(data_directory)
        .with_context(|| format!("Failed to open data directory {}", data_directory.display()))?;
    info!("Using data directory {}", connection.base_directory().display());

    Ok(initialize_backend_with_connection(connection))
}

/// Wire every service onto one shared connection
pub fn initialize_backend_with_connection(connection: CsvConnection) -> AppState {
    info!("Setting up domain services");
    let connection = Arc::new(connection);
    let daily_summary_service = DailySummaryService::new(connection.clone());
    let sleep_log_service = SleepLogService::new(connection.clone(), daily_summary_service.clone());
    let recalculation_service = RecalculationService::new(connection, daily_summary_service.clone());

    AppState {
        sleep_log_service,
        daily_summary_service,
        recalculation_service,
    }
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, allowed_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    let cors = match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!("Ignoring invalid allowed origin '{}'", allowed_origin);
            cors
        }
    };

    Router::new()
        .nest("/api", io::rest::api_router())
        .layer(cors)
        .with_state(app_state)
}
