//! API Routes
//!
//! - `GET /vacancies?title=` - search, filtered by the caller's applications
//!   when a bearer token is sent
//! - `POST /vacancies/details` - concurrent detail enrichment
//! - `POST /vacancy/response?resume_id=` - apply to a list of vacancies
//! - `GET /api/health` - health check

pub mod health;
pub mod vacancies;

use std::time::Duration;

use axum::{http::StatusCode, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let server = &state.config.server;
    let cors = cors_layer(&server.cors_allowed_origins);
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(server.request_timeout_secs),
    );

    Router::new()
        .merge(vacancies::router(state))
        .merge(health::router())
        .layer(timeout)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
