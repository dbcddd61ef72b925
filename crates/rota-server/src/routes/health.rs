//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub assignments: usize,
    pub jobs_running: bool,
    pub version: String,
}

/// Health check endpoint.
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let assignments = state.engine.pair_count()?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        assignments,
        jobs_running: state.jobs_running().await,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
