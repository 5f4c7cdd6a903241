//! Health check endpoint handler.

use crate::api::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub workers: usize,
    pub ledger_entries: usize,
    pub policy_version: u64,
}

/// GET /health - "healthy" with at least one worker, "degraded" otherwise.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let workers = state.registry.worker_count();
    let status = if workers > 0 { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        workers,
        ledger_entries: state.analyzer.ledger_len(),
        policy_version: state.policy.snapshot().version,
    })
}
