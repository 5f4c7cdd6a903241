//! Outcome reporting endpoint handler.

use super::{ApiError, AppState};
use crate::telemetry::OutcomeReport;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// POST /v1/outcomes/:request_id - Attach an outcome to a routed request.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
    Json(report): Json<OutcomeReport>,
) -> Result<StatusCode, ApiError> {
    state.analyzer.record_outcome(&request_id, &report)?;
    Ok(StatusCode::NO_CONTENT)
}
