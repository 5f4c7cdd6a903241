//! Optimizer admin handlers.

use super::{ApiError, AppState, HistoryQuery};
use crate::optimizer::{CycleReport, OptimizationRecord, OptimizationStatus};
use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

/// GET /v1/optimizer/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<OptimizationStatus> {
    Json(state.optimizer.status())
}

/// GET /v1/optimizer/history?limit=N
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<OptimizationRecord>> {
    Json(state.optimizer.recent_optimizations(query.limit))
}

/// POST /v1/optimizer/cycle - Run one cycle now and return its report.
pub async fn cycle(State(state): State<Arc<AppState>>) -> Result<Json<CycleReport>, ApiError> {
    let optimizer = Arc::clone(&state.optimizer);
    let report = tokio::task::spawn_blocking(move || optimizer.force_cycle())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Forced optimization cycle failed");
            ApiError::internal(format!("optimization cycle failed: {}", e))
        })?;
    Ok(Json(report))
}
