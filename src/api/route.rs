//! Routing endpoint handler.

use super::{ApiError, AppState, RouteBody};
use crate::routing::{RouteRequest, RoutingDecision};
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /v1/route - Select a worker for the request text.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RouteBody>,
) -> Result<Json<RoutingDecision>, ApiError> {
    let mut request = RouteRequest::new(body.text);
    request.request_id = body.request_id.filter(|id| !id.trim().is_empty());

    let decision = match &body.workers {
        Some(ids) => state.router.route(&request, ids),
        None => state.router.route_all(&request),
    }
    .map_err(|e| {
        tracing::warn!(error = %e, "Routing failed");
        ApiError::from(e)
    })?;

    Ok(Json(decision))
}
