//! Read-only worker, statistics, and analysis handlers.

use super::{AnalysisQuery, AppState};
use crate::registry::WorkerProfile;
use crate::routing::RoutingStats;
use crate::telemetry::{AnalysisOutcome, OptimizationSuggestion, PerformanceSummary};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

/// Worker profile with its current policy adjustment applied.
#[derive(Debug, Serialize)]
pub struct WorkerView {
    #[serde(flatten)]
    pub profile: WorkerProfile,
    pub adjustment: f64,
    pub effective_score: f64,
}

/// GET /v1/workers
pub async fn workers(State(state): State<Arc<AppState>>) -> Json<Vec<WorkerView>> {
    let policy = state.policy.snapshot();
    let workers = state
        .registry
        .get_all_workers()
        .into_iter()
        .map(|profile| WorkerView {
            adjustment: policy.adjustment(&profile.id),
            effective_score: crate::routing::effective_score(&profile, &policy),
            profile,
        })
        .collect();
    Json(workers)
}

/// GET /v1/stats/routing
pub async fn routing(State(state): State<Arc<AppState>>) -> Json<RoutingStats> {
    Json(state.router.routing_stats())
}

/// GET /v1/stats/performance
pub async fn performance(State(state): State<Arc<AppState>>) -> Json<PerformanceSummary> {
    Json(state.analyzer.performance_summary())
}

/// GET /v1/analysis?window_days=N
pub async fn analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> Json<AnalysisOutcome> {
    let outcome = match query.window_days {
        Some(days) => state.analyzer.analyze_window(days),
        None => state.analyzer.analyze(),
    };
    Json(outcome)
}

/// GET /v1/suggestions
pub async fn suggestions(State(state): State<Arc<AppState>>) -> Json<Vec<OptimizationSuggestion>> {
    Json(state.analyzer.generate_optimization_suggestions())
}
