//! # HTTP API
//!
//! JSON endpoints for the routing hot path and the operator surface.
//!
//! ## Endpoints
//!
//! - `POST /v1/route` - Classify a request and select a worker
//! - `POST /v1/outcomes/{request_id}` - Report how a routed request performed
//! - `GET /v1/workers` - Registered workers
//! - `GET /v1/stats/routing` - Router decision counters
//! - `GET /v1/stats/performance` - Ledger and per-worker statistics
//! - `GET /v1/analysis` - Performance analysis (`?window_days=`)
//! - `GET /v1/suggestions` - Current optimization suggestions
//! - `GET /v1/optimizer/status`, `GET /v1/optimizer/history`, `POST /v1/optimizer/cycle`
//! - `GET /health`, `GET /metrics`
//!
//! ## Example
//!
//! ```no_run
//! use switchboard::api::{create_router, AppState};
//! use switchboard::config::SwitchboardConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SwitchboardConfig::default();
//! let state = Arc::new(AppState::in_memory(&config)?);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8700").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! ```json
//! { "error": { "message": "...", "type": "service_unavailable", "code": "no_workers_available" } }
//! ```

mod health;
mod optimizer;
mod outcomes;
mod route;
mod stats;
pub mod types;

pub use types::*;

use crate::classifier::PatternClassifier;
use crate::config::SwitchboardConfig;
use crate::metrics::MetricsCollector;
use crate::optimizer::Optimizer;
use crate::registry::{Registry, RegistryError};
use crate::routing::{self, PolicyStore};
use crate::telemetry::PerformanceAnalyzer;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub registry: Arc<Registry>,
    pub policy: Arc<PolicyStore>,
    pub router: Arc<routing::Router>,
    pub analyzer: Arc<PerformanceAnalyzer>,
    pub optimizer: Arc<Optimizer>,
    pub metrics_collector: Arc<MetricsCollector>,
    pub start_time: Instant,
    pub max_body_bytes: usize,
}

impl AppState {
    /// Wire the router, optimizer, and metrics around existing shared state.
    pub fn new(
        config: &SwitchboardConfig,
        registry: Arc<Registry>,
        policy: Arc<PolicyStore>,
        analyzer: Arc<PerformanceAnalyzer>,
    ) -> Self {
        let router = Arc::new(
            routing::Router::new(
                Arc::clone(&registry),
                Arc::new(PatternClassifier::default()),
                Arc::clone(&policy),
            )
            .with_sink(Arc::clone(&analyzer) as Arc<dyn routing::DecisionSink>)
            .with_limits(
                config.routing.preview_chars,
                config.analyzer.pattern_prefix_tokens,
            ),
        );

        let optimizer = Arc::new(Optimizer::new(
            config.optimizer.clone(),
            Arc::clone(&analyzer),
            Arc::clone(&policy),
        ));

        let prometheus_handle = crate::metrics::setup_metrics().unwrap_or_else(|e| {
            tracing::debug!("Metrics already initialized, creating new handle: {}", e);
            crate::metrics::detached_handle()
        });
        let metrics_collector = Arc::new(MetricsCollector::new(
            Arc::clone(&registry),
            Arc::clone(&analyzer),
            Arc::clone(&policy),
            prometheus_handle,
        ));

        Self {
            registry,
            policy,
            router,
            analyzer,
            optimizer,
            metrics_collector,
            start_time: Instant::now(),
            max_body_bytes: config.server.max_body_bytes,
        }
    }

    /// State with configured workers and nothing persisted.
    pub fn in_memory(config: &SwitchboardConfig) -> Result<Self, RegistryError> {
        let registry = Arc::new(config.build_registry()?);
        let policy = Arc::new(PolicyStore::new(config.routing.initial_policy()));
        let analyzer = Arc::new(PerformanceAnalyzer::new(
            config.analyzer.clone(),
            Arc::clone(&policy),
        ));
        Ok(Self::new(config, registry, policy, analyzer))
    }
}

/// Create the API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/v1/route", post(route::handle))
        .route("/v1/outcomes/:request_id", post(outcomes::handle))
        .route("/v1/workers", get(stats::workers))
        .route("/v1/stats/routing", get(stats::routing))
        .route("/v1/stats/performance", get(stats::performance))
        .route("/v1/analysis", get(stats::analysis))
        .route("/v1/suggestions", get(stats::suggestions))
        .route("/v1/optimizer/status", get(optimizer::status))
        .route("/v1/optimizer/history", get(optimizer::history))
        .route("/v1/optimizer/cycle", post(optimizer::cycle))
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}
