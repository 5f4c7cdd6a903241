//! Task routing
//!
//! Classifies each request and selects the worker that should serve it.
//! Selection reads the current [`RoutingPolicy`] snapshot, so optimizer
//! adjustments take effect on the next request without blocking this path.
//!
//! Selection order:
//! 1. A fast-path rule whose prefix matches the request, if its worker is available
//! 2. The best available worker that supports the task class
//! 3. The best available generative worker (generic fallback)
//! 4. The first available worker (last resort)

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

pub mod decision;
pub mod error;
pub mod policy;
pub mod scoring;

pub use decision::{prefix_key, RouteKind, RoutingDecision};
pub use error::RoutingError;
pub use policy::{FastPathRule, PolicyStore, RoutingPolicy};
pub use scoring::{
    best_worker, effective_score, scored_confidence, CONFIDENCE_CAP, GENERIC_FALLBACK_CONFIDENCE,
    LAST_RESORT_CONFIDENCE,
};

use crate::classifier::{TaskClass, TaskClassifier};
use crate::logging::truncate_preview;
use crate::registry::{Registry, WorkerProfile};

/// Default number of characters kept in a decision's request preview.
pub const DEFAULT_PREVIEW_CHARS: usize = 64;

/// Default number of leading tokens forming a fast-path prefix.
pub const DEFAULT_PREFIX_TOKENS: usize = 3;

/// Receives every decision the router makes.
///
/// The performance analyzer implements this to keep the decision ledger.
pub trait DecisionSink: Send + Sync {
    /// Record a new decision. Must reject a request id it has already seen.
    fn record_decision(&self, decision: &RoutingDecision) -> Result<(), RoutingError>;
}

/// An incoming request to route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub text: String,
    /// Caller-generated correlation id; a UUID is generated when absent
    #[serde(default)]
    pub request_id: Option<String>,
}

impl RouteRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            request_id: None,
        }
    }

    pub fn with_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Counters over every decision this router has returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingStats {
    pub total_decisions: u64,
    pub by_worker: BTreeMap<String, u64>,
    pub by_task: BTreeMap<TaskClass, u64>,
    pub by_route_kind: BTreeMap<RouteKind, u64>,
    pub avg_confidence: f64,
    pub fallback_rate: f64,
    pub policy_version: u64,
}

/// Confidence sums are kept in millionths so they fit an atomic integer.
const CONFIDENCE_SCALE: f64 = 1_000_000.0;

#[derive(Default)]
struct RouterCounters {
    total: AtomicU64,
    confidence_micros: AtomicU64,
    by_worker: DashMap<String, u64>,
    by_task: DashMap<TaskClass, u64>,
    by_route_kind: DashMap<RouteKind, u64>,
}

/// Router selects the worker for each request
pub struct Router {
    registry: Arc<Registry>,
    classifier: Arc<dyn TaskClassifier>,
    policy: Arc<PolicyStore>,
    sink: Option<Arc<dyn DecisionSink>>,
    preview_chars: usize,
    prefix_tokens: usize,
    counters: RouterCounters,
}

impl Router {
    /// Create a router that does not record decisions anywhere.
    pub fn new(
        registry: Arc<Registry>,
        classifier: Arc<dyn TaskClassifier>,
        policy: Arc<PolicyStore>,
    ) -> Self {
        Self {
            registry,
            classifier,
            policy,
            sink: None,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            prefix_tokens: DEFAULT_PREFIX_TOKENS,
            counters: RouterCounters::default(),
        }
    }

    /// Append every decision to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn DecisionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Override preview length and fast-path prefix size.
    pub fn with_limits(mut self, preview_chars: usize, prefix_tokens: usize) -> Self {
        self.preview_chars = preview_chars;
        self.prefix_tokens = prefix_tokens.max(1);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn policy(&self) -> &Arc<PolicyStore> {
        &self.policy
    }

    /// Classify text with the configured classifier.
    pub fn classify(&self, text: &str) -> TaskClass {
        self.classifier.classify(text)
    }

    /// Route a request among the given worker ids.
    ///
    /// Unregistered ids are ignored. The decision is appended to the sink
    /// before it is returned.
    ///
    /// # Errors
    ///
    /// `NoWorkersAvailable` when no id resolves to a registered worker;
    /// `DuplicateRequestId` when the sink has already seen the request id.
    pub fn route(
        &self,
        request: &RouteRequest,
        available_worker_ids: &[String],
    ) -> Result<RoutingDecision, RoutingError> {
        let workers = self.registry.resolve(available_worker_ids);
        self.route_among(request, &workers)
    }

    /// Route a request among every registered worker.
    pub fn route_all(&self, request: &RouteRequest) -> Result<RoutingDecision, RoutingError> {
        let workers = self.registry.get_all_workers();
        self.route_among(request, &workers)
    }

    /// Route a request among explicit worker profiles (input order matters
    /// for the last-resort rule).
    pub fn route_among(
        &self,
        request: &RouteRequest,
        workers: &[WorkerProfile],
    ) -> Result<RoutingDecision, RoutingError> {
        let decision = self.decide(request, workers)?;

        if let Some(sink) = &self.sink {
            sink.record_decision(&decision)?;
        }
        self.count(&decision);

        Ok(decision)
    }

    /// Compute a decision without recording it.
    pub fn decide(
        &self,
        request: &RouteRequest,
        workers: &[WorkerProfile],
    ) -> Result<RoutingDecision, RoutingError> {
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if workers.is_empty() {
            tracing::warn!(request_id = %request_id, "No workers available for request");
            return Err(RoutingError::NoWorkersAvailable { request_id });
        }

        let policy = self.policy.snapshot();
        let task_class = self.classifier.classify(&request.text);
        let (worker, confidence, route_kind, rationale) =
            self.select(&request.text, task_class, workers, &policy);

        let decision = RoutingDecision {
            request_id,
            request_preview: truncate_preview(&request.text, self.preview_chars),
            request_prefix: prefix_key(&request.text, self.prefix_tokens),
            selected_worker: worker.id.clone(),
            task_class,
            confidence,
            rationale,
            route_kind,
            timestamp: chrono::Utc::now(),
        };

        tracing::debug!(
            request_id = %decision.request_id,
            worker_id = %decision.selected_worker,
            task_class = %task_class,
            route_kind = route_kind.as_str(),
            confidence = decision.confidence,
            "Routing decision"
        );
        if decision.confidence < policy.low_confidence_threshold {
            tracing::debug!(
                request_id = %decision.request_id,
                confidence = decision.confidence,
                threshold = policy.low_confidence_threshold,
                "Low-confidence routing decision"
            );
        }

        Ok(decision)
    }

    fn select<'a>(
        &self,
        text: &str,
        task_class: TaskClass,
        workers: &'a [WorkerProfile],
        policy: &RoutingPolicy,
    ) -> (&'a WorkerProfile, f64, RouteKind, String) {
        let key = prefix_key(text, self.prefix_tokens);
        if let Some(rule) = policy.fast_path(&key) {
            if let Some(worker) = workers.iter().find(|w| w.id == rule.worker_id) {
                let score = effective_score(worker, policy);
                return (
                    worker,
                    scored_confidence(score),
                    RouteKind::FastPath,
                    format!("fast-path rule '{}' pins worker {}", rule.prefix, worker.id),
                );
            }
        }

        let specialized = workers.iter().filter(|w| w.supports(task_class));
        if let Some(worker) = best_worker(specialized, policy) {
            let score = effective_score(worker, policy);
            return (
                worker,
                scored_confidence(score),
                RouteKind::Specialized,
                format!(
                    "{} supports {} with score {:.2}",
                    worker.id, task_class, score
                ),
            );
        }

        let generative = workers.iter().filter(|w| w.kind.is_generative());
        if let Some(worker) = best_worker(generative, policy) {
            tracing::debug!(task_class = %task_class, worker_id = %worker.id, "Generic fallback");
            return (
                worker,
                GENERIC_FALLBACK_CONFIDENCE,
                RouteKind::GenericFallback,
                format!(
                    "no specialized worker for {}, generic fallback to {}",
                    task_class, worker.id
                ),
            );
        }

        let worker = &workers[0];
        tracing::warn!(task_class = %task_class, worker_id = %worker.id, "Last-resort fallback");
        (
            worker,
            LAST_RESORT_CONFIDENCE,
            RouteKind::LastResort,
            format!(
                "no specialized or generative worker for {}, last-resort fallback to {}",
                task_class, worker.id
            ),
        )
    }

    fn count(&self, decision: &RoutingDecision) {
        self.counters.total.fetch_add(1, Ordering::Relaxed);
        self.counters.confidence_micros.fetch_add(
            (decision.confidence * CONFIDENCE_SCALE).round() as u64,
            Ordering::Relaxed,
        );
        *self
            .counters
            .by_worker
            .entry(decision.selected_worker.clone())
            .or_default() += 1;
        *self.counters.by_task.entry(decision.task_class).or_default() += 1;
        *self
            .counters
            .by_route_kind
            .entry(decision.route_kind)
            .or_default() += 1;

        metrics::counter!("switchboard_routing_decisions_total",
            "worker" => decision.selected_worker.clone(),
            "task" => decision.task_class.as_str()
        )
        .increment(1);
        metrics::histogram!("switchboard_routing_confidence").record(decision.confidence);
        if decision.route_kind.is_fallback() {
            metrics::counter!("switchboard_routing_fallbacks_total",
                "level" => decision.route_kind.as_str()
            )
            .increment(1);
        }
    }

    /// Best embedding-kind worker among all registered workers.
    pub fn best_embedding_worker(&self) -> Option<WorkerProfile> {
        let policy = self.policy.snapshot();
        let workers = self.registry.get_all_workers();
        best_worker(workers.iter().filter(|w| w.kind.is_embedding()), &policy).cloned()
    }

    /// Best generative-kind worker, preferring ones that support `task`.
    ///
    /// Falls back to the best generative worker overall when none supports it.
    pub fn best_generative_worker(&self, task: Option<TaskClass>) -> Option<WorkerProfile> {
        let policy = self.policy.snapshot();
        let workers = self.registry.get_all_workers();
        let generative: Vec<_> = workers.iter().filter(|w| w.kind.is_generative()).collect();

        if let Some(task) = task {
            let supporting = generative.iter().copied().filter(|w| w.supports(task));
            if let Some(worker) = best_worker(supporting, &policy) {
                return Some(worker.clone());
            }
        }
        best_worker(generative.iter().copied(), &policy).cloned()
    }

    /// Whether routing `text` among all registered workers would pick an
    /// embedding-kind worker. Records nothing.
    pub fn would_use_embedding(&self, text: &str) -> bool {
        let workers = self.registry.get_all_workers();
        let request = RouteRequest::new(text).with_id("dry-run");
        match self.decide(&request, &workers) {
            Ok(decision) => workers
                .iter()
                .find(|w| w.id == decision.selected_worker)
                .is_some_and(|w| w.kind.is_embedding()),
            Err(_) => false,
        }
    }

    /// Snapshot of the router's decision counters.
    pub fn routing_stats(&self) -> RoutingStats {
        let total = self.counters.total.load(Ordering::Relaxed);
        let confidence_sum =
            self.counters.confidence_micros.load(Ordering::Relaxed) as f64 / CONFIDENCE_SCALE;
        let by_route_kind: BTreeMap<_, _> = self
            .counters
            .by_route_kind
            .iter()
            .map(|e| (*e.key(), *e.value()))
            .collect();
        let fallbacks: u64 = by_route_kind
            .iter()
            .filter(|(kind, _)| kind.is_fallback())
            .map(|(_, count)| *count)
            .sum();

        RoutingStats {
            total_decisions: total,
            by_worker: self
                .counters
                .by_worker
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect(),
            by_task: self
                .counters
                .by_task
                .iter()
                .map(|e| (*e.key(), *e.value()))
                .collect(),
            by_route_kind,
            avg_confidence: if total > 0 {
                confidence_sum / total as f64
            } else {
                0.0
            },
            fallback_rate: if total > 0 {
                fallbacks as f64 / total as f64
            } else {
                0.0
            },
            policy_version: self.policy.snapshot().version,
        }
    }
}

#[cfg(test)]
mod tests;
