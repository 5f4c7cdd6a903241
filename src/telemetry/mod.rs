//! Performance analyzer
//!
//! Keeps the bounded ledger of routing decisions, folds reported outcomes
//! into per-worker rolling statistics, and computes windowed analyses and
//! optimization suggestions on demand.
//!
//! All mutable state sits behind one `RwLock` that is held only for the
//! in-memory update. Persistence happens elsewhere (see [`TelemetryFlusher`]).

pub mod analysis;
mod error;
pub mod ledger;
pub mod stats;
pub mod store;
pub mod suggestions;

pub use analysis::{
    AnalysisOutcome, AnalysisReport, ConfidenceStats, Issue, Opportunity, WorkerAnalysis,
};
pub use error::TelemetryError;
pub use ledger::{LedgerEntry, OutcomeReport};
pub use stats::{BoundedWindow, WorkerStats};
pub use store::{TelemetryFlusher, TelemetrySnapshot, TelemetryStore};
pub use suggestions::{
    suggestions_for, OptimizationCategory, OptimizationSuggestion, PolicyAction, Priority,
};

use crate::config::AnalyzerConfig;
use crate::routing::{DecisionSink, PolicyStore, RoutingDecision, RoutingError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Notify;

/// Health of the most recent slice of traffic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecentHealth {
    pub decisions: usize,
    pub outcomes: usize,
    /// `None` until at least one outcome with a success flag is reported
    pub success_rate: Option<f64>,
    pub mean_confidence: Option<f64>,
}

/// Aggregate view for operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub ledger_entries: usize,
    pub ledger_capacity: usize,
    pub lifetime_decisions: u64,
    pub outcomes_recorded: usize,
    pub workers: Vec<WorkerStats>,
}

#[derive(Default)]
struct AnalyzerState {
    ledger: VecDeque<LedgerEntry>,
    /// request id -> sequence number of its ledger entry
    index: HashMap<String, u64>,
    /// Sequence number of `ledger[0]`
    base_seq: u64,
    stats: BTreeMap<String, WorkerStats>,
}

impl AnalyzerState {
    fn position(&self, request_id: &str) -> Option<usize> {
        let seq = *self.index.get(request_id)?;
        usize::try_from(seq.checked_sub(self.base_seq)?).ok()
    }

    fn evict_oldest(&mut self) {
        if let Some(entry) = self.ledger.pop_front() {
            self.base_seq += 1;
            self.index.remove(&entry.decision.request_id);
            if let Some(stats) = self.stats.get_mut(&entry.decision.selected_worker) {
                stats.evict(&entry.decision);
            }
            tracing::trace!(request_id = %entry.decision.request_id, "Ledger entry evicted");
        }
    }
}

/// PerformanceAnalyzer aggregates routing telemetry
pub struct PerformanceAnalyzer {
    config: AnalyzerConfig,
    policy: Arc<PolicyStore>,
    state: RwLock<AnalyzerState>,
    unflushed: AtomicU64,
    flush_every: u64,
    flush_signal: Arc<Notify>,
}

impl PerformanceAnalyzer {
    /// Create an analyzer reading thresholds from `policy`.
    pub fn new(config: AnalyzerConfig, policy: Arc<PolicyStore>) -> Self {
        Self {
            config,
            policy,
            state: RwLock::new(AnalyzerState::default()),
            unflushed: AtomicU64::new(0),
            flush_every: 0,
            flush_signal: Arc::new(Notify::new()),
        }
    }

    /// Signal the flusher every `n` new records (0 disables).
    pub fn with_flush_every(mut self, n: u64) -> Self {
        self.flush_every = n;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Append a decision to the ledger.
    ///
    /// # Errors
    ///
    /// `DuplicateRequest` if the request id is already in the ledger.
    pub fn record_decision(&self, decision: &RoutingDecision) -> Result<(), TelemetryError> {
        let entries = {
            let mut state = self.state.write().expect("analyzer lock poisoned");
            if state.index.contains_key(&decision.request_id) {
                return Err(TelemetryError::DuplicateRequest {
                    request_id: decision.request_id.clone(),
                });
            }

            while state.ledger.len() >= self.config.ledger_capacity.max(1) {
                state.evict_oldest();
            }

            let seq = state.base_seq + state.ledger.len() as u64;
            state.index.insert(decision.request_id.clone(), seq);
            state.ledger.push_back(LedgerEntry::new(decision.clone()));

            let window = self.config.satisfaction_window;
            state
                .stats
                .entry(decision.selected_worker.clone())
                .or_insert_with(|| WorkerStats::new(&decision.selected_worker, window))
                .record_decision(decision);

            state.ledger.len()
        };

        metrics::gauge!("switchboard_ledger_entries").set(entries as f64);
        self.mark_dirty();
        Ok(())
    }

    /// Attach outcome data to a recorded decision.
    ///
    /// Fields already recorded for the request are kept; only new fields
    /// update the worker's statistics.
    ///
    /// # Errors
    ///
    /// `UnknownRequest` if the id was never recorded or has been evicted.
    /// Nothing changes in that case.
    pub fn record_outcome(
        &self,
        request_id: &str,
        report: &OutcomeReport,
    ) -> Result<(), TelemetryError> {
        let (worker_id, applied) = {
            let mut state = self.state.write().expect("analyzer lock poisoned");
            let Some(pos) = state.position(request_id) else {
                tracing::debug!(request_id = %request_id, "Outcome for unknown request dropped");
                return Err(TelemetryError::UnknownRequest {
                    request_id: request_id.to_string(),
                });
            };

            let entry = &mut state.ledger[pos];
            let applied = entry.merge(report);
            let worker_id = entry.decision.selected_worker.clone();

            if !applied.is_empty() {
                let window = self.config.satisfaction_window;
                let stats = state
                    .stats
                    .entry(worker_id.clone())
                    .or_insert_with(|| WorkerStats::new(&worker_id, window));
                if let Some(latency) = applied.latency_ms {
                    stats.record_latency(latency);
                }
                if let Some(success) = applied.success {
                    stats.record_success(success);
                }
                if let Some(satisfaction) = applied.user_satisfaction {
                    stats.record_satisfaction(satisfaction);
                }
                if let Some(quality) = applied.response_quality {
                    stats.record_quality(quality);
                }
            }
            (worker_id, applied)
        };

        if applied.is_empty() {
            tracing::debug!(request_id = %request_id, "Outcome carried no new fields");
            return Ok(());
        }

        if let Some(success) = applied.success {
            metrics::counter!("switchboard_outcomes_total",
                "worker" => worker_id.clone(),
                "success" => if success { "true" } else { "false" }
            )
            .increment(1);
        }
        if let Some(latency) = applied.latency_ms {
            metrics::histogram!("switchboard_outcome_latency_seconds",
                "worker" => worker_id.clone()
            )
            .record(latency / 1000.0);
        }
        tracing::debug!(
            request_id = %request_id,
            worker_id = %worker_id,
            success = ?applied.success,
            latency_ms = ?applied.latency_ms,
            "Outcome recorded"
        );

        self.mark_dirty();
        Ok(())
    }

    /// Analyze the default window.
    pub fn analyze(&self) -> AnalysisOutcome {
        self.analyze_window(self.config.window_days)
    }

    pub fn analyze_window(&self, window_days: u32) -> AnalysisOutcome {
        self.analyze_at(Utc::now(), window_days)
    }

    /// Analyze decisions newer than `now - window_days`.
    pub fn analyze_at(&self, now: DateTime<Utc>, window_days: u32) -> AnalysisOutcome {
        let policy = self.policy.snapshot();
        let cutoff = now - Duration::days(i64::from(window_days));

        let state = self.state.read().expect("analyzer lock poisoned");
        let window: Vec<&LedgerEntry> = state
            .ledger
            .iter()
            .filter(|e| e.decision.timestamp > cutoff)
            .collect();

        if window.len() < self.config.min_decisions {
            tracing::debug!(
                found = window.len(),
                required = self.config.min_decisions,
                "Insufficient data for analysis"
            );
            return AnalysisOutcome::InsufficientData {
                found: window.len(),
                required: self.config.min_decisions,
            };
        }

        let report = analysis::build_report(
            &window,
            &state.stats,
            &self.config,
            &policy,
            window_days,
            now,
        );
        tracing::debug!(
            decisions = report.total_decisions,
            issues = report.issues.len(),
            opportunities = report.opportunities.len(),
            "Analysis complete"
        );
        AnalysisOutcome::Report(report)
    }

    /// Suggestions for the default window; empty when data is insufficient.
    pub fn generate_optimization_suggestions(&self) -> Vec<OptimizationSuggestion> {
        match self.analyze() {
            AnalysisOutcome::Report(report) => {
                suggestions_for(&report, &self.config, &self.policy.snapshot())
            }
            AnalysisOutcome::InsufficientData { .. } => Vec::new(),
        }
    }

    /// Success rate and mean confidence over decisions newer than `now - window`.
    pub fn recent_health_at(&self, now: DateTime<Utc>, window: Duration) -> RecentHealth {
        let cutoff = now - window;
        let state = self.state.read().expect("analyzer lock poisoned");

        let mut decisions = 0usize;
        let mut confidence_sum = 0.0;
        let mut outcomes = 0usize;
        let mut successes = 0usize;
        for entry in state
            .ledger
            .iter()
            .rev()
            .take_while(|e| e.decision.timestamp > cutoff)
        {
            decisions += 1;
            confidence_sum += entry.decision.confidence;
            if let Some(success) = entry.outcome.success {
                outcomes += 1;
                successes += success as usize;
            }
        }

        RecentHealth {
            decisions,
            outcomes,
            success_rate: (outcomes > 0).then(|| successes as f64 / outcomes as f64),
            mean_confidence: (decisions > 0).then(|| confidence_sum / decisions as f64),
        }
    }

    pub fn recent_health(&self, window: Duration) -> RecentHealth {
        self.recent_health_at(Utc::now(), window)
    }

    pub fn performance_summary(&self) -> PerformanceSummary {
        let state = self.state.read().expect("analyzer lock poisoned");
        PerformanceSummary {
            ledger_entries: state.ledger.len(),
            ledger_capacity: self.config.ledger_capacity,
            lifetime_decisions: state.stats.values().map(|s| s.lifetime_requests).sum(),
            outcomes_recorded: state
                .ledger
                .iter()
                .filter(|e| e.outcome_at.is_some())
                .count(),
            workers: state.stats.values().cloned().collect(),
        }
    }

    pub fn worker_stats(&self, worker_id: &str) -> Option<WorkerStats> {
        let state = self.state.read().expect("analyzer lock poisoned");
        state.stats.get(worker_id).cloned()
    }

    pub fn entry(&self, request_id: &str) -> Option<LedgerEntry> {
        let state = self.state.read().expect("analyzer lock poisoned");
        let pos = state.position(request_id)?;
        state.ledger.get(pos).cloned()
    }

    pub fn ledger_len(&self) -> usize {
        self.state.read().expect("analyzer lock poisoned").ledger.len()
    }

    /// Clone the ledger and stats for persistence.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let state = self.state.read().expect("analyzer lock poisoned");
        TelemetrySnapshot {
            ledger: state.ledger.iter().cloned().collect(),
            worker_stats: state.stats.clone(),
        }
    }

    /// Replace all state with a persisted snapshot.
    ///
    /// Duplicate ids keep their first entry and the ledger is trimmed to
    /// capacity (oldest dropped). Per-worker request counts are rebuilt from
    /// the restored ledger.
    pub fn restore(&self, snapshot: TelemetrySnapshot) {
        let mut state = AnalyzerState {
            stats: snapshot.worker_stats,
            ..AnalyzerState::default()
        };

        let capacity = self.config.ledger_capacity.max(1);
        let skip = snapshot.ledger.len().saturating_sub(capacity);
        for entry in snapshot.ledger.into_iter().skip(skip) {
            if state.index.contains_key(&entry.decision.request_id) {
                continue;
            }
            let seq = state.ledger.len() as u64;
            state.index.insert(entry.decision.request_id.clone(), seq);
            state.ledger.push_back(entry);
        }

        let window = self.config.satisfaction_window;
        for stats in state.stats.values_mut() {
            stats.total_requests = 0;
            stats.task_distribution.clear();
            stats.recent_satisfaction.resize(window);
        }
        for entry in &state.ledger {
            let worker_id = &entry.decision.selected_worker;
            let stats = state
                .stats
                .entry(worker_id.clone())
                .or_insert_with(|| WorkerStats::new(worker_id, window));
            stats.total_requests += 1;
            stats.lifetime_requests = stats.lifetime_requests.max(stats.total_requests);
            *stats
                .task_distribution
                .entry(entry.decision.task_class)
                .or_default() += 1;
        }

        let entries = state.ledger.len();
        let workers = state.stats.len();
        *self.state.write().expect("analyzer lock poisoned") = state;
        self.unflushed.store(0, Ordering::Relaxed);
        metrics::gauge!("switchboard_ledger_entries").set(entries as f64);
        tracing::info!(entries, workers, "Telemetry restored");
    }

    /// Records added since the last successful flush.
    pub fn unflushed(&self) -> u64 {
        self.unflushed.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_flushed(&self, count: u64) {
        let _ = self
            .unflushed
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(count))
            });
    }

    pub(crate) fn mark_unflushed(&self, count: u64) {
        self.unflushed.fetch_add(count, Ordering::Relaxed);
    }

    /// Notified every `flush_every` new records.
    pub fn flush_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.flush_signal)
    }

    fn mark_dirty(&self) {
        let pending = self.unflushed.fetch_add(1, Ordering::Relaxed) + 1;
        if self.flush_every > 0 && pending % self.flush_every == 0 {
            self.flush_signal.notify_one();
        }
    }
}

impl DecisionSink for PerformanceAnalyzer {
    fn record_decision(&self, decision: &RoutingDecision) -> Result<(), RoutingError> {
        PerformanceAnalyzer::record_decision(self, decision)
            .map_err(|e| sink_error(&decision.request_id, e))
    }
}

fn sink_error(request_id: &str, err: TelemetryError) -> RoutingError {
    match err {
        TelemetryError::DuplicateRequest { request_id } => {
            RoutingError::DuplicateRequestId { request_id }
        }
        err @ (TelemetryError::UnknownRequest { .. } | TelemetryError::Persistence(_)) => {
            tracing::error!(request_id, error = %err, "Failed to record routing decision");
            RoutingError::RecordingFailed {
                request_id: request_id.to_string(),
                reason: err.to_string(),
            }
        }
    }
}
