//! Optimizer (control loop)
//!
//! Each cycle reads the performance analysis, synthesizes optimization goals,
//! gates them by priority and system stability, and applies approved goals
//! to the routing policy within configured bounds. Applied changes are kept
//! in a bounded history and watched for an observation window; if recent
//! health drops by more than `rollback_threshold` they are reverted.

mod error;
pub mod goal;
pub mod history;
pub mod service;

pub use error::OptimizerError;
pub use goal::{GoalStatus, OptimizationGoal};
pub use history::{
    Baseline, OptimizationHistory, OptimizationRecord, PolicyChange, RecordStatus,
};
pub use service::{OptimizerHandle, OptimizerService};

use crate::config::OptimizerConfig;
use crate::routing::{FastPathRule, PolicyStore, RoutingPolicy};
use crate::telemetry::{
    suggestions_for, AnalysisOutcome, AnalysisReport, OptimizationCategory,
    OptimizationSuggestion, PerformanceAnalyzer, PolicyAction, Priority, RecentHealth,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Post-change decisions required before a rollback verdict is reached.
const ROLLBACK_MIN_DECISIONS: usize = 5;

/// Floating-point slack when deciding whether a clamped value moved.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed,
    /// Analysis reported insufficient data
    Skipped,
}

impl CycleOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CycleOutcome::Completed => "completed",
            CycleOutcome::Skipped => "skipped",
        }
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
    pub goals_synthesized: usize,
    pub goals_executed: usize,
    pub goals_deferred: usize,
    pub goals_completed: usize,
    pub goals_failed: usize,
    pub changes_applied: usize,
    pub rolled_back: Vec<String>,
    pub verified: Vec<String>,
    pub policy_version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

impl CycleReport {
    fn new(cycle: u64, started_at: DateTime<Utc>) -> Self {
        Self {
            cycle,
            started_at,
            outcome: CycleOutcome::Skipped,
            goals_synthesized: 0,
            goals_executed: 0,
            goals_deferred: 0,
            goals_completed: 0,
            goals_failed: 0,
            changes_applied: 0,
            rolled_back: Vec::new(),
            verified: Vec::new(),
            policy_version: 0,
            persist_error: None,
        }
    }
}

/// Operator view of the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStatus {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub cycles_run: u64,
    pub last_cycle: Option<CycleReport>,
    pub pending_goals: Vec<OptimizationGoal>,
    pub completed_goals: usize,
    pub failed_goals: usize,
    pub history_len: usize,
    pub observing: usize,
    pub rolled_back: usize,
    pub stable: bool,
    pub recent_health: RecentHealth,
    pub policy_version: u64,
    pub low_confidence_threshold: f64,
    pub fast_paths: usize,
    pub worker_adjustments: BTreeMap<String, f64>,
}

struct OptimizerState {
    goals: Vec<OptimizationGoal>,
    history: OptimizationHistory,
    cycles: u64,
    last_cycle: Option<CycleReport>,
}

/// Optimizer synthesizes and applies routing policy goals
pub struct Optimizer {
    config: OptimizerConfig,
    analyzer: Arc<PerformanceAnalyzer>,
    policy: Arc<PolicyStore>,
    /// Low-confidence threshold the adjustment bound is measured from
    threshold_anchor: f64,
    state: Mutex<OptimizerState>,
}

impl Optimizer {
    pub fn new(
        config: OptimizerConfig,
        analyzer: Arc<PerformanceAnalyzer>,
        policy: Arc<PolicyStore>,
    ) -> Self {
        let threshold_anchor = policy.snapshot().low_confidence_threshold;
        let history = OptimizationHistory::new(config.history_limit);
        Self {
            config,
            analyzer,
            policy,
            threshold_anchor,
            state: Mutex::new(OptimizerState {
                goals: Vec::new(),
                history,
                cycles: 0,
                last_cycle: None,
            }),
        }
    }

    /// Measure the threshold bound from `anchor` instead of the starting policy.
    pub fn with_threshold_anchor(mut self, anchor: f64) -> Self {
        self.threshold_anchor = anchor;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Run one optimization cycle now.
    pub fn force_cycle(&self) -> CycleReport {
        tracing::info!("Optimization cycle forced");
        self.run_cycle()
    }

    /// Run one cycle: rollback watch, analysis, synthesis, gating, application.
    pub fn run_cycle(&self) -> CycleReport {
        let mut state = self.lock_state();
        state.cycles += 1;
        let now = Utc::now();
        let mut report = CycleReport::new(state.cycles, now);
        let version_before = self.policy.snapshot().version;

        self.watch_applied(&mut state, now, &mut report);

        match self.analyzer.analyze() {
            AnalysisOutcome::InsufficientData { found, required } => {
                tracing::info!(
                    cycle = report.cycle,
                    found,
                    required,
                    "Skipping optimization cycle, insufficient data"
                );
            }
            AnalysisOutcome::Report(analysis) => {
                report.outcome = CycleOutcome::Completed;
                self.plan_and_apply(&mut state, &analysis, &mut report);
            }
        }

        let policy = self.policy.snapshot();
        report.policy_version = policy.version;
        if policy.version != version_before {
            if let Err(e) = self.policy.persist().map_err(OptimizerError::from) {
                tracing::warn!(error = %e, "Routing policy not persisted, will retry next cycle");
                report.persist_error = Some(e.to_string());
            }
        }

        metrics::counter!("switchboard_optimizer_cycles_total",
            "result" => report.outcome.as_str()
        )
        .increment(1);
        metrics::gauge!("switchboard_policy_version").set(policy.version as f64);

        tracing::info!(
            cycle = report.cycle,
            outcome = report.outcome.as_str(),
            synthesized = report.goals_synthesized,
            executed = report.goals_executed,
            deferred = report.goals_deferred,
            changes = report.changes_applied,
            rolled_back = report.rolled_back.len(),
            policy_version = report.policy_version,
            "Optimization cycle finished"
        );

        self.prune_goals(&mut state);
        state.last_cycle = Some(report.clone());
        report
    }

    fn plan_and_apply(
        &self,
        state: &mut OptimizerState,
        analysis: &AnalysisReport,
        report: &mut CycleReport,
    ) {
        let policy = self.policy.snapshot();
        let suggestions = suggestions_for(analysis, self.analyzer.config(), &policy);
        let synthesized = self.synthesize_goals(analysis, &suggestions, &policy);
        report.goals_synthesized = synthesized.len();

        // Merge with goals still pending from earlier cycles
        let mut current: Vec<String> = Vec::with_capacity(synthesized.len());
        for goal in synthesized {
            match state
                .goals
                .iter_mut()
                .find(|g| g.status == GoalStatus::Pending && g.same_objective(&goal))
            {
                Some(existing) => {
                    tracing::debug!(goal_id = %existing.id, target = %existing.target_metric, "Refreshing pending goal");
                    existing.refresh_from(goal);
                    current.push(existing.id.clone());
                }
                None => {
                    tracing::debug!(
                        goal_id = %goal.id,
                        category = goal.category.as_str(),
                        priority = goal.priority.as_str(),
                        target = %goal.target_metric,
                        "Goal synthesized"
                    );
                    current.push(goal.id.clone());
                    state.goals.push(goal);
                }
            }
        }

        // Pending goals whose condition is gone are closed out
        for goal in state
            .goals
            .iter_mut()
            .filter(|g| g.status == GoalStatus::Pending && !current.contains(&g.id))
        {
            goal.note = Some("condition no longer observed".to_string());
            if goal.start().and_then(|_| goal.finish(false)).is_ok() {
                record_goal_metric(GoalStatus::Failed);
            }
        }

        let health = self.stability_health();
        let stable = self.is_stable(&health);

        for idx in 0..state.goals.len() {
            if state.goals[idx].status != GoalStatus::Pending {
                continue;
            }
            let approved = match state.goals[idx].priority {
                Priority::High => true,
                Priority::Medium => !state
                    .goals
                    .iter()
                    .enumerate()
                    .any(|(i, g)| {
                        i != idx && g.priority == Priority::High && g.status == GoalStatus::Pending
                    }),
                Priority::Low => stable,
            };

            if !approved {
                report.goals_deferred += 1;
                tracing::debug!(
                    goal_id = %state.goals[idx].id,
                    priority = state.goals[idx].priority.as_str(),
                    stable,
                    "Goal deferred"
                );
                continue;
            }

            let baseline = self.baseline(analysis, &health);
            let record = self.execute_goal(&mut state.goals[idx], baseline);
            report.goals_executed += 1;
            report.changes_applied += record.changes.len();
            match state.goals[idx].status {
                GoalStatus::Completed => report.goals_completed += 1,
                GoalStatus::Failed => report.goals_failed += 1,
                _ => {}
            }
            state.history.push(record);
        }
    }

    /// Build this cycle's goals from the analysis and the analyzer's suggestions.
    pub fn synthesize_goals(
        &self,
        analysis: &AnalysisReport,
        suggestions: &[OptimizationSuggestion],
        policy: &RoutingPolicy,
    ) -> Vec<OptimizationGoal> {
        let analyzer_config = self.analyzer.config();
        let mut goals = Vec::new();

        if analysis.confidence.mean < self.config.target_confidence {
            let mut linked: Vec<_> = suggestions
                .iter()
                .filter(|s| s.category == OptimizationCategory::ConfidenceThreshold)
                .cloned()
                .collect();
            if linked.is_empty() {
                linked.push(threshold_suggestion(
                    policy.low_confidence_threshold,
                    analyzer_config.threshold_step,
                    analysis.confidence.mean,
                ));
            }
            goals.push(OptimizationGoal::new(
                OptimizationCategory::ConfidenceThreshold,
                Priority::Medium,
                format!(
                    "Raise mean routing confidence from {:.2} to {:.2}",
                    analysis.confidence.mean, self.config.target_confidence
                ),
                "mean_confidence",
                analysis.confidence.mean,
                self.config.target_confidence,
                linked,
            ));
        }

        let mut success_goal_workers = Vec::new();
        for (worker_id, worker) in &analysis.workers {
            let Some(success_rate) = worker.success_rate else {
                continue;
            };
            if worker.recent_request_count < self.config.min_worker_requests
                || success_rate >= self.config.target_success_rate
            {
                continue;
            }

            // Only reductions serve a success-rate goal.
            let mut linked: Vec<_> = suggestions
                .iter()
                .filter(|s| match &s.action {
                    PolicyAction::AdjustWorkerWeight {
                        worker_id: target,
                        delta,
                    } => target == worker_id && *delta < 0.0,
                    _ => false,
                })
                .cloned()
                .collect();
            if linked.is_empty() {
                linked.push(reduce_weight_suggestion(
                    worker_id,
                    policy.adjustment(worker_id),
                    analyzer_config.performance_step,
                    success_rate,
                ));
            }
            success_goal_workers.push(worker_id.clone());
            goals.push(OptimizationGoal::new(
                OptimizationCategory::ModelPreference,
                Priority::High,
                format!(
                    "Raise success rate of {} from {:.2} to {:.2}",
                    worker_id, success_rate, self.config.target_success_rate
                ),
                format!("worker:{}:success_rate", worker_id),
                success_rate,
                self.config.target_success_rate,
                linked,
            ));
        }

        let mut preference: BTreeMap<&str, Vec<&OptimizationSuggestion>> = BTreeMap::new();
        for suggestion in suggestions
            .iter()
            .filter(|s| s.category == OptimizationCategory::ModelPreference)
        {
            let Some(worker_id) = suggestion.action.worker_id() else {
                continue;
            };
            if success_goal_workers.iter().any(|w| w == worker_id) {
                tracing::debug!(
                    worker_id,
                    suggestion_id = %suggestion.id,
                    "Dropping preference suggestion for worker below target success rate"
                );
                continue;
            }
            preference.entry(worker_id).or_default().push(suggestion);
        }
        for (worker_id, linked) in preference {
            let priority = linked
                .iter()
                .map(|s| s.priority)
                .max()
                .unwrap_or(Priority::Medium);
            let current = policy.adjustment(worker_id);
            let target = linked
                .iter()
                .filter_map(|s| match &s.action {
                    PolicyAction::AdjustWorkerWeight { delta, .. } => Some(*delta),
                    _ => None,
                })
                .sum::<f64>()
                + current;
            goals.push(OptimizationGoal::new(
                OptimizationCategory::ModelPreference,
                priority,
                format!("Adjust routing preference for {}", worker_id),
                format!("worker:{}:preference", worker_id),
                current,
                target,
                linked.into_iter().cloned().collect(),
            ));
        }

        let patterns: Vec<_> = suggestions
            .iter()
            .filter(|s| s.category == OptimizationCategory::PatternUpdate)
            .cloned()
            .collect();
        if !patterns.is_empty() {
            let current = policy.fast_paths.len() as f64;
            goals.push(OptimizationGoal::new(
                OptimizationCategory::PatternUpdate,
                Priority::Low,
                format!("Add {} fast-path rule(s) for stable request patterns", patterns.len()),
                "fast_paths",
                current,
                current + patterns.len() as f64,
                patterns,
            ));
        }

        goals
    }

    fn execute_goal(&self, goal: &mut OptimizationGoal, baseline: Baseline) -> OptimizationRecord {
        if let Err(e) = goal.start() {
            tracing::error!(error = %e, "Goal could not be started");
        }
        tracing::info!(
            goal_id = %goal.id,
            category = goal.category.as_str(),
            priority = goal.priority.as_str(),
            suggestions = goal.linked_suggestions.len(),
            "Executing optimization goal"
        );

        let mut changes = Vec::new();
        let mut skipped = Vec::new();
        for suggestion in &goal.linked_suggestions {
            match self.apply_suggestion(suggestion) {
                Ok(change) => {
                    tracing::info!(
                        goal_id = %goal.id,
                        suggestion_id = %suggestion.id,
                        change = ?change,
                        "Policy change applied"
                    );
                    changes.push(change);
                }
                Err(e) => {
                    tracing::warn!(goal_id = %goal.id, error = %e, "Suggestion skipped");
                    skipped.push(e.to_string());
                }
            }
        }

        let success = !changes.is_empty();
        if !success {
            goal.note = Some("no suggestion could be applied".to_string());
        }
        match goal.finish(success) {
            Ok(()) => record_goal_metric(goal.status),
            Err(e) => tracing::error!(error = %e, "Goal could not be finished"),
        }

        OptimizationRecord::new(goal, baseline, changes, skipped)
    }

    /// Apply one suggestion to the policy within the configured bounds.
    pub fn apply_suggestion(
        &self,
        suggestion: &OptimizationSuggestion,
    ) -> Result<PolicyChange, OptimizerError> {
        let rejected = |reason: String| OptimizerError::SuggestionApplication {
            suggestion_id: suggestion.id.clone(),
            reason,
        };

        let (_, change) = self.policy.update(|policy| match &suggestion.action {
            PolicyAction::AdjustLowConfidenceThreshold { delta } => {
                let from = policy.low_confidence_threshold;
                let lower = (self.threshold_anchor - self.config.max_confidence_adjustment)
                    .max(self.config.min_confidence_threshold);
                let upper = (self.threshold_anchor + self.config.max_confidence_adjustment)
                    .min(policy.high_confidence_threshold - EPSILON);
                let to = (from + delta).clamp(lower.min(upper), upper);
                if (to - from).abs() < EPSILON {
                    return Err(rejected(format!(
                        "low-confidence threshold already at its bound ({:.2})",
                        from
                    )));
                }
                policy.low_confidence_threshold = to;
                Ok(PolicyChange::LowConfidenceThreshold { from, to })
            }
            PolicyAction::AdjustWorkerWeight { worker_id, delta } => {
                let from = policy.adjustment(worker_id);
                let max = self.config.max_performance_adjustment;
                let to = (from + delta).clamp(-max, max);
                if (to - from).abs() < EPSILON {
                    return Err(rejected(format!(
                        "adjustment for {} already at its bound ({:+.2})",
                        worker_id, from
                    )));
                }
                if to.abs() < EPSILON {
                    policy.worker_adjustments.remove(worker_id);
                } else {
                    policy.worker_adjustments.insert(worker_id.clone(), to);
                }
                Ok(PolicyChange::WorkerAdjustment {
                    worker_id: worker_id.clone(),
                    from,
                    to,
                })
            }
            PolicyAction::AddFastPath { prefix, worker_id } => {
                if prefix.trim().is_empty() {
                    return Err(rejected("empty fast-path prefix".to_string()));
                }
                let existing = policy.fast_paths.iter().position(|r| r.prefix == *prefix);
                let replaced = match existing {
                    Some(pos) if policy.fast_paths[pos].worker_id == *worker_id => {
                        return Err(rejected(format!("fast path '{}' already exists", prefix)));
                    }
                    Some(pos) => Some(policy.fast_paths.remove(pos).worker_id),
                    None if policy.fast_paths.len() >= self.config.max_fast_paths => {
                        return Err(rejected(format!(
                            "fast-path limit of {} reached",
                            self.config.max_fast_paths
                        )));
                    }
                    None => None,
                };
                policy.fast_paths.push(FastPathRule {
                    prefix: prefix.clone(),
                    worker_id: worker_id.clone(),
                    created_at: Utc::now(),
                });
                Ok(PolicyChange::FastPathAdded {
                    prefix: prefix.clone(),
                    worker_id: worker_id.clone(),
                    replaced,
                })
            }
        })?;
        Ok(change)
    }

    /// Compare post-change health against each observed record's baseline.
    ///
    /// Degraded records are reverted newest first, so stacked changes to the
    /// same setting unwind back to the oldest record's `from` value.
    fn watch_applied(&self, state: &mut OptimizerState, now: DateTime<Utc>, report: &mut CycleReport) {
        let window = Duration::minutes(self.config.observation_window_minutes);
        let threshold = self.config.rollback_threshold;
        let mut degraded = Vec::new();

        for record in state.history.observing_mut() {
            let since = now - record.applied_at;
            let health = self.analyzer.recent_health_at(now, since);

            let success_drop = match (record.baseline.recent.success_rate, health.success_rate) {
                (Some(before), Some(after)) => before - after,
                _ => 0.0,
            };
            let confidence_drop =
                match (record.baseline.recent.mean_confidence, health.mean_confidence) {
                    (Some(before), Some(after)) => before - after,
                    _ => 0.0,
                };

            if health.decisions >= ROLLBACK_MIN_DECISIONS
                && (success_drop > threshold || confidence_drop > threshold)
            {
                degraded.push((record, success_drop, confidence_drop));
            } else if since >= window {
                record.resolve(RecordStatus::Verified);
                report.verified.push(record.id.clone());
                tracing::info!(record_id = %record.id, goal_id = %record.goal_id, "Optimization verified");
            }
        }

        for (record, success_drop, confidence_drop) in degraded.into_iter().rev() {
            let changes = &record.changes;
            let reverted = self.policy.update::<_, OptimizerError, _>(|policy| {
                for change in changes.iter().rev() {
                    change.revert(policy);
                }
                Ok(())
            });
            if reverted.is_ok() {
                record.resolve(RecordStatus::RolledBack);
                report.rolled_back.push(record.id.clone());
                tracing::warn!(
                    record_id = %record.id,
                    goal_id = %record.goal_id,
                    success_drop,
                    confidence_drop,
                    threshold,
                    "Optimization rolled back after health dropped"
                );
            }
        }
    }

    fn baseline(&self, analysis: &AnalysisReport, health: &RecentHealth) -> Baseline {
        Baseline {
            recent: *health,
            analysis_mean_confidence: analysis.confidence.mean,
            analysis_success_rate: analysis.overall_success_rate,
            analysis_decisions: analysis.total_decisions,
            ledger_entries: self.analyzer.ledger_len(),
            policy_version: self.policy.snapshot().version,
        }
    }

    fn stability_health(&self) -> RecentHealth {
        self.analyzer
            .recent_health(Duration::minutes(self.config.stability_window_minutes))
    }

    /// Stable means recent success rate and mean confidence both exceed their thresholds.
    pub fn is_stable(&self, health: &RecentHealth) -> bool {
        match (health.success_rate, health.mean_confidence) {
            (Some(success), Some(confidence)) => {
                success > self.config.stability_success_rate
                    && confidence > self.config.stability_confidence
            }
            _ => false,
        }
    }

    /// Lock the cycle state, recovering it if an earlier cycle panicked.
    fn lock_state(&self) -> MutexGuard<'_, OptimizerState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovering optimizer state after a panicked cycle");
            self.state.clear_poison();
            PoisonError::into_inner(poisoned)
        })
    }

    fn prune_goals(&self, state: &mut OptimizerState) {
        let limit = self.config.history_limit.max(1);
        let terminal = state.goals.iter().filter(|g| g.status.is_terminal()).count();
        if terminal <= limit {
            return;
        }
        let mut excess = terminal - limit;
        state.goals.retain(|g| {
            if excess > 0 && g.status.is_terminal() {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }

    pub fn status(&self) -> OptimizationStatus {
        let health = self.stability_health();
        let stable = self.is_stable(&health);
        let policy = self.policy.snapshot();
        let state = self.lock_state();

        OptimizationStatus {
            enabled: self.config.enabled,
            interval_seconds: self.config.interval_seconds,
            cycles_run: state.cycles,
            last_cycle: state.last_cycle.clone(),
            pending_goals: state
                .goals
                .iter()
                .filter(|g| g.status == GoalStatus::Pending)
                .cloned()
                .collect(),
            completed_goals: state
                .goals
                .iter()
                .filter(|g| g.status == GoalStatus::Completed)
                .count(),
            failed_goals: state
                .goals
                .iter()
                .filter(|g| g.status == GoalStatus::Failed)
                .count(),
            history_len: state.history.len(),
            observing: state.history.count(RecordStatus::Observing),
            rolled_back: state.history.count(RecordStatus::RolledBack),
            stable,
            recent_health: health,
            policy_version: policy.version,
            low_confidence_threshold: policy.low_confidence_threshold,
            fast_paths: policy.fast_paths.len(),
            worker_adjustments: policy.worker_adjustments.clone(),
        }
    }

    /// Up to `limit` history records, newest first.
    pub fn recent_optimizations(&self, limit: usize) -> Vec<OptimizationRecord> {
        let state = self.lock_state();
        state.history.recent(limit)
    }

    /// Every goal still tracked (pending and recent terminal ones).
    pub fn goals(&self) -> Vec<OptimizationGoal> {
        let state = self.lock_state();
        state.goals.clone()
    }
}

fn record_goal_metric(status: GoalStatus) {
    metrics::counter!("switchboard_optimizer_goals_total", "status" => status.as_str())
        .increment(1);
}

fn threshold_suggestion(current: f64, step: f64, mean_confidence: f64) -> OptimizationSuggestion {
    OptimizationSuggestion {
        id: uuid::Uuid::new_v4().to_string(),
        category: OptimizationCategory::ConfidenceThreshold,
        priority: Priority::Medium,
        description: format!(
            "Mean confidence {:.2} is below target; lower the low-confidence threshold by {:.2}",
            mean_confidence, step
        ),
        current_value: json!(current),
        suggested_value: json!(current - step),
        expected_improvement: step,
        confidence: 0.5,
        supporting_data: json!({ "mean_confidence": mean_confidence }),
        action: PolicyAction::AdjustLowConfidenceThreshold { delta: -step },
    }
}

fn reduce_weight_suggestion(
    worker_id: &str,
    current: f64,
    step: f64,
    success_rate: f64,
) -> OptimizationSuggestion {
    OptimizationSuggestion {
        id: uuid::Uuid::new_v4().to_string(),
        category: OptimizationCategory::ModelPreference,
        priority: Priority::High,
        description: format!(
            "Worker {} succeeds on {:.0}% of requests; reduce its weight",
            worker_id,
            success_rate * 100.0
        ),
        current_value: json!(current),
        suggested_value: json!(current - step),
        expected_improvement: 1.0 - success_rate,
        confidence: 0.6,
        supporting_data: json!({ "success_rate": success_rate }),
        action: PolicyAction::AdjustWorkerWeight {
            worker_id: worker_id.to_string(),
            delta: -step,
        },
    }
}
