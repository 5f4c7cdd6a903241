//! Turning analysis findings into boundable policy suggestions

use super::analysis::{AnalysisReport, Issue, Opportunity};
use crate::config::AnalyzerConfig;
use crate::routing::RoutingPolicy;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// What part of routing a suggestion (or goal) changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationCategory {
    ConfidenceThreshold,
    ModelPreference,
    PatternUpdate,
}

impl OptimizationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            OptimizationCategory::ConfidenceThreshold => "confidence_threshold",
            OptimizationCategory::ModelPreference => "model_preference",
            OptimizationCategory::PatternUpdate => "pattern_update",
        }
    }
}

/// Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Concrete policy change a suggestion asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PolicyAction {
    AdjustLowConfidenceThreshold { delta: f64 },
    AdjustWorkerWeight { worker_id: String, delta: f64 },
    AddFastPath { prefix: String, worker_id: String },
}

impl PolicyAction {
    /// Worker the action targets, if any.
    pub fn worker_id(&self) -> Option<&str> {
        match self {
            PolicyAction::AdjustLowConfidenceThreshold { .. } => None,
            PolicyAction::AdjustWorkerWeight { worker_id, .. }
            | PolicyAction::AddFastPath { worker_id, .. } => Some(worker_id),
        }
    }
}

/// A proposed policy change, read-only once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    pub id: String,
    pub category: OptimizationCategory,
    pub priority: Priority,
    pub description: String,
    pub current_value: serde_json::Value,
    pub suggested_value: serde_json::Value,
    /// Estimated gain in the targeted metric
    pub expected_improvement: f64,
    /// How much the evidence supports the change, in [0, 1]
    pub confidence: f64,
    pub supporting_data: serde_json::Value,
    pub action: PolicyAction,
}

/// Translate every issue and opportunity of a report into suggestions,
/// highest priority first.
pub fn suggestions_for(
    report: &AnalysisReport,
    config: &AnalyzerConfig,
    policy: &RoutingPolicy,
) -> Vec<OptimizationSuggestion> {
    let mut suggestions: Vec<_> = report
        .issues
        .iter()
        .map(|issue| from_issue(issue, config, policy))
        .chain(
            report
                .opportunities
                .iter()
                .map(|opportunity| from_opportunity(opportunity, config, policy)),
        )
        .collect();
    suggestions.sort_by(|a, b| b.priority.cmp(&a.priority));
    suggestions
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn from_issue(
    issue: &Issue,
    config: &AnalyzerConfig,
    policy: &RoutingPolicy,
) -> OptimizationSuggestion {
    match issue {
        Issue::HighLowConfidenceRate {
            rate,
            count,
            total,
            threshold,
        } => OptimizationSuggestion {
            id: new_id(),
            category: OptimizationCategory::ConfidenceThreshold,
            priority: Priority::Medium,
            description: format!(
                "{:.0}% of decisions fall below the low-confidence threshold {:.2}; lower it by {:.2}",
                rate * 100.0,
                threshold,
                config.threshold_step
            ),
            current_value: json!(threshold),
            suggested_value: json!(threshold - config.threshold_step),
            expected_improvement: (rate - config.low_confidence_rate).max(0.0),
            confidence: 0.7,
            supporting_data: json!({ "rate": rate, "count": count, "total": total }),
            action: PolicyAction::AdjustLowConfidenceThreshold {
                delta: -config.threshold_step,
            },
        },
        Issue::LowWorkerSatisfaction {
            worker_id,
            satisfaction,
            samples,
        } => {
            let current = policy.adjustment(worker_id);
            OptimizationSuggestion {
                id: new_id(),
                category: OptimizationCategory::ModelPreference,
                priority: Priority::High,
                description: format!(
                    "Worker {} has mean satisfaction {:.2} over {} samples; reduce its weight",
                    worker_id, satisfaction, samples
                ),
                current_value: json!(current),
                suggested_value: json!(current - config.performance_step),
                expected_improvement: (config.satisfaction_threshold - satisfaction).max(0.0),
                confidence: (*samples as f64 / config.satisfaction_window.max(1) as f64).min(1.0),
                supporting_data: json!({ "satisfaction": satisfaction, "samples": samples }),
                action: PolicyAction::AdjustWorkerWeight {
                    worker_id: worker_id.clone(),
                    delta: -config.performance_step,
                },
            }
        }
        Issue::InconsistentTaskRouting {
            task_class,
            distinct_workers,
            dominant_worker,
            dominant_share,
        } => {
            let current = policy.adjustment(dominant_worker);
            let delta = config.performance_step / 2.0;
            OptimizationSuggestion {
                id: new_id(),
                category: OptimizationCategory::ModelPreference,
                priority: Priority::Medium,
                description: format!(
                    "{} requests are spread over {} workers; favor {} ({:.0}% of traffic)",
                    task_class,
                    distinct_workers,
                    dominant_worker,
                    dominant_share * 100.0
                ),
                current_value: json!(current),
                suggested_value: json!(current + delta),
                expected_improvement: (config.dominant_share - dominant_share).max(0.0),
                confidence: 0.5,
                supporting_data: json!({
                    "task_class": task_class,
                    "distinct_workers": distinct_workers,
                    "dominant_share": dominant_share,
                }),
                action: PolicyAction::AdjustWorkerWeight {
                    worker_id: dominant_worker.clone(),
                    delta,
                },
            }
        }
    }
}

fn from_opportunity(
    opportunity: &Opportunity,
    config: &AnalyzerConfig,
    policy: &RoutingPolicy,
) -> OptimizationSuggestion {
    match opportunity {
        Opportunity::PatternConfidenceBoost {
            prefix,
            worker_id,
            occurrences,
            mean_confidence,
        } => OptimizationSuggestion {
            id: new_id(),
            category: OptimizationCategory::PatternUpdate,
            priority: Priority::Low,
            description: format!(
                "Requests starting with '{}' always route to {} (mean confidence {:.2}); add a fast path",
                prefix, worker_id, mean_confidence
            ),
            current_value: serde_json::Value::Null,
            suggested_value: json!({ "prefix": prefix, "worker_id": worker_id }),
            expected_improvement: 0.0,
            confidence: *mean_confidence,
            supporting_data: json!({ "occurrences": occurrences }),
            action: PolicyAction::AddFastPath {
                prefix: prefix.clone(),
                worker_id: worker_id.clone(),
            },
        },
        Opportunity::ModelPreferenceAdjustment {
            preferred_worker,
            preferred_satisfaction,
            runner_up,
            runner_up_satisfaction,
        } => {
            let current = policy.adjustment(preferred_worker);
            OptimizationSuggestion {
                id: new_id(),
                category: OptimizationCategory::ModelPreference,
                priority: Priority::Medium,
                description: format!(
                    "Worker {} satisfies users better than {} ({:.2} vs {:.2}); raise its weight",
                    preferred_worker, runner_up, preferred_satisfaction, runner_up_satisfaction
                ),
                current_value: json!(current),
                suggested_value: json!(current + config.performance_step),
                expected_improvement: preferred_satisfaction - runner_up_satisfaction,
                confidence: 0.6,
                supporting_data: json!({
                    "preferred_satisfaction": preferred_satisfaction,
                    "runner_up": runner_up,
                    "runner_up_satisfaction": runner_up_satisfaction,
                }),
                action: PolicyAction::AdjustWorkerWeight {
                    worker_id: preferred_worker.clone(),
                    delta: config.performance_step,
                },
            }
        }
    }
}
