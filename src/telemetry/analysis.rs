//! Windowed analysis over the decision ledger

use super::ledger::LedgerEntry;
use super::stats::WorkerStats;
use crate::classifier::TaskClass;
use crate::config::AnalyzerConfig;
use crate::routing::RoutingPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of an analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Report(AnalysisReport),
    /// Too few decisions in the window; callers skip this round
    InsufficientData { found: usize, required: usize },
}

impl AnalysisOutcome {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            AnalysisOutcome::Report(report) => Some(report),
            AnalysisOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn into_report(self) -> Option<AnalysisReport> {
        match self {
            AnalysisOutcome::Report(report) => Some(report),
            AnalysisOutcome::InsufficientData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub window_days: u32,
    pub total_decisions: usize,
    pub workers: BTreeMap<String, WorkerAnalysis>,
    pub task_distribution: BTreeMap<TaskClass, u64>,
    pub confidence: ConfidenceStats,
    /// Success rate over windowed decisions with a reported outcome
    pub overall_success_rate: Option<f64>,
    pub issues: Vec<Issue>,
    pub opportunities: Vec<Opportunity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerAnalysis {
    pub recent_request_count: usize,
    pub outcomes_reported: usize,
    pub success_rate: Option<f64>,
    pub avg_confidence: f64,
    pub task_distribution: BTreeMap<TaskClass, u64>,
    /// Mean of the worker's recent-satisfaction window
    pub mean_satisfaction: Option<f64>,
    pub satisfaction_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub mean: f64,
    pub median: f64,
    pub below_low_threshold: usize,
    pub above_high_threshold: usize,
    pub low_threshold: f64,
    pub high_threshold: f64,
}

/// A problem detected in the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    HighLowConfidenceRate {
        rate: f64,
        count: usize,
        total: usize,
        threshold: f64,
    },
    LowWorkerSatisfaction {
        worker_id: String,
        satisfaction: f64,
        samples: usize,
    },
    InconsistentTaskRouting {
        task_class: TaskClass,
        distinct_workers: usize,
        dominant_worker: String,
        dominant_share: f64,
    },
}

impl Issue {
    pub fn kind(&self) -> &'static str {
        match self {
            Issue::HighLowConfidenceRate { .. } => "high_low_confidence_rate",
            Issue::LowWorkerSatisfaction { .. } => "low_worker_satisfaction",
            Issue::InconsistentTaskRouting { .. } => "inconsistent_task_routing",
        }
    }
}

/// Something that could be improved even though nothing is wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Opportunity {
    PatternConfidenceBoost {
        prefix: String,
        worker_id: String,
        occurrences: usize,
        mean_confidence: f64,
    },
    ModelPreferenceAdjustment {
        preferred_worker: String,
        preferred_satisfaction: f64,
        runner_up: String,
        runner_up_satisfaction: f64,
    },
}

impl Opportunity {
    pub fn kind(&self) -> &'static str {
        match self {
            Opportunity::PatternConfidenceBoost { .. } => "pattern_confidence_boost",
            Opportunity::ModelPreferenceAdjustment { .. } => "model_preference_adjustment",
        }
    }
}

/// Build a report from the windowed ledger entries.
pub(crate) fn build_report(
    window: &[&LedgerEntry],
    stats: &BTreeMap<String, WorkerStats>,
    config: &AnalyzerConfig,
    policy: &RoutingPolicy,
    window_days: u32,
    now: DateTime<Utc>,
) -> AnalysisReport {
    let confidence = confidence_stats(window, policy);
    let workers = worker_analyses(window, stats);

    let mut task_distribution: BTreeMap<TaskClass, u64> = BTreeMap::new();
    for entry in window {
        *task_distribution.entry(entry.decision.task_class).or_default() += 1;
    }

    let (successes, reported) = window
        .iter()
        .filter_map(|e| e.outcome.success)
        .fold((0usize, 0usize), |(s, n), ok| (s + ok as usize, n + 1));
    let overall_success_rate = (reported > 0).then(|| successes as f64 / reported as f64);

    let mut issues = Vec::new();
    if !window.is_empty() {
        let rate = confidence.below_low_threshold as f64 / window.len() as f64;
        if rate > config.low_confidence_rate {
            issues.push(Issue::HighLowConfidenceRate {
                rate,
                count: confidence.below_low_threshold,
                total: window.len(),
                threshold: confidence.low_threshold,
            });
        }
    }
    issues.extend(low_satisfaction_issues(stats, config));
    issues.extend(inconsistent_routing_issues(window, config));

    let mut opportunities = pattern_opportunities(window, config, policy);
    opportunities.extend(preference_opportunity(window, config));

    AnalysisReport {
        generated_at: now,
        window_days,
        total_decisions: window.len(),
        workers,
        task_distribution,
        confidence,
        overall_success_rate,
        issues,
        opportunities,
    }
}

fn confidence_stats(window: &[&LedgerEntry], policy: &RoutingPolicy) -> ConfidenceStats {
    let mut values: Vec<f64> = window.iter().map(|e| e.decision.confidence).collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let mean = if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    };
    let median = match values.len() {
        0 => 0.0,
        n if n % 2 == 1 => values[n / 2],
        n => (values[n / 2 - 1] + values[n / 2]) / 2.0,
    };

    ConfidenceStats {
        mean,
        median,
        below_low_threshold: values
            .iter()
            .filter(|c| **c < policy.low_confidence_threshold)
            .count(),
        above_high_threshold: values
            .iter()
            .filter(|c| **c >= policy.high_confidence_threshold)
            .count(),
        low_threshold: policy.low_confidence_threshold,
        high_threshold: policy.high_confidence_threshold,
    }
}

fn worker_analyses(
    window: &[&LedgerEntry],
    stats: &BTreeMap<String, WorkerStats>,
) -> BTreeMap<String, WorkerAnalysis> {
    let mut grouped: BTreeMap<&str, Vec<&LedgerEntry>> = BTreeMap::new();
    for entry in window {
        grouped
            .entry(entry.decision.selected_worker.as_str())
            .or_default()
            .push(*entry);
    }

    grouped
        .into_iter()
        .map(|(worker_id, entries)| {
            let mut task_distribution: BTreeMap<TaskClass, u64> = BTreeMap::new();
            for e in &entries {
                *task_distribution.entry(e.decision.task_class).or_default() += 1;
            }
            let outcomes: Vec<bool> = entries.iter().filter_map(|e| e.outcome.success).collect();
            let satisfaction = stats.get(worker_id).map(|s| &s.recent_satisfaction);

            let analysis = WorkerAnalysis {
                recent_request_count: entries.len(),
                outcomes_reported: outcomes.len(),
                success_rate: (!outcomes.is_empty()).then(|| {
                    outcomes.iter().filter(|ok| **ok).count() as f64 / outcomes.len() as f64
                }),
                avg_confidence: entries.iter().map(|e| e.decision.confidence).sum::<f64>()
                    / entries.len() as f64,
                task_distribution,
                mean_satisfaction: satisfaction.and_then(|w| w.mean()),
                satisfaction_samples: satisfaction.map_or(0, |w| w.len()),
            };
            (worker_id.to_string(), analysis)
        })
        .collect()
}

fn low_satisfaction_issues(
    stats: &BTreeMap<String, WorkerStats>,
    config: &AnalyzerConfig,
) -> Vec<Issue> {
    stats
        .values()
        .filter(|s| s.recent_satisfaction.len() >= config.satisfaction_min_samples)
        .filter_map(|s| {
            let mean = s.recent_satisfaction.mean()?;
            (mean < config.satisfaction_threshold).then(|| Issue::LowWorkerSatisfaction {
                worker_id: s.worker_id.clone(),
                satisfaction: mean,
                samples: s.recent_satisfaction.len(),
            })
        })
        .collect()
}

fn inconsistent_routing_issues(window: &[&LedgerEntry], config: &AnalyzerConfig) -> Vec<Issue> {
    let mut per_task: BTreeMap<TaskClass, BTreeMap<&str, u64>> = BTreeMap::new();
    for entry in window {
        *per_task
            .entry(entry.decision.task_class)
            .or_default()
            .entry(entry.decision.selected_worker.as_str())
            .or_default() += 1;
    }

    per_task
        .into_iter()
        .filter(|(_, workers)| workers.len() > config.max_workers_per_task)
        .filter_map(|(task_class, workers)| {
            let total: u64 = workers.values().sum();
            // BTreeMap iteration makes the lowest id win ties
            let (dominant, count) = workers
                .iter()
                .fold(None::<(&str, u64)>, |best, (id, n)| match best {
                    Some((_, best_n)) if best_n >= *n => best,
                    _ => Some((*id, *n)),
                })?;
            let share = count as f64 / total as f64;
            (share < config.dominant_share).then(|| Issue::InconsistentTaskRouting {
                task_class,
                distinct_workers: workers.len(),
                dominant_worker: dominant.to_string(),
                dominant_share: share,
            })
        })
        .collect()
}

fn pattern_opportunities(
    window: &[&LedgerEntry],
    config: &AnalyzerConfig,
    policy: &RoutingPolicy,
) -> Vec<Opportunity> {
    let mut by_prefix: BTreeMap<String, Vec<&LedgerEntry>> = BTreeMap::new();
    for entry in window {
        let key = &entry.decision.request_prefix;
        if !key.is_empty() {
            by_prefix.entry(key.clone()).or_default().push(*entry);
        }
    }

    by_prefix
        .into_iter()
        .filter(|(_, entries)| entries.len() >= config.pattern_min_occurrences)
        .filter_map(|(prefix, entries)| {
            let worker_id = &entries[0].decision.selected_worker;
            if entries
                .iter()
                .any(|e| &e.decision.selected_worker != worker_id)
            {
                return None;
            }
            if policy
                .fast_path(&prefix)
                .is_some_and(|rule| &rule.worker_id == worker_id)
            {
                return None;
            }
            let mean = entries.iter().map(|e| e.decision.confidence).sum::<f64>()
                / entries.len() as f64;
            (mean > config.pattern_min_confidence).then(|| Opportunity::PatternConfidenceBoost {
                worker_id: worker_id.clone(),
                occurrences: entries.len(),
                mean_confidence: mean,
                prefix,
            })
        })
        .collect()
}

fn preference_opportunity(window: &[&LedgerEntry], config: &AnalyzerConfig) -> Option<Opportunity> {
    let mut samples: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for entry in window {
        if entry.outcome.success != Some(true) {
            continue;
        }
        if let Some(satisfaction) = entry.outcome.user_satisfaction {
            samples
                .entry(entry.decision.selected_worker.as_str())
                .or_default()
                .push(satisfaction);
        }
    }

    let mut means: Vec<(&str, f64)> = samples
        .into_iter()
        .filter(|(_, values)| values.len() >= config.preference_min_samples)
        .map(|(id, values)| (id, values.iter().sum::<f64>() / values.len() as f64))
        .collect();
    means.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let (best, runner_up) = match means.as_slice() {
        [best, runner_up, ..] => (*best, *runner_up),
        _ => return None,
    };
    (best.1 - runner_up.1 > config.preference_margin).then(|| {
        Opportunity::ModelPreferenceAdjustment {
            preferred_worker: best.0.to_string(),
            preferred_satisfaction: best.1,
            runner_up: runner_up.0.to_string(),
            runner_up_satisfaction: runner_up.1,
        }
    })
}
