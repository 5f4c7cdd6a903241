//! Append-only log of applied optimizations

use super::goal::OptimizationGoal;
use crate::routing::{FastPathRule, RoutingPolicy};
use crate::telemetry::{OptimizationCategory, Priority, RecentHealth};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One reversible edit to the routing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum PolicyChange {
    LowConfidenceThreshold {
        from: f64,
        to: f64,
    },
    WorkerAdjustment {
        worker_id: String,
        from: f64,
        to: f64,
    },
    FastPathAdded {
        prefix: String,
        worker_id: String,
        /// Worker of a rule this one replaced
        replaced: Option<String>,
    },
}

impl PolicyChange {
    /// Undo this change on `policy`.
    pub fn revert(&self, policy: &mut RoutingPolicy) {
        match self {
            PolicyChange::LowConfidenceThreshold { from, .. } => {
                policy.low_confidence_threshold = *from;
            }
            PolicyChange::WorkerAdjustment {
                worker_id, from, ..
            } => {
                if *from == 0.0 {
                    policy.worker_adjustments.remove(worker_id);
                } else {
                    policy.worker_adjustments.insert(worker_id.clone(), *from);
                }
            }
            PolicyChange::FastPathAdded {
                prefix,
                worker_id,
                replaced,
            } => {
                policy
                    .fast_paths
                    .retain(|r| !(r.prefix == *prefix && r.worker_id == *worker_id));
                if let Some(previous) = replaced {
                    policy.fast_paths.push(FastPathRule {
                        prefix: prefix.clone(),
                        worker_id: previous.clone(),
                        created_at: Utc::now(),
                    });
                }
            }
        }
    }
}

/// Health and analysis figures captured before a goal is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub recent: RecentHealth,
    pub analysis_mean_confidence: f64,
    pub analysis_success_rate: Option<f64>,
    pub analysis_decisions: usize,
    pub ledger_entries: usize,
    pub policy_version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Changes applied; health is being watched
    Observing,
    /// Survived the observation window
    Verified,
    /// Health dropped and the changes were reverted
    RolledBack,
    /// Goal executed but nothing could be applied
    NoChanges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecord {
    pub id: String,
    pub goal_id: String,
    pub category: OptimizationCategory,
    pub priority: Priority,
    pub description: String,
    pub applied_at: DateTime<Utc>,
    pub baseline: Baseline,
    pub changes: Vec<PolicyChange>,
    /// Reasons for suggestions that were skipped
    pub skipped: Vec<String>,
    pub status: RecordStatus,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl OptimizationRecord {
    pub fn new(
        goal: &OptimizationGoal,
        baseline: Baseline,
        changes: Vec<PolicyChange>,
        skipped: Vec<String>,
    ) -> Self {
        let status = if changes.is_empty() {
            RecordStatus::NoChanges
        } else {
            RecordStatus::Observing
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            goal_id: goal.id.clone(),
            category: goal.category,
            priority: goal.priority,
            description: goal.description.clone(),
            applied_at: Utc::now(),
            baseline,
            changes,
            skipped,
            status,
            resolved_at: None,
        }
    }

    pub fn resolve(&mut self, status: RecordStatus) {
        self.status = status;
        self.resolved_at = Some(Utc::now());
    }
}

/// Bounded history, oldest records pruned first.
#[derive(Debug, Clone)]
pub struct OptimizationHistory {
    records: VecDeque<OptimizationRecord>,
    limit: usize,
}

impl OptimizationHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, record: OptimizationRecord) {
        if self.records.len() >= self.limit {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Up to `limit` records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<OptimizationRecord> {
        self.records.iter().rev().take(limit).cloned().collect()
    }

    pub fn observing_mut(&mut self) -> impl Iterator<Item = &mut OptimizationRecord> {
        self.records
            .iter_mut()
            .filter(|r| r.status == RecordStatus::Observing)
    }

    pub fn count(&self, status: RecordStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_restores_previous_values() {
        let mut policy = RoutingPolicy::default();
        policy.low_confidence_threshold = 0.65;
        policy.worker_adjustments.insert("a".to_string(), -0.1);
        policy.fast_paths.push(FastPathRule {
            prefix: "embed these sentences".to_string(),
            worker_id: "new".to_string(),
            created_at: Utc::now(),
        });

        let changes = [
            PolicyChange::LowConfidenceThreshold { from: 0.7, to: 0.65 },
            PolicyChange::WorkerAdjustment {
                worker_id: "a".to_string(),
                from: 0.0,
                to: -0.1,
            },
            PolicyChange::FastPathAdded {
                prefix: "embed these sentences".to_string(),
                worker_id: "new".to_string(),
                replaced: Some("old".to_string()),
            },
        ];
        for change in changes.iter().rev() {
            change.revert(&mut policy);
        }

        assert_eq!(policy.low_confidence_threshold, 0.7);
        assert!(policy.worker_adjustments.is_empty());
        assert_eq!(policy.fast_paths.len(), 1);
        assert_eq!(policy.fast_paths[0].worker_id, "old");
    }
}
