//! Optimization goals and their one-way state machine

use super::OptimizerError;
use crate::telemetry::{OptimizationCategory, OptimizationSuggestion, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `Pending → InProgress → {Completed | Failed}`; terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl GoalStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GoalStatus::Completed | GoalStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GoalStatus::Pending => "pending",
            GoalStatus::InProgress => "in_progress",
            GoalStatus::Completed => "completed",
            GoalStatus::Failed => "failed",
        }
    }

    fn can_become(self, next: GoalStatus) -> bool {
        matches!(
            (self, next),
            (GoalStatus::Pending, GoalStatus::InProgress)
                | (GoalStatus::InProgress, GoalStatus::Completed)
                | (GoalStatus::InProgress, GoalStatus::Failed)
        )
    }
}

/// A proposed, bounded change to routing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationGoal {
    pub id: String,
    pub category: OptimizationCategory,
    pub priority: Priority,
    pub description: String,
    /// Stable key of the metric this goal moves, e.g. `worker:llama:success_rate`
    pub target_metric: String,
    pub current_value: f64,
    pub target_value: f64,
    pub linked_suggestions: Vec<OptimizationSuggestion>,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl OptimizationGoal {
    pub fn new(
        category: OptimizationCategory,
        priority: Priority,
        description: impl Into<String>,
        target_metric: impl Into<String>,
        current_value: f64,
        target_value: f64,
        linked_suggestions: Vec<OptimizationSuggestion>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category,
            priority,
            description: description.into(),
            target_metric: target_metric.into(),
            current_value,
            target_value,
            linked_suggestions,
            status: GoalStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            note: None,
        }
    }

    /// Whether `other` describes the same objective.
    pub fn same_objective(&self, other: &OptimizationGoal) -> bool {
        self.category == other.category && self.target_metric == other.target_metric
    }

    /// Take over the measurements and suggestions of a newer synthesis.
    pub fn refresh_from(&mut self, newer: OptimizationGoal) {
        self.priority = newer.priority;
        self.description = newer.description;
        self.current_value = newer.current_value;
        self.target_value = newer.target_value;
        self.linked_suggestions = newer.linked_suggestions;
    }

    pub fn transition(&mut self, next: GoalStatus) -> Result<(), OptimizerError> {
        if !self.status.can_become(next) {
            return Err(OptimizerError::InvalidTransition {
                goal_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), OptimizerError> {
        self.transition(GoalStatus::InProgress)
    }

    pub fn finish(&mut self, success: bool) -> Result<(), OptimizerError> {
        self.transition(if success {
            GoalStatus::Completed
        } else {
            GoalStatus::Failed
        })
    }
}
