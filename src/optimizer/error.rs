use super::goal::GoalStatus;
use crate::persistence::PersistenceError;
use thiserror::Error;

/// Errors raised by the optimizer.
#[derive(Debug, Error)]
pub enum OptimizerError {
    /// A single suggestion could not be applied; the goal continues
    #[error("Suggestion {suggestion_id} not applied: {reason}")]
    SuggestionApplication {
        suggestion_id: String,
        reason: String,
    },

    #[error("Goal {goal_id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        goal_id: String,
        from: GoalStatus,
        to: GoalStatus,
    },

    #[error("Failed to persist routing policy: {0}")]
    Persistence(#[from] PersistenceError),
}
