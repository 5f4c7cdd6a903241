//! Optimizer (control loop) configuration

use serde::{Deserialize, Serialize};

/// Targets, safety bounds and scheduling for the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    /// Mean confidence below this synthesizes a confidence goal
    pub target_confidence: f64,
    /// Worker success rate below this synthesizes a preference goal
    pub target_success_rate: f64,
    /// Minimum recent requests before a worker's success rate is judged
    pub min_worker_requests: usize,
    pub stability_success_rate: f64,
    pub stability_confidence: f64,
    pub stability_window_minutes: i64,
    /// Largest total move of the low-confidence threshold from its initial value
    pub max_confidence_adjustment: f64,
    /// Largest absolute score adjustment for any worker
    pub max_performance_adjustment: f64,
    /// Floor for the low-confidence threshold
    pub min_confidence_threshold: f64,
    pub max_fast_paths: usize,
    /// Drop in recent success rate or confidence that reverts a change
    pub rollback_threshold: f64,
    pub observation_window_minutes: i64,
    /// Optimization history records kept
    pub history_limit: usize,
    pub error_backoff_seconds: u64,
    pub shutdown_timeout_seconds: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 300,
            target_confidence: 0.8,
            target_success_rate: 0.8,
            min_worker_requests: 5,
            stability_success_rate: 0.8,
            stability_confidence: 0.8,
            stability_window_minutes: 60,
            max_confidence_adjustment: 0.1,
            max_performance_adjustment: 0.2,
            min_confidence_threshold: 0.3,
            max_fast_paths: 64,
            rollback_threshold: 0.1,
            observation_window_minutes: 30,
            history_limit: 500,
            error_backoff_seconds: 5,
            shutdown_timeout_seconds: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimizer_config_defaults() {
        let config = OptimizerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.interval_seconds, 300);
        assert_eq!(config.rollback_threshold, 0.1);
        assert_eq!(config.observation_window_minutes, 30);
    }
}
