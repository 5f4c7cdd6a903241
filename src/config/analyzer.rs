//! Performance analyzer configuration

use serde::{Deserialize, Serialize};

/// Windowing and issue-detection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Default analysis window
    pub window_days: u32,
    /// Fewer windowed decisions than this yields `InsufficientData`
    pub min_decisions: usize,
    /// Share of low-confidence decisions that raises an issue
    pub low_confidence_rate: f64,
    /// Capacity of each worker's recent-satisfaction window
    pub satisfaction_window: usize,
    pub satisfaction_min_samples: usize,
    pub satisfaction_threshold: f64,
    /// Share one worker must hold for a task class to count as consistent
    pub dominant_share: f64,
    pub max_workers_per_task: usize,
    /// Leading tokens forming a request prefix (also used by fast paths)
    pub pattern_prefix_tokens: usize,
    pub pattern_min_occurrences: usize,
    pub pattern_min_confidence: f64,
    pub preference_margin: f64,
    pub preference_min_samples: usize,
    /// Step applied to the low-confidence threshold by a suggestion
    pub threshold_step: f64,
    /// Step applied to a worker's score adjustment by a suggestion
    pub performance_step: f64,
    /// Maximum ledger entries kept in memory
    pub ledger_capacity: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            min_decisions: 10,
            low_confidence_rate: 0.2,
            satisfaction_window: 20,
            satisfaction_min_samples: 5,
            satisfaction_threshold: 0.6,
            dominant_share: 0.7,
            max_workers_per_task: 2,
            pattern_prefix_tokens: 3,
            pattern_min_occurrences: 3,
            pattern_min_confidence: 0.9,
            preference_margin: 0.1,
            preference_min_samples: 3,
            threshold_step: 0.05,
            performance_step: 0.1,
            ledger_capacity: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_config_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.window_days, 7);
        assert_eq!(config.min_decisions, 10);
        assert_eq!(config.satisfaction_window, 20);
        assert_eq!(config.ledger_capacity, 10_000);
    }

    #[test]
    fn test_analyzer_config_partial_toml() {
        let config: AnalyzerConfig = toml::from_str("min_decisions = 3").unwrap();
        assert_eq!(config.min_decisions, 3);
        assert_eq!(config.low_confidence_rate, 0.2);
    }
}
