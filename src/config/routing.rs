//! Routing configuration

use serde::{Deserialize, Serialize};

/// Router settings and the initial policy thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Characters of request text kept in each decision
    pub preview_chars: usize,
    pub low_confidence_threshold: f64,
    pub high_confidence_threshold: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            preview_chars: crate::routing::DEFAULT_PREVIEW_CHARS,
            low_confidence_threshold: 0.7,
            high_confidence_threshold: 0.95,
        }
    }
}

impl RoutingConfig {
    /// Policy used when no persisted policy exists.
    pub fn initial_policy(&self) -> crate::routing::RoutingPolicy {
        crate::routing::RoutingPolicy::new(
            self.low_confidence_threshold,
            self.high_confidence_threshold,
        )
    }
}
