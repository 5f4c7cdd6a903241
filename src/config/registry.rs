//! Worker registry configuration

use crate::classifier::TaskClass;
use crate::registry::{ResourceTier, WorkerKind, WorkerProfile};
use serde::{Deserialize, Serialize};

/// Registry-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Worker kinds accepted at startup; anything else is rejected
    pub allowed_kinds: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            allowed_kinds: vec![
                WorkerKind::EMBEDDING.to_string(),
                WorkerKind::GENERATIVE.to_string(),
            ],
        }
    }
}

/// Static worker definition (`[[workers]]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub supported_tasks: Vec<TaskClass>,
    #[serde(default = "default_performance_score")]
    pub performance_score: f64,
    #[serde(default)]
    pub resource_tier: ResourceTier,
}

fn default_performance_score() -> f64 {
    0.5
}

impl WorkerConfig {
    pub fn to_profile(&self) -> WorkerProfile {
        WorkerProfile::new(
            self.id.clone(),
            WorkerKind::new(&self.kind),
            self.supported_tasks.iter().copied(),
            self.performance_score,
            self.resource_tier,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_config_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.allowed_kinds, vec!["embedding", "generative"]);
    }

    #[test]
    fn test_worker_config_parse() {
        let toml = r#"
        id = "minilm"
        kind = "Embedding"
        supported_tasks = ["embedding", "similarity"]
        performance_score = 0.9
        resource_tier = "low"
        "#;
        let worker: WorkerConfig = toml::from_str(toml).unwrap();
        let profile = worker.to_profile();

        assert_eq!(profile.id, "minilm");
        assert!(profile.kind.is_embedding());
        assert!(profile.supports(TaskClass::Similarity));
        assert_eq!(profile.resource_tier, ResourceTier::Low);
    }

    #[test]
    fn test_worker_config_defaults() {
        let worker: WorkerConfig = toml::from_str("id = \"w\"\nkind = \"generative\"").unwrap();
        assert_eq!(worker.performance_score, 0.5);
        assert!(worker.supported_tasks.is_empty());
        assert_eq!(worker.resource_tier, ResourceTier::Medium);
    }
}
