//! Configuration module for Switchboard
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`SWITCHBOARD_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use switchboard::config::SwitchboardConfig;
//!
//! let config = SwitchboardConfig::default();
//! assert_eq!(config.server.port, 8700);
//!
//! let toml = r#"
//! [server]
//! port = 9000
//!
//! [[workers]]
//! id = "minilm"
//! kind = "embedding"
//! supported_tasks = ["embedding", "similarity"]
//! performance_score = 0.9
//! "#;
//! let config: SwitchboardConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.port, 9000);
//! assert_eq!(config.workers.len(), 1);
//! ```

pub mod analyzer;
pub mod error;
pub mod logging;
pub mod optimizer;
pub mod persistence;
pub mod registry;
pub mod routing;
pub mod server;

pub use analyzer::AnalyzerConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use optimizer::OptimizerConfig;
pub use persistence::PersistenceConfig;
pub use registry::{RegistryConfig, WorkerConfig};
pub use routing::RoutingConfig;
pub use server::ServerConfig;

use crate::registry::{Registry, RegistryError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Unified configuration for the Switchboard server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SwitchboardConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub registry: RegistryConfig,
    /// Static worker definitions
    pub workers: Vec<WorkerConfig>,
    pub routing: RoutingConfig,
    pub analyzer: AnalyzerConfig,
    pub persistence: PersistenceConfig,
    pub optimizer: OptimizerConfig,
}

impl SwitchboardConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports SWITCHBOARD_* environment variables for common settings.
    /// Invalid values are ignored (the previous value is kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("SWITCHBOARD_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("SWITCHBOARD_HOST") {
            self.server.host = host;
        }

        if let Ok(level) = std::env::var("SWITCHBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SWITCHBOARD_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(dir) = std::env::var("SWITCHBOARD_DATA_DIR") {
            self.persistence.data_dir = dir.into();
        }
        if let Ok(enabled) = std::env::var("SWITCHBOARD_PERSISTENCE") {
            self.persistence.enabled = enabled.to_lowercase() == "true";
        }
        if let Ok(enabled) = std::env::var("SWITCHBOARD_OPTIMIZER") {
            self.optimizer.enabled = enabled.to_lowercase() == "true";
        }
        if let Ok(interval) = std::env::var("SWITCHBOARD_OPTIMIZER_INTERVAL") {
            if let Ok(secs) = interval.parse() {
                self.optimizer.interval_seconds = secs;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "port must be non-zero"));
        }

        if self.registry.allowed_kinds.is_empty() {
            return Err(ConfigError::invalid(
                "registry.allowed_kinds",
                "at least one worker kind must be allowed",
            ));
        }

        let allowed: HashSet<String> = self
            .registry
            .allowed_kinds
            .iter()
            .map(|k| k.trim().to_lowercase())
            .collect();
        let mut seen = HashSet::new();
        for (i, worker) in self.workers.iter().enumerate() {
            if worker.id.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("workers[{}].id", i),
                    "id cannot be empty",
                ));
            }
            if !seen.insert(worker.id.as_str()) {
                return Err(ConfigError::invalid(
                    format!("workers[{}].id", i),
                    format!("duplicate worker id '{}'", worker.id),
                ));
            }
            if !allowed.contains(&worker.kind.trim().to_lowercase()) {
                return Err(ConfigError::invalid(
                    format!("workers[{}].kind", i),
                    format!(
                        "kind '{}' is not one of the allowed kinds {:?}",
                        worker.kind, self.registry.allowed_kinds
                    ),
                ));
            }
            check_unit(
                &format!("workers[{}].performance_score", i),
                worker.performance_score,
            )?;
        }

        check_unit(
            "routing.low_confidence_threshold",
            self.routing.low_confidence_threshold,
        )?;
        check_unit(
            "routing.high_confidence_threshold",
            self.routing.high_confidence_threshold,
        )?;
        if self.routing.low_confidence_threshold >= self.routing.high_confidence_threshold {
            return Err(ConfigError::invalid(
                "routing.low_confidence_threshold",
                "must be lower than routing.high_confidence_threshold",
            ));
        }

        let analyzer = &self.analyzer;
        check_positive("analyzer.window_days", analyzer.window_days as u64)?;
        check_positive("analyzer.ledger_capacity", analyzer.ledger_capacity as u64)?;
        check_positive(
            "analyzer.satisfaction_window",
            analyzer.satisfaction_window as u64,
        )?;
        check_positive(
            "analyzer.pattern_prefix_tokens",
            analyzer.pattern_prefix_tokens as u64,
        )?;
        for (field, value) in [
            ("analyzer.low_confidence_rate", analyzer.low_confidence_rate),
            (
                "analyzer.satisfaction_threshold",
                analyzer.satisfaction_threshold,
            ),
            ("analyzer.dominant_share", analyzer.dominant_share),
            (
                "analyzer.pattern_min_confidence",
                analyzer.pattern_min_confidence,
            ),
            ("analyzer.preference_margin", analyzer.preference_margin),
            ("analyzer.threshold_step", analyzer.threshold_step),
            ("analyzer.performance_step", analyzer.performance_step),
        ] {
            check_unit(field, value)?;
        }

        check_positive(
            "persistence.flush_interval_seconds",
            self.persistence.flush_interval_seconds,
        )?;

        let optimizer = &self.optimizer;
        check_positive("optimizer.interval_seconds", optimizer.interval_seconds)?;
        check_positive(
            "optimizer.stability_window_minutes",
            optimizer.stability_window_minutes.max(0) as u64,
        )?;
        check_positive(
            "optimizer.observation_window_minutes",
            optimizer.observation_window_minutes.max(0) as u64,
        )?;
        for (field, value) in [
            ("optimizer.target_confidence", optimizer.target_confidence),
            ("optimizer.target_success_rate", optimizer.target_success_rate),
            (
                "optimizer.stability_success_rate",
                optimizer.stability_success_rate,
            ),
            (
                "optimizer.stability_confidence",
                optimizer.stability_confidence,
            ),
            (
                "optimizer.max_confidence_adjustment",
                optimizer.max_confidence_adjustment,
            ),
            (
                "optimizer.max_performance_adjustment",
                optimizer.max_performance_adjustment,
            ),
            (
                "optimizer.min_confidence_threshold",
                optimizer.min_confidence_threshold,
            ),
            ("optimizer.rollback_threshold", optimizer.rollback_threshold),
        ] {
            check_unit(field, value)?;
        }

        Ok(())
    }

    /// Build a registry holding every configured worker.
    pub fn build_registry(&self) -> Result<Registry, RegistryError> {
        let registry = Registry::with_allowed_kinds(&self.registry.allowed_kinds);
        for worker in &self.workers {
            registry.add_worker(worker.to_profile())?;
        }
        Ok(registry)
    }
}

fn check_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::invalid(
            field,
            format!("{} is outside [0, 1]", value),
        ));
    }
    Ok(())
}

fn check_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be greater than zero"));
    }
    Ok(())
}
