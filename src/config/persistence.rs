//! Durable state configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and how often telemetry and policy state are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub enabled: bool,
    pub data_dir: PathBuf,
    /// Flush after this many new records (0 disables count-based flushing)
    pub flush_every: u64,
    pub flush_interval_seconds: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            data_dir: PathBuf::from("./data"),
            flush_every: 25,
            flush_interval_seconds: 60,
        }
    }
}

impl PersistenceConfig {
    pub fn policy_path(&self) -> PathBuf {
        self.data_dir.join("policy.json")
    }
}
