//! Tunable routing policy
//!
//! The policy is the part of routing behavior the optimizer is allowed to
//! change: confidence thresholds, per-worker score adjustments, and learned
//! fast-path rules. Readers take an `Arc` snapshot; writers build a modified
//! copy and swap it in, so a request never sees a half-applied update.

use crate::persistence::{self, PersistenceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Learned prefix → worker shortcut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastPathRule {
    /// Normalized leading tokens (see [`super::prefix_key`])
    pub prefix: String,
    pub worker_id: String,
    pub created_at: DateTime<Utc>,
}

/// Immutable routing policy snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingPolicy {
    /// Incremented on every applied update
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    /// Decisions below this confidence count as low-confidence
    pub low_confidence_threshold: f64,
    /// Decisions at or above this confidence count as high-confidence
    pub high_confidence_threshold: f64,
    /// Additive adjustments to workers' effective performance score
    pub worker_adjustments: BTreeMap<String, f64>,
    pub fast_paths: Vec<FastPathRule>,
}

impl RoutingPolicy {
    pub fn new(low_confidence_threshold: f64, high_confidence_threshold: f64) -> Self {
        Self {
            version: 0,
            updated_at: Utc::now(),
            low_confidence_threshold,
            high_confidence_threshold,
            worker_adjustments: BTreeMap::new(),
            fast_paths: Vec::new(),
        }
    }

    /// Score adjustment for a worker (0 when none is set).
    pub fn adjustment(&self, worker_id: &str) -> f64 {
        self.worker_adjustments
            .get(worker_id)
            .copied()
            .unwrap_or(0.0)
    }

    /// Fast-path rule for a normalized prefix, if one exists.
    pub fn fast_path(&self, prefix: &str) -> Option<&FastPathRule> {
        if prefix.is_empty() {
            return None;
        }
        self.fast_paths.iter().find(|rule| rule.prefix == prefix)
    }
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self::new(0.7, 0.95)
    }
}

/// Shared holder of the current [`RoutingPolicy`].
pub struct PolicyStore {
    current: RwLock<Arc<RoutingPolicy>>,
    path: Option<PathBuf>,
}

impl PolicyStore {
    /// In-memory store with no backing file.
    pub fn new(policy: RoutingPolicy) -> Self {
        Self {
            current: RwLock::new(Arc::new(policy)),
            path: None,
        }
    }

    /// Store backed by `path`, starting from the persisted policy when present.
    ///
    /// A missing or unreadable file falls back to `initial`; read errors are logged.
    pub fn load_or(path: impl Into<PathBuf>, initial: RoutingPolicy) -> Self {
        let path = path.into();
        let policy = match persistence::read_json::<RoutingPolicy>(&path) {
            Ok(Some(policy)) => {
                tracing::info!(
                    path = %path.display(),
                    version = policy.version,
                    fast_paths = policy.fast_paths.len(),
                    "Loaded routing policy"
                );
                policy
            }
            Ok(None) => initial,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load routing policy, using defaults");
                initial
            }
        };

        Self {
            current: RwLock::new(Arc::new(policy)),
            path: Some(path),
        }
    }

    /// Current policy snapshot.
    pub fn snapshot(&self) -> Arc<RoutingPolicy> {
        Arc::clone(&self.current.read().expect("policy lock poisoned"))
    }

    /// Apply a modification atomically.
    ///
    /// `f` edits a private copy; on `Ok` the copy gets a new version and
    /// replaces the current policy. On `Err` nothing changes.
    pub fn update<T, E, F>(&self, f: F) -> Result<(Arc<RoutingPolicy>, T), E>
    where
        F: FnOnce(&mut RoutingPolicy) -> Result<T, E>,
    {
        let mut current = self.current.write().expect("policy lock poisoned");
        let mut next = RoutingPolicy::clone(&current);
        let output = f(&mut next)?;
        next.version = current.version + 1;
        next.updated_at = Utc::now();
        let next = Arc::new(next);
        *current = Arc::clone(&next);
        Ok((next, output))
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the current snapshot to the backing file (no-op without one).
    pub fn persist(&self) -> Result<(), PersistenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let snapshot = self.snapshot();
        persistence::write_json(path, snapshot.as_ref())
    }
}
