//! Worker Registry module.
//!
//! Provides thread-safe in-memory storage and querying of inference workers.

mod error;
mod worker;

pub use error::*;
pub use worker::*;

use dashmap::DashMap;
use std::collections::BTreeSet;

/// The Worker Registry stores all known inference workers.
///
/// Read-mostly catalog backed by a concurrent map. Every worker is validated
/// against the configured set of allowed kinds when it is added.
///
/// # Examples
///
/// ```
/// use switchboard::classifier::TaskClass;
/// use switchboard::registry::{Registry, ResourceTier, WorkerKind, WorkerProfile};
///
/// let registry = Registry::new();
/// let worker = WorkerProfile::new(
///     "llama",
///     WorkerKind::generative(),
///     [TaskClass::Conversation],
///     0.8,
///     ResourceTier::High,
/// );
///
/// registry.add_worker(worker).unwrap();
/// assert_eq!(registry.worker_count(), 1);
/// ```
pub struct Registry {
    workers: DashMap<String, WorkerProfile>,
    allowed_kinds: BTreeSet<String>,
}

impl Registry {
    /// Create an empty registry accepting the `embedding` and `generative` kinds.
    pub fn new() -> Self {
        Self::with_allowed_kinds([WorkerKind::EMBEDDING, WorkerKind::GENERATIVE])
    }

    /// Create an empty registry accepting the given kinds.
    pub fn with_allowed_kinds<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            workers: DashMap::new(),
            allowed_kinds: kinds
                .into_iter()
                .map(|k| WorkerKind::new(k).as_str().to_string())
                .collect(),
        }
    }

    /// Kinds this registry accepts, sorted.
    pub fn allowed_kinds(&self) -> Vec<String> {
        self.allowed_kinds.iter().cloned().collect()
    }

    /// Check a profile against the registry's rules without inserting it.
    pub fn validate(&self, worker: &WorkerProfile) -> Result<(), RegistryError> {
        if !self.allowed_kinds.contains(worker.kind.as_str()) {
            return Err(RegistryError::UnknownKind {
                id: worker.id.clone(),
                kind: worker.kind.to_string(),
                allowed: self.allowed_kinds(),
            });
        }
        if !worker.performance_score.is_finite()
            || !(0.0..=1.0).contains(&worker.performance_score)
        {
            return Err(RegistryError::InvalidScore {
                id: worker.id.clone(),
                score: worker.performance_score,
            });
        }
        Ok(())
    }

    /// Add a new worker to the registry.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateWorker` if the ID is taken, and
    /// `UnknownKind` / `InvalidScore` if the profile fails validation.
    pub fn add_worker(&self, worker: WorkerProfile) -> Result<(), RegistryError> {
        self.validate(&worker)?;

        match self.workers.entry(worker.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(RegistryError::DuplicateWorker(worker.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(worker);
                Ok(())
            }
        }
    }

    /// Remove a worker from the registry.
    ///
    /// Decisions already in the ledger keep referring to the removed ID.
    pub fn remove_worker(&self, id: &str) -> Result<WorkerProfile, RegistryError> {
        self.workers
            .remove(id)
            .map(|(_, worker)| worker)
            .ok_or_else(|| RegistryError::WorkerNotFound(id.to_string()))
    }

    /// Get a worker by ID.
    pub fn get_worker(&self, id: &str) -> Option<WorkerProfile> {
        self.workers.get(id).map(|entry| entry.value().clone())
    }

    /// Whether a worker with this ID is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.workers.contains_key(id)
    }

    /// Get all workers, sorted by ID.
    pub fn get_all_workers(&self) -> Vec<WorkerProfile> {
        let mut workers: Vec<_> = self
            .workers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        workers.sort_by(|a, b| a.id.cmp(&b.id));
        workers
    }

    /// Resolve worker IDs to profiles, preserving input order.
    ///
    /// Unknown IDs are skipped.
    pub fn resolve(&self, ids: &[String]) -> Vec<WorkerProfile> {
        ids.iter()
            .filter_map(|id| {
                let worker = self.get_worker(id);
                if worker.is_none() {
                    tracing::debug!(worker_id = %id, "Ignoring unregistered worker id");
                }
                worker
            })
            .collect()
    }

    /// Get the number of registered workers.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Administrative update of a worker's base performance score.
    pub fn update_performance_score(&self, id: &str, score: f64) -> Result<(), RegistryError> {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(RegistryError::InvalidScore {
                id: id.to_string(),
                score,
            });
        }
        let mut worker = self
            .workers
            .get_mut(id)
            .ok_or_else(|| RegistryError::WorkerNotFound(id.to_string()))?;
        worker.performance_score = score;
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
