//! Per-worker rolling statistics

use crate::classifier::TaskClass;
use crate::routing::RoutingDecision;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Fixed-capacity FIFO of samples; pushing past capacity evicts the oldest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl BoundedWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a sample, returning the evicted one if the window was full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.values.len() >= self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Samples, oldest first.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Change capacity, dropping the oldest samples if needed.
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }
}

/// Rolling aggregate for one worker.
///
/// `total_requests` and `task_distribution` track the decisions currently in
/// the ledger (they shrink when entries are evicted); the running averages
/// are incremental means over the worker's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker_id: String,
    pub total_requests: u64,
    pub lifetime_requests: u64,
    pub running_avg_confidence: f64,
    pub running_avg_latency_ms: f64,
    pub latency_samples: u64,
    pub successes: u64,
    pub failures: u64,
    pub running_avg_quality: f64,
    pub quality_samples: u64,
    pub task_distribution: BTreeMap<TaskClass, u64>,
    pub recent_satisfaction: BoundedWindow,
    pub last_updated: DateTime<Utc>,
}

impl WorkerStats {
    pub fn new(worker_id: impl Into<String>, satisfaction_window: usize) -> Self {
        Self {
            worker_id: worker_id.into(),
            total_requests: 0,
            lifetime_requests: 0,
            running_avg_confidence: 0.0,
            running_avg_latency_ms: 0.0,
            latency_samples: 0,
            successes: 0,
            failures: 0,
            running_avg_quality: 0.0,
            quality_samples: 0,
            task_distribution: BTreeMap::new(),
            recent_satisfaction: BoundedWindow::new(satisfaction_window),
            last_updated: Utc::now(),
        }
    }

    pub fn record_decision(&mut self, decision: &RoutingDecision) {
        self.total_requests += 1;
        self.lifetime_requests += 1;
        self.running_avg_confidence = incremental_mean(
            self.running_avg_confidence,
            decision.confidence,
            self.lifetime_requests,
        );
        *self.task_distribution.entry(decision.task_class).or_default() += 1;
        self.last_updated = Utc::now();
    }

    /// Forget a decision that left the ledger.
    pub fn evict(&mut self, decision: &RoutingDecision) {
        self.total_requests = self.total_requests.saturating_sub(1);
        if let Some(count) = self.task_distribution.get_mut(&decision.task_class) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.task_distribution.remove(&decision.task_class);
            }
        }
    }

    pub fn record_latency(&mut self, latency_ms: f64) {
        self.latency_samples += 1;
        self.running_avg_latency_ms =
            incremental_mean(self.running_avg_latency_ms, latency_ms, self.latency_samples);
        self.last_updated = Utc::now();
    }

    pub fn record_success(&mut self, success: bool) {
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.last_updated = Utc::now();
    }

    pub fn record_satisfaction(&mut self, satisfaction: f64) {
        self.recent_satisfaction.push(satisfaction);
        self.last_updated = Utc::now();
    }

    pub fn record_quality(&mut self, quality: f64) {
        self.quality_samples += 1;
        self.running_avg_quality =
            incremental_mean(self.running_avg_quality, quality, self.quality_samples);
        self.last_updated = Utc::now();
    }

    /// Lifetime success rate over outcomes that reported success.
    pub fn success_rate(&self) -> Option<f64> {
        let reported = self.successes + self.failures;
        (reported > 0).then(|| self.successes as f64 / reported as f64)
    }
}

fn incremental_mean(mean: f64, value: f64, count: u64) -> f64 {
    if count == 0 {
        return mean;
    }
    mean + (value - mean) / count as f64
}
