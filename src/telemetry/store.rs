//! Durable telemetry state and the background flusher

use super::ledger::LedgerEntry;
use super::stats::WorkerStats;
use super::{PerformanceAnalyzer, TelemetryError};
use crate::persistence::{self, PersistenceError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const LEDGER_FILE: &str = "ledger.json";
const STATS_FILE: &str = "worker_stats.json";

/// Point-in-time copy of the ledger and per-worker stats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub ledger: Vec<LedgerEntry>,
    pub worker_stats: BTreeMap<String, WorkerStats>,
}

/// Reads and writes `ledger.json` and `worker_stats.json` in a data directory.
#[derive(Debug, Clone)]
pub struct TelemetryStore {
    dir: PathBuf,
}

impl TelemetryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.dir.join(LEDGER_FILE)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.dir.join(STATS_FILE)
    }

    pub fn save(&self, snapshot: &TelemetrySnapshot) -> Result<(), PersistenceError> {
        persistence::write_json(&self.ledger_path(), &snapshot.ledger)?;
        persistence::write_json(&self.stats_path(), &snapshot.worker_stats)?;
        Ok(())
    }

    /// Load persisted state; `None` when nothing has been written yet.
    pub fn load(&self) -> Result<Option<TelemetrySnapshot>, PersistenceError> {
        let ledger = persistence::read_json::<Vec<LedgerEntry>>(&self.ledger_path())?;
        let worker_stats =
            persistence::read_json::<BTreeMap<String, WorkerStats>>(&self.stats_path())?;

        match (ledger, worker_stats) {
            (None, None) => Ok(None),
            (ledger, worker_stats) => Ok(Some(TelemetrySnapshot {
                ledger: ledger.unwrap_or_default(),
                worker_stats: worker_stats.unwrap_or_default(),
            })),
        }
    }
}

/// Background task writing analyzer state to a [`TelemetryStore`].
///
/// Flushes when the analyzer signals that enough records accumulated, on a
/// fixed interval, and once more on shutdown.
pub struct TelemetryFlusher {
    analyzer: Arc<PerformanceAnalyzer>,
    store: Arc<TelemetryStore>,
    interval: Duration,
}

impl TelemetryFlusher {
    pub fn new(
        analyzer: Arc<PerformanceAnalyzer>,
        store: Arc<TelemetryStore>,
        interval: Duration,
    ) -> Self {
        Self {
            analyzer,
            store,
            interval,
        }
    }

    /// Write pending records, if any. Returns whether a write happened.
    ///
    /// The snapshot is taken under the analyzer's read lock; the file write
    /// runs on the blocking pool after the lock is released. On failure the
    /// pending count is restored so the next flush retries.
    pub async fn flush(&self) -> Result<bool, TelemetryError> {
        let pending = self.analyzer.unflushed();
        if pending == 0 {
            return Ok(false);
        }

        let snapshot = self.analyzer.snapshot();
        self.analyzer.mark_flushed(pending);

        let store = Arc::clone(&self.store);
        let entries = snapshot.ledger.len();
        let result = tokio::task::spawn_blocking(move || store.save(&snapshot)).await;

        match result {
            Ok(Ok(())) => {
                tracing::debug!(entries, records = pending, "Telemetry flushed");
                Ok(true)
            }
            Ok(Err(e)) => {
                self.analyzer.mark_unflushed(pending);
                Err(TelemetryError::Persistence(e))
            }
            Err(join_error) => {
                self.analyzer.mark_unflushed(pending);
                Err(TelemetryError::Persistence(PersistenceError::Io {
                    path: self.store.dir().to_path_buf(),
                    source: std::io::Error::other(join_error.to_string()),
                }))
            }
        }
    }

    /// Spawn the flush loop.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let signal = self.analyzer.flush_signal();

            tracing::info!(
                dir = %self.store.dir().display(),
                interval_seconds = self.interval.as_secs(),
                "Telemetry flusher started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        if let Err(e) = self.flush().await {
                            tracing::error!(error = %e, "Final telemetry flush failed");
                        }
                        tracing::info!("Telemetry flusher shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = self.flush().await {
                            tracing::warn!(error = %e, "Telemetry flush failed, will retry");
                        }
                    }
                    _ = signal.notified() => {
                        if let Err(e) = self.flush().await {
                            tracing::warn!(error = %e, "Telemetry flush failed, will retry");
                        }
                    }
                }
            }
        })
    }
}
