//! Background runner for the optimization cycle

use super::{CycleReport, Optimizer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs [`Optimizer::run_cycle`] on an interval until cancelled.
pub struct OptimizerService {
    optimizer: Arc<Optimizer>,
    interval: Duration,
    error_backoff: Duration,
}

impl OptimizerService {
    pub fn new(optimizer: Arc<Optimizer>) -> Self {
        let config = optimizer.config();
        let interval = Duration::from_secs(config.interval_seconds.max(1));
        let error_backoff = Duration::from_secs(config.error_backoff_seconds);
        Self {
            optimizer,
            interval,
            error_backoff,
        }
    }

    /// Override the cycle interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawn the loop. The first cycle runs one interval after start.
    ///
    /// Cycles run on the blocking pool; a panicking cycle is logged and the
    /// loop backs off before the next attempt.
    pub fn start(self, cancel_token: CancellationToken) -> OptimizerHandle {
        let trigger = Arc::new(Notify::new());
        let loop_trigger = Arc::clone(&trigger);
        let loop_token = cancel_token.clone();

        let join = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut interval = tokio::time::interval_at(start, self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = self.interval.as_secs(),
                "Optimizer started"
            );

            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => {
                        tracing::info!("Optimizer shutting down");
                        break;
                    }
                    _ = interval.tick() => {}
                    _ = loop_trigger.notified() => {
                        tracing::debug!("Optimization cycle triggered");
                    }
                }

                let optimizer = Arc::clone(&self.optimizer);
                match tokio::task::spawn_blocking(move || optimizer.run_cycle()).await {
                    Ok(report) => log_cycle(&report),
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            backoff_seconds = self.error_backoff.as_secs(),
                            "Optimization cycle failed"
                        );
                        tokio::select! {
                            _ = loop_token.cancelled() => break,
                            _ = tokio::time::sleep(self.error_backoff) => {}
                        }
                    }
                }
            }
        });

        OptimizerHandle {
            cancel_token,
            trigger,
            join,
        }
    }
}

fn log_cycle(report: &CycleReport) {
    if let Some(error) = &report.persist_error {
        tracing::warn!(cycle = report.cycle, error = %error, "Cycle finished with unpersisted policy");
    }
}

/// Control handle for a running [`OptimizerService`].
pub struct OptimizerHandle {
    cancel_token: CancellationToken,
    trigger: Arc<Notify>,
    join: JoinHandle<()>,
}

impl OptimizerHandle {
    /// Request a cycle ahead of the next tick.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    /// Signal the loop to stop. Safe to call more than once.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stop and wait for the loop to exit, giving up after `timeout`.
    ///
    /// Returns `false` when the loop did not exit in time. A cycle already
    /// running on the blocking pool finishes on its own.
    pub async fn shutdown(self, timeout: Duration) -> bool {
        self.stop();
        match tokio::time::timeout(timeout, self.join).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Optimizer task ended abnormally");
                true
            }
            Err(_) => {
                tracing::warn!(
                    timeout_seconds = timeout.as_secs(),
                    "Optimizer did not stop in time"
                );
                false
            }
        }
    }
}
