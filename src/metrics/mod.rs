//! # Metrics
//!
//! Prometheus export of the `metrics` facade.
//!
//! **Counters:**
//! - `switchboard_routing_decisions_total{worker, task}`
//! - `switchboard_routing_fallbacks_total{level}`
//! - `switchboard_outcomes_total{worker, success}`
//! - `switchboard_optimizer_cycles_total{result}`
//! - `switchboard_optimizer_goals_total{status}`
//!
//! **Histograms:**
//! - `switchboard_routing_confidence`
//! - `switchboard_outcome_latency_seconds{worker}`
//!
//! **Gauges:**
//! - `switchboard_workers_total`
//! - `switchboard_ledger_entries`
//! - `switchboard_policy_version`

pub mod handler;

use crate::registry::Registry;
use crate::routing::PolicyStore;
use crate::telemetry::PerformanceAnalyzer;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

const LATENCY_BUCKETS: &[f64] = &[
    0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
];

const CONFIDENCE_BUCKETS: &[f64] = &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 0.95];

/// Computes derived gauges and renders the Prometheus text.
pub struct MetricsCollector {
    registry: Arc<Registry>,
    analyzer: Arc<PerformanceAnalyzer>,
    policy: Arc<PolicyStore>,
    start_time: Instant,
    prometheus_handle: PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(
        registry: Arc<Registry>,
        analyzer: Arc<PerformanceAnalyzer>,
        policy: Arc<PolicyStore>,
        prometheus_handle: PrometheusHandle,
    ) -> Self {
        Self {
            registry,
            analyzer,
            policy,
            start_time: Instant::now(),
            prometheus_handle,
        }
    }

    /// Refresh gauges derived from shared state.
    pub fn update_gauges(&self) {
        metrics::gauge!("switchboard_workers_total").set(self.registry.worker_count() as f64);
        metrics::gauge!("switchboard_ledger_entries").set(self.analyzer.ledger_len() as f64);
        metrics::gauge!("switchboard_policy_version").set(self.policy.snapshot().version as f64);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Install the global Prometheus recorder with latency and confidence buckets.
pub fn setup_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let handle = prometheus_builder()?.install_recorder()?;
    Ok(handle)
}

/// Handle for a recorder that is not installed globally.
///
/// Used when another recorder already owns the global slot (tests, or a
/// second server in the same process); rendering then shows nothing.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

fn prometheus_builder() -> Result<PrometheusBuilder, Box<dyn std::error::Error>> {
    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("switchboard_outcome_latency_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full("switchboard_routing_confidence".to_string()),
            CONFIDENCE_BUCKETS,
        )?;
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::routing::RoutingPolicy;
    use std::sync::{Mutex, Once};

    static INIT: Once = Once::new();
    static TEST_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

    fn get_test_handle() -> PrometheusHandle {
        INIT.call_once(|| {
            let recorder = prometheus_builder().unwrap().build_recorder();
            let handle = recorder.handle();
            *TEST_HANDLE.lock().unwrap() = Some(handle);
            metrics::set_global_recorder(Box::new(recorder)).ok();
        });
        TEST_HANDLE.lock().unwrap().as_ref().unwrap().clone()
    }

    fn collector() -> MetricsCollector {
        let policy = Arc::new(PolicyStore::new(RoutingPolicy::default()));
        let analyzer = Arc::new(PerformanceAnalyzer::new(
            AnalyzerConfig::default(),
            Arc::clone(&policy),
        ));
        MetricsCollector::new(Arc::new(Registry::new()), analyzer, policy, get_test_handle())
    }

    #[test]
    fn collector_starts_with_zero_uptime() {
        assert!(collector().uptime_seconds() < 1);
    }

    #[test]
    fn gauges_render_after_update() {
        let collector = collector();
        collector.update_gauges();
        let text = collector.render_metrics();
        assert!(text.contains("switchboard_workers_total"));
        assert!(text.contains("switchboard_policy_version"));
    }

    #[test]
    fn detached_handle_renders_without_global_recorder() {
        let handle = detached_handle();
        assert!(!handle.render().contains("switchboard_workers_total"));
    }
}
