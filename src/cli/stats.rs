//! Stats command implementation

use crate::cli::output::{format_summary_json, format_summary_table};
use crate::cli::StatsArgs;
use crate::config::SwitchboardConfig;
use crate::routing::{PolicyStore, RoutingPolicy};
use crate::telemetry::{PerformanceAnalyzer, TelemetryStore};
use std::sync::Arc;

/// Performance summary computed from the persisted ledger and statistics.
pub fn handle_stats(
    args: &StatsArgs,
    config: &SwitchboardConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| config.persistence.data_dir.clone());
    let store = TelemetryStore::new(&dir);

    let analyzer = PerformanceAnalyzer::new(
        config.analyzer.clone(),
        Arc::new(PolicyStore::new(RoutingPolicy::default())),
    );
    match store.load()? {
        Some(snapshot) => analyzer.restore(snapshot),
        None => tracing::debug!(dir = %dir.display(), "No persisted telemetry"),
    }

    let summary = analyzer.performance_summary();
    if args.json {
        Ok(format_summary_json(&summary)?)
    } else {
        Ok(format_summary_table(&summary))
    }
}
