//! Workers command implementation

use crate::cli::output::{format_workers_json, format_workers_table, WorkerView};
use crate::cli::WorkersArgs;
use crate::config::SwitchboardConfig;

/// List configured workers, validated against the allowed kinds.
pub fn handle_workers(
    args: &WorkersArgs,
    config: &SwitchboardConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let registry = config.build_registry()?;
    let views: Vec<WorkerView> = registry
        .get_all_workers()
        .iter()
        .map(WorkerView::from)
        .collect();

    if args.json {
        Ok(format_workers_json(&views)?)
    } else {
        Ok(format_workers_table(&views))
    }
}
