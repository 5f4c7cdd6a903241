//! Route command implementation

use crate::classifier::PatternClassifier;
use crate::cli::output::{format_decision_json, format_decision_table};
use crate::cli::RouteArgs;
use crate::config::SwitchboardConfig;
use crate::routing::{PolicyStore, RouteRequest, Router};
use std::sync::Arc;

/// Classify and route one request against the configured workers.
///
/// The decision is computed but not recorded anywhere. With persistence
/// enabled the saved policy (adjustments and fast paths) is applied.
pub fn handle_route(
    args: &RouteArgs,
    config: &SwitchboardConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let registry = Arc::new(config.build_registry()?);
    let initial = config.routing.initial_policy();
    let policy = if config.persistence.enabled {
        PolicyStore::load_or(config.persistence.policy_path(), initial)
    } else {
        PolicyStore::new(initial)
    };

    let router = Router::new(
        Arc::clone(&registry),
        Arc::new(PatternClassifier::default()),
        Arc::new(policy),
    )
    .with_limits(
        config.routing.preview_chars,
        config.analyzer.pattern_prefix_tokens,
    );

    let workers = match &args.workers {
        Some(ids) => registry.resolve(ids),
        None => registry.get_all_workers(),
    };
    let decision = router.decide(&RouteRequest::new(args.text.as_str()), &workers)?;

    if args.json {
        Ok(format_decision_json(&decision)?)
    } else {
        Ok(format_decision_table(&decision))
    }
}
