//! Routing decision records

use crate::classifier::TaskClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which selection rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// A learned prefix rule pinned the worker
    FastPath,
    /// Best worker declaring support for the task class
    Specialized,
    /// No specialized worker; best generative worker instead
    GenericFallback,
    /// Nothing else applied; first available worker
    LastResort,
}

impl RouteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteKind::FastPath => "fast_path",
            RouteKind::Specialized => "specialized",
            RouteKind::GenericFallback => "generic_fallback",
            RouteKind::LastResort => "last_resort",
        }
    }

    /// Whether the decision fell back from specialized routing.
    pub fn is_fallback(self) -> bool {
        matches!(self, RouteKind::GenericFallback | RouteKind::LastResort)
    }
}

/// Immutable record of which worker was chosen for a request, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Caller-supplied correlation id, unique across the ledger
    pub request_id: String,
    /// Truncated request text, for display
    pub request_preview: String,
    /// `prefix_key` of the full request text, for pattern analysis
    #[serde(default)]
    pub request_prefix: String,
    /// ID of the selected worker
    pub selected_worker: String,
    pub task_class: TaskClass,
    /// Confidence in [0, 0.95]
    pub confidence: f64,
    pub rationale: String,
    pub route_kind: RouteKind,
    pub timestamp: DateTime<Utc>,
}

/// Normalized leading-token key used for fast-path rules and prefix analysis.
///
/// Lower-cases the text and joins its first `tokens` whitespace-separated words.
pub fn prefix_key(text: &str, tokens: usize) -> String {
    text.split_whitespace()
        .take(tokens)
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
