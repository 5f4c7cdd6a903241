//! Output formatting helpers for CLI commands

use crate::registry::{ResourceTier, WorkerProfile};
use crate::routing::{RouteKind, RoutingDecision};
use crate::telemetry::PerformanceSummary;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// View model for worker display
#[derive(Debug, Clone, serde::Serialize)]
pub struct WorkerView {
    pub id: String,
    pub kind: String,
    pub tasks: Vec<String>,
    pub performance_score: f64,
    pub resource_tier: ResourceTier,
}

impl From<&WorkerProfile> for WorkerView {
    fn from(worker: &WorkerProfile) -> Self {
        Self {
            id: worker.id.clone(),
            kind: worker.kind.as_str().to_string(),
            tasks: worker
                .supported_tasks
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
            performance_score: worker.performance_score,
            resource_tier: worker.resource_tier,
        }
    }
}

fn tier_label(tier: ResourceTier) -> String {
    match tier {
        ResourceTier::Low => "low".green().to_string(),
        ResourceTier::Medium => "medium".yellow().to_string(),
        ResourceTier::High => "high".red().to_string(),
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Format workers as a table
pub fn format_workers_table(workers: &[WorkerView]) -> String {
    let mut table = new_table(vec!["ID", "Kind", "Tasks", "Score", "Tier"]);
    for w in workers {
        table.add_row(vec![
            Cell::new(&w.id),
            Cell::new(&w.kind),
            Cell::new(w.tasks.join(", ")),
            Cell::new(format!("{:.2}", w.performance_score)),
            Cell::new(tier_label(w.resource_tier)),
        ]);
    }
    table.to_string()
}

/// Format workers as JSON
pub fn format_workers_json(workers: &[WorkerView]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "workers": workers }))
}

/// Format a routing decision as a key/value table
pub fn format_decision_table(decision: &RoutingDecision) -> String {
    let kind = match decision.route_kind {
        RouteKind::LastResort => decision.route_kind.as_str().red().to_string(),
        RouteKind::GenericFallback => decision.route_kind.as_str().yellow().to_string(),
        _ => decision.route_kind.as_str().green().to_string(),
    };

    let mut table = new_table(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("Worker"), Cell::new(&decision.selected_worker)]);
    table.add_row(vec![Cell::new("Task"), Cell::new(decision.task_class.as_str())]);
    table.add_row(vec![
        Cell::new("Confidence"),
        Cell::new(format!("{:.2}", decision.confidence)),
    ]);
    table.add_row(vec![Cell::new("Route"), Cell::new(kind)]);
    table.add_row(vec![Cell::new("Rationale"), Cell::new(&decision.rationale)]);
    table.add_row(vec![Cell::new("Request ID"), Cell::new(&decision.request_id)]);
    table.to_string()
}

/// Format a routing decision as JSON
pub fn format_decision_json(decision: &RoutingDecision) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(decision)
}

fn optional_pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

/// Format the performance summary as a per-worker table with a totals line
pub fn format_summary_table(summary: &PerformanceSummary) -> String {
    let mut table = new_table(vec![
        "Worker",
        "Requests",
        "Lifetime",
        "Avg Confidence",
        "Success",
        "Avg Latency",
        "Satisfaction",
    ]);
    for s in &summary.workers {
        let latency = if s.latency_samples > 0 {
            format!("{:.0}ms", s.running_avg_latency_ms)
        } else {
            "-".to_string()
        };
        let satisfaction = s
            .recent_satisfaction
            .mean()
            .map(|m| format!("{:.2}", m))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&s.worker_id),
            Cell::new(s.total_requests),
            Cell::new(s.lifetime_requests),
            Cell::new(format!("{:.2}", s.running_avg_confidence)),
            Cell::new(optional_pct(s.success_rate())),
            Cell::new(latency),
            Cell::new(satisfaction),
        ]);
    }

    format!(
        "{}\nLedger: {}/{} entries, {} outcomes, {} lifetime decisions",
        table, summary.ledger_entries, summary.ledger_capacity, summary.outcomes_recorded,
        summary.lifetime_decisions
    )
}

/// Format the performance summary as JSON
pub fn format_summary_json(summary: &PerformanceSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TaskClass;
    use crate::registry::WorkerKind;
    use chrono::Utc;

    fn worker_view() -> WorkerView {
        let profile = WorkerProfile::new(
            "minilm",
            WorkerKind::embedding(),
            [TaskClass::Embedding],
            0.9,
            ResourceTier::Low,
        );
        WorkerView::from(&profile)
    }

    fn decision() -> RoutingDecision {
        RoutingDecision {
            request_id: "req-1".to_string(),
            request_preview: "find documents".to_string(),
            request_prefix: "find documents".to_string(),
            selected_worker: "minilm".to_string(),
            task_class: TaskClass::Search,
            confidence: 0.95,
            rationale: "specialized worker".to_string(),
            route_kind: RouteKind::Specialized,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn workers_table_has_header_when_empty() {
        let output = format_workers_table(&[]);
        assert!(output.contains("Kind"));
    }

    #[test]
    fn workers_table_lists_worker() {
        let output = format_workers_table(&[worker_view()]);
        assert!(output.contains("minilm"));
        assert!(output.contains("embedding"));
        assert!(output.contains("0.90"));
    }

    #[test]
    fn workers_json_is_valid() {
        let output = format_workers_json(&[worker_view()]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["workers"][0]["id"], "minilm");
        assert_eq!(parsed["workers"][0]["resource_tier"], "low");
    }

    #[test]
    fn decision_table_shows_worker_and_confidence() {
        let output = format_decision_table(&decision());
        assert!(output.contains("minilm"));
        assert!(output.contains("0.95"));
        assert!(output.contains("req-1"));
    }

    #[test]
    fn empty_summary_table_has_totals_line() {
        let summary = PerformanceSummary {
            ledger_entries: 0,
            ledger_capacity: 10_000,
            lifetime_decisions: 0,
            outcomes_recorded: 0,
            workers: Vec::new(),
        };
        let output = format_summary_table(&summary);
        assert!(output.contains("Ledger: 0/10000 entries"));
    }
}
