//! Decision ledger entries and outcome reports

use crate::routing::RoutingDecision;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome fields reported for a dispatched request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_satisfaction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_quality: Option<f64>,
}

impl OutcomeReport {
    pub fn is_empty(&self) -> bool {
        self.latency_ms.is_none()
            && self.success.is_none()
            && self.user_satisfaction.is_none()
            && self.response_quality.is_none()
    }

    /// Clamp scores to [0, 1] and drop negative or non-finite latencies.
    pub fn sanitized(&self) -> Self {
        Self {
            latency_ms: self.latency_ms.filter(|l| l.is_finite() && *l >= 0.0),
            success: self.success,
            user_satisfaction: self
                .user_satisfaction
                .filter(|v| v.is_finite())
                .map(|v| v.clamp(0.0, 1.0)),
            response_quality: self
                .response_quality
                .filter(|v| v.is_finite())
                .map(|v| v.clamp(0.0, 1.0)),
        }
    }
}

/// A recorded decision plus whatever outcome has been reported for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub decision: RoutingDecision,
    #[serde(default)]
    pub outcome: OutcomeReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    pub fn new(decision: RoutingDecision) -> Self {
        Self {
            decision,
            outcome: OutcomeReport::default(),
            outcome_at: None,
        }
    }

    /// Merge a report into the entry; fields already set are kept.
    ///
    /// Returns only the fields that were newly recorded.
    pub fn merge(&mut self, report: &OutcomeReport) -> OutcomeReport {
        let report = report.sanitized();
        let mut applied = OutcomeReport::default();

        if self.outcome.latency_ms.is_none() && report.latency_ms.is_some() {
            self.outcome.latency_ms = report.latency_ms;
            applied.latency_ms = report.latency_ms;
        }
        if self.outcome.success.is_none() && report.success.is_some() {
            self.outcome.success = report.success;
            applied.success = report.success;
        }
        if self.outcome.user_satisfaction.is_none() && report.user_satisfaction.is_some() {
            self.outcome.user_satisfaction = report.user_satisfaction;
            applied.user_satisfaction = report.user_satisfaction;
        }
        if self.outcome.response_quality.is_none() && report.response_quality.is_some() {
            self.outcome.response_quality = report.response_quality;
            applied.response_quality = report.response_quality;
        }

        if !applied.is_empty() {
            self.outcome_at = Some(Utc::now());
        }
        applied
    }
}
