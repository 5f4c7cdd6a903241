//! Scoring rule shared by routing and the read-only worker queries

use crate::registry::WorkerProfile;
use crate::routing::RoutingPolicy;
use std::cmp::Ordering;

/// Upper bound on any decision's confidence.
pub const CONFIDENCE_CAP: f64 = 0.95;

/// Bonus added to a specialized worker's score to form its confidence.
pub const CONFIDENCE_BOOST: f64 = 0.10;

/// Confidence of a generic (generative) fallback decision.
pub const GENERIC_FALLBACK_CONFIDENCE: f64 = 0.5;

/// Confidence of a last-resort decision.
pub const LAST_RESORT_CONFIDENCE: f64 = 0.3;

/// Worker score after policy adjustments, clamped to [0, 1].
pub fn effective_score(worker: &WorkerProfile, policy: &RoutingPolicy) -> f64 {
    (worker.performance_score + policy.adjustment(&worker.id)).clamp(0.0, 1.0)
}

/// Confidence for a worker picked by score: `min(0.95, score + 0.10)`.
pub fn scored_confidence(score: f64) -> f64 {
    (score + CONFIDENCE_BOOST).clamp(0.0, CONFIDENCE_CAP)
}

/// Highest effective score wins; ties go to the lexicographically lowest id.
pub fn best_worker<'a, I>(candidates: I, policy: &RoutingPolicy) -> Option<&'a WorkerProfile>
where
    I: IntoIterator<Item = &'a WorkerProfile>,
{
    candidates.into_iter().min_by(|a, b| {
        let score_a = effective_score(a, policy);
        let score_b = effective_score(b, policy);
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TaskClass;
    use crate::registry::{ResourceTier, WorkerKind};

    fn worker(id: &str, score: f64) -> WorkerProfile {
        WorkerProfile::new(
            id,
            WorkerKind::generative(),
            [TaskClass::Conversation],
            score,
            ResourceTier::Medium,
        )
    }

    #[test]
    fn scored_confidence_is_capped() {
        assert_eq!(scored_confidence(0.9), 0.95);
        assert_eq!(scored_confidence(1.0), 0.95);
        assert!((scored_confidence(0.5) - 0.6).abs() < 1e-9);
        assert!((scored_confidence(0.0) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn effective_score_applies_and_clamps_adjustments() {
        let mut policy = RoutingPolicy::default();
        policy.worker_adjustments.insert("a".to_string(), -0.3);
        policy.worker_adjustments.insert("b".to_string(), 0.5);

        assert!((effective_score(&worker("a", 0.8), &policy) - 0.5).abs() < 1e-9);
        assert_eq!(effective_score(&worker("b", 0.8), &policy), 1.0);
        assert_eq!(effective_score(&worker("c", 0.8), &policy), 0.8);
    }

    #[test]
    fn best_worker_picks_highest_score() {
        let workers = vec![worker("a", 0.5), worker("b", 0.9), worker("c", 0.7)];
        let best = best_worker(&workers, &RoutingPolicy::default()).unwrap();
        assert_eq!(best.id, "b");
    }

    #[test]
    fn best_worker_breaks_ties_by_lowest_id() {
        let workers = vec![worker("zeta", 0.8), worker("alpha", 0.8), worker("mid", 0.8)];
        let best = best_worker(&workers, &RoutingPolicy::default()).unwrap();
        assert_eq!(best.id, "alpha");
    }

    #[test]
    fn best_worker_respects_policy_adjustments() {
        let mut policy = RoutingPolicy::default();
        policy.worker_adjustments.insert("b".to_string(), -0.3);
        let workers = vec![worker("a", 0.7), worker("b", 0.9)];
        assert_eq!(best_worker(&workers, &policy).unwrap().id, "a");
    }

    #[test]
    fn best_worker_of_nothing_is_none() {
        let workers: Vec<WorkerProfile> = Vec::new();
        assert!(best_worker(&workers, &RoutingPolicy::default()).is_none());
    }
}
