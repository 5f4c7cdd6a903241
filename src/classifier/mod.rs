//! Request classification
//!
//! Maps free-form request text to a [`TaskClass`]. The default implementation
//! is a weighted pattern table ([`PatternClassifier`]); the [`TaskClassifier`]
//! trait lets the router accept any other scorer without changing its contract.

mod patterns;

pub use patterns::{PatternClassifier, PatternRule};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The system's label for an incoming request's intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskClass {
    Embedding,
    Similarity,
    Clustering,
    DocumentAnalysis,
    Search,
    Conversation,
    Reasoning,
    CodeGeneration,
    TextGeneration,
    QuestionAnswering,
}

impl TaskClass {
    /// Every task class in declaration order.
    pub const ALL: [TaskClass; 10] = [
        TaskClass::Embedding,
        TaskClass::Similarity,
        TaskClass::Clustering,
        TaskClass::DocumentAnalysis,
        TaskClass::Search,
        TaskClass::Conversation,
        TaskClass::Reasoning,
        TaskClass::CodeGeneration,
        TaskClass::TextGeneration,
        TaskClass::QuestionAnswering,
    ];

    /// Tie-break order used when two classes score equally.
    ///
    /// Specific intents come before generic ones; `Conversation` is last
    /// because it is also the default for unmatched input.
    pub const TIE_BREAK_ORDER: [TaskClass; 10] = [
        TaskClass::CodeGeneration,
        TaskClass::Similarity,
        TaskClass::Clustering,
        TaskClass::Embedding,
        TaskClass::DocumentAnalysis,
        TaskClass::Search,
        TaskClass::Reasoning,
        TaskClass::QuestionAnswering,
        TaskClass::TextGeneration,
        TaskClass::Conversation,
    ];

    /// Class returned when nothing matches.
    pub const DEFAULT: TaskClass = TaskClass::Conversation;

    /// Whether this class is naturally served by an embedding-style worker.
    pub fn is_embedding_task(self) -> bool {
        matches!(
            self,
            TaskClass::Embedding
                | TaskClass::Similarity
                | TaskClass::Clustering
                | TaskClass::DocumentAnalysis
                | TaskClass::Search
        )
    }

    /// Canonical snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskClass::Embedding => "embedding",
            TaskClass::Similarity => "similarity",
            TaskClass::Clustering => "clustering",
            TaskClass::DocumentAnalysis => "document_analysis",
            TaskClass::Search => "search",
            TaskClass::Conversation => "conversation",
            TaskClass::Reasoning => "reasoning",
            TaskClass::CodeGeneration => "code_generation",
            TaskClass::TextGeneration => "text_generation",
            TaskClass::QuestionAnswering => "question_answering",
        }
    }

    fn tie_break_rank(self) -> usize {
        Self::TIE_BREAK_ORDER
            .iter()
            .position(|c| *c == self)
            .unwrap_or(Self::TIE_BREAK_ORDER.len())
    }
}

impl std::fmt::Display for TaskClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        TaskClass::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Unknown task class: {}", s))
    }
}

/// Pluggable request scorer.
///
/// Implementations must be pure: the same text always yields the same class.
pub trait TaskClassifier: Send + Sync {
    /// Classify request text.
    fn classify(&self, text: &str) -> TaskClass;
}

/// Pick the winning class from per-class scores.
///
/// Highest score wins; ties go to [`TaskClass::TIE_BREAK_ORDER`]; all-zero
/// scores yield [`TaskClass::DEFAULT`].
pub fn select_class(scores: &[(TaskClass, usize)]) -> TaskClass {
    scores
        .iter()
        .filter(|(_, score)| *score > 0)
        .min_by(|(a_class, a_score), (b_class, b_score)| {
            b_score
                .cmp(a_score)
                .then_with(|| a_class.tie_break_rank().cmp(&b_class.tie_break_rank()))
        })
        .map(|(class, _)| *class)
        .unwrap_or(TaskClass::DEFAULT)
}
