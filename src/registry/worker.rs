use crate::classifier::TaskClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Worker kind tag.
///
/// Kinds are an open set agreed at configuration time: `embedding` and
/// `generative` are always understood by the router, anything else (e.g.
/// `code`, `multimodal`) is accepted if the registry allows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerKind(String);

impl WorkerKind {
    pub const EMBEDDING: &'static str = "embedding";
    pub const GENERATIVE: &'static str = "generative";

    /// Create a kind tag (normalized to trimmed lowercase).
    pub fn new(kind: impl AsRef<str>) -> Self {
        Self(kind.as_ref().trim().to_lowercase())
    }

    pub fn embedding() -> Self {
        Self(Self::EMBEDDING.to_string())
    }

    pub fn generative() -> Self {
        Self(Self::GENERATIVE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_embedding(&self) -> bool {
        self.0 == Self::EMBEDDING
    }

    pub fn is_generative(&self) -> bool {
        self.0 == Self::GENERATIVE
    }
}

impl std::fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkerKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

/// Relative resource cost of running a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceTier {
    Low,
    #[default]
    Medium,
    High,
}

/// An inference worker and its static capability facts.
///
/// Profiles are only changed through explicit administrative updates; the
/// optimizer adjusts routing policy, never these facts.
///
/// # Examples
///
/// ```
/// use switchboard::classifier::TaskClass;
/// use switchboard::registry::{ResourceTier, WorkerKind, WorkerProfile};
///
/// let worker = WorkerProfile::new(
///     "minilm",
///     WorkerKind::embedding(),
///     [TaskClass::Embedding, TaskClass::Similarity],
///     0.9,
///     ResourceTier::Low,
/// );
/// assert!(worker.supports(TaskClass::Similarity));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    /// Unique worker identifier
    pub id: String,
    /// Worker kind tag
    pub kind: WorkerKind,
    /// Task classes this worker can serve
    pub supported_tasks: BTreeSet<TaskClass>,
    /// Base performance score in [0, 1]
    pub performance_score: f64,
    /// Resource cost tier
    #[serde(default)]
    pub resource_tier: ResourceTier,
}

impl WorkerProfile {
    pub fn new(
        id: impl Into<String>,
        kind: WorkerKind,
        supported_tasks: impl IntoIterator<Item = TaskClass>,
        performance_score: f64,
        resource_tier: ResourceTier,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            supported_tasks: supported_tasks.into_iter().collect(),
            performance_score,
            resource_tier,
        }
    }

    /// Whether this worker declares support for the task class.
    pub fn supports(&self, task: TaskClass) -> bool {
        self.supported_tasks.contains(&task)
    }
}
