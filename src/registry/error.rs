/// Errors that can occur during registry operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("worker already exists: {0}")]
    DuplicateWorker(String),

    #[error("worker not found: {0}")]
    WorkerNotFound(String),

    #[error("worker '{id}' uses undeclared kind '{kind}' (allowed: {allowed:?})")]
    UnknownKind {
        id: String,
        kind: String,
        allowed: Vec<String>,
    },

    #[error("worker '{id}' has performance score {score} outside [0, 1]")]
    InvalidScore { id: String, score: f64 },
}
