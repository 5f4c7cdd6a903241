use crate::persistence::PersistenceError;
use thiserror::Error;

/// Errors raised while recording or persisting telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Outcome reported for a request id that is not (or no longer) in the ledger
    #[error("Unknown or expired request id '{request_id}'")]
    UnknownRequest { request_id: String },

    #[error("Request id '{request_id}' is already recorded")]
    DuplicateRequest { request_id: String },

    #[error("Telemetry persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}
