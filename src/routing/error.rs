//! Error types for routing failures

use thiserror::Error;

/// Errors that can occur during worker selection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The candidate worker set was empty
    #[error("No workers available to route request '{request_id}'")]
    NoWorkersAvailable { request_id: String },

    /// The request id is already present in the decision ledger
    #[error("Request id '{request_id}' has already been routed")]
    DuplicateRequestId { request_id: String },

    /// The decision sink rejected the decision for another reason
    #[error("Failed to record decision for request '{request_id}': {reason}")]
    RecordingFailed { request_id: String, reason: String },
}
