//! Request bodies, query parameters, and the JSON error envelope.

use crate::routing::RoutingError;
use crate::telemetry::TelemetryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// `POST /v1/route` body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteBody {
    pub text: String,
    #[serde(default)]
    pub request_id: Option<String>,
    /// Candidate worker ids; every registered worker when omitted
    #[serde(default)]
    pub workers: Option<Vec<String>>,
}

/// `?window_days=` for `GET /v1/analysis`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisQuery {
    pub window_days: Option<u32>,
}

/// `?limit=` for `GET /v1/optimizer/history`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    20
}

/// Error envelope: `{"error": {"message", "type", "code"}}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    fn new(message: impl Into<String>, r#type: &str, code: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.into(),
                r#type: r#type.to_string(),
                code: Some(code.to_string()),
            },
        }
    }

    /// 400
    pub fn bad_request(message: &str) -> Self {
        Self::new(message, "invalid_request_error", "invalid_request_error")
    }

    /// 404
    pub fn unknown_request(message: impl Into<String>) -> Self {
        Self::new(message, "invalid_request_error", "unknown_request")
    }

    /// 409
    pub fn duplicate_request_id(message: impl Into<String>) -> Self {
        Self::new(message, "invalid_request_error", "duplicate_request_id")
    }

    /// 503
    pub fn no_workers_available(message: impl Into<String>) -> Self {
        Self::new(message, "service_unavailable", "no_workers_available")
    }

    /// 500
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, "server_error", "internal_error")
    }

    fn status_code(&self) -> StatusCode {
        match self.error.code.as_deref() {
            Some("unknown_request") => StatusCode::NOT_FOUND,
            Some("duplicate_request_id") => StatusCode::CONFLICT,
            Some("no_workers_available") => StatusCode::SERVICE_UNAVAILABLE,
            Some("invalid_request_error") => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RoutingError> for ApiError {
    fn from(err: RoutingError) -> Self {
        match &err {
            RoutingError::NoWorkersAvailable { .. } => Self::no_workers_available(err.to_string()),
            RoutingError::DuplicateRequestId { .. } => Self::duplicate_request_id(err.to_string()),
            RoutingError::RecordingFailed { .. } => Self::internal(err.to_string()),
        }
    }
}

impl From<TelemetryError> for ApiError {
    fn from(err: TelemetryError) -> Self {
        match &err {
            TelemetryError::UnknownRequest { .. } => Self::unknown_request(err.to_string()),
            TelemetryError::DuplicateRequest { .. } => Self::duplicate_request_id(err.to_string()),
            TelemetryError::Persistence(_) => Self::internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_errors_map_to_status_codes() {
        let none = ApiError::from(RoutingError::NoWorkersAvailable {
            request_id: "r1".to_string(),
        });
        assert_eq!(none.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(none.error.code.as_deref(), Some("no_workers_available"));

        let dup = ApiError::from(RoutingError::DuplicateRequestId {
            request_id: "r1".to_string(),
        });
        assert_eq!(dup.into_response().status(), StatusCode::CONFLICT);

        let failed = ApiError::from(RoutingError::RecordingFailed {
            request_id: "r1".to_string(),
            reason: "disk full".to_string(),
        });
        assert_eq!(failed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failed.error.code.as_deref(), Some("internal_error"));
    }

    #[test]
    fn unknown_request_is_not_found() {
        let err = ApiError::from(TelemetryError::UnknownRequest {
            request_id: "gone".to_string(),
        });
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"]["code"], "unknown_request");
        assert!(json["error"]["message"].as_str().unwrap().contains("gone"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn route_body_defaults_optional_fields() {
        let body: RouteBody = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert!(body.request_id.is_none());
        assert!(body.workers.is_none());
    }
}
