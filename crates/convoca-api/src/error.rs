//! Convoca — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use convoca_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Ledger connection or migration error.
    #[error("ledger error: {0}")]
    Ledger(#[from] sqlx::Error),

    /// Ledger migration error.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Document-store connection error.
    #[error("document store error: {0}")]
    DocumentStore(#[from] mongodb::error::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// For lifecycle violations, the transitions allowed from the current
    /// state, to aid client retry logic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_transitions: Option<Vec<String>>,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            DomainError::NotRegistered(_) => (StatusCode::NOT_FOUND, "not_registered"),
            DomainError::Unauthorized(_) => (StatusCode::FORBIDDEN, "unauthorized"),
            DomainError::InvalidTransition { .. } => (StatusCode::BAD_REQUEST, "invalid_transition"),
            DomainError::PreconditionFailed(_) => (StatusCode::BAD_REQUEST, "precondition_failed"),
            DomainError::AlreadyRegistered(_) => (StatusCode::BAD_REQUEST, "already_registered"),
            DomainError::CapacityExceeded(_) => (StatusCode::BAD_REQUEST, "capacity_exceeded"),
            DomainError::EnrollmentClosed => (StatusCode::BAD_REQUEST, "enrollment_closed"),
            DomainError::EnrollmentDeadlinePassed => {
                (StatusCode::BAD_REQUEST, "enrollment_deadline_passed")
            }
            DomainError::AlreadyOrganizer(_) => (StatusCode::BAD_REQUEST, "already_organizer"),
            DomainError::NotAnNgo(_) => (StatusCode::BAD_REQUEST, "not_an_ngo"),
            DomainError::AlreadySponsor(_) => (StatusCode::BAD_REQUEST, "already_sponsor"),
            DomainError::HasDependents => (StatusCode::BAD_REQUEST, "has_dependents"),
            DomainError::TooManyImages(_) => (StatusCode::BAD_REQUEST, "too_many_images"),
            DomainError::DualWriteFailure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "dual_write_failure")
            }
            DomainError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
        };

        let allowed_transitions = match &self.0 {
            DomainError::InvalidTransition { allowed, .. } => Some(allowed.clone()),
            _ => None,
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
            allowed_transitions,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: DomainError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::NotFound("event".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_unauthorized_maps_to_403() {
        assert_eq!(
            status_of(DomainError::Unauthorized("not an organizer".into())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_invariant_violations_map_to_400() {
        for err in [
            DomainError::AlreadyRegistered(1),
            DomainError::CapacityExceeded(10),
            DomainError::EnrollmentClosed,
            DomainError::EnrollmentDeadlinePassed,
            DomainError::HasDependents,
            DomainError::TooManyImages(10),
            DomainError::AlreadySponsor(1),
            DomainError::AlreadyOrganizer(1),
            DomainError::NotAnNgo(1),
        ] {
            assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_dual_write_failure_maps_to_500() {
        assert_eq!(
            status_of(DomainError::DualWriteFailure("commit failed".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_transition_body_carries_allowed_targets() {
        let response = ApiError(DomainError::InvalidTransition {
            from: "draft".into(),
            to: "finished".into(),
            allowed: vec!["published".into(), "cancelled".into()],
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
