//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use projections::ProjectionError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
///
/// Ingress failures follow the pub/sub sidecar contract: the sidecar only
/// reads `"status"` from a `2xx` body, so a drop is a `200` with
/// `"status": "DROP"`. Any `5xx` makes it redeliver.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The event can never be processed and must not be redelivered.
    #[error("{0}")]
    Drop(String),

    /// Projection or query failure.
    #[error(transparent)]
    Projection(ProjectionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Drop(msg) => drop_response(msg),
            ApiError::Projection(err) => projection_error_to_response(err),
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, axum::Json(body)).into_response()
}

fn drop_response(message: String) -> Response {
    tracing::warn!(error = %message, "dropping event");
    metrics::counter!("projections_events_rejected").increment(1);

    let body = serde_json::json!({ "error": message, "status": "DROP" });
    (StatusCode::OK, axum::Json(body)).into_response()
}

fn projection_error_to_response(err: ProjectionError) -> Response {
    match &err {
        ProjectionError::Domain(_) => drop_response(err.to_string()),
        ProjectionError::NotFound { .. } => error_body(StatusCode::NOT_FOUND, err.to_string()),
        ProjectionError::Store(_) | ProjectionError::RetriesExhausted { .. } => {
            tracing::error!(error = %err, "projection failed, leaving event for redelivery");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Projection(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Drop(err.to_string())
    }
}
