//! Maps every collaborator's error type onto the §7 taxonomy and a
//! stable HTTP status, keeping diagnostic detail out of the response
//! body (that detail goes to `tracing::error!` with the correlation id
//! instead).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::users::UserStoreError;
use crate::workflow::{WorkflowError, WorkflowStoreError};

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    correlation_id: String,
}

pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    correlation_id: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        let message = message.into();
        tracing::error!(correlation_id, kind, %message, "request failed");
        Self { status, kind, message, correlation_id }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "AuthError", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "AuthError", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "ValidationFailed", message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, "ValidationFailed", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NotFound", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "RateLimited", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.kind, message: self.message, correlation_id: self.correlation_id };
        (self.status, Json(body)).into_response()
    }
}

impl From<ingestion::IngestError> for ApiError {
    fn from(err: ingestion::IngestError) -> Self {
        let kind = err.kind();
        let status = match kind {
            "ValidationFailed" => StatusCode::BAD_REQUEST,
            "NotFound" => StatusCode::NOT_FOUND,
            "Conflict" => StatusCode::CONFLICT,
            "XmlSecurityError" | "PathTraversalError" => StatusCode::BAD_REQUEST,
            "DependencyError" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, kind, err.to_string())
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        let (status, kind) = match &err {
            WorkflowError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            WorkflowError::NotWaitingForInput(..) | WorkflowError::UnknownQuestionId(_) => {
                (StatusCode::CONFLICT, "Conflict")
            }
            WorkflowError::ConcurrencyCapReached => (StatusCode::SERVICE_UNAVAILABLE, "DependencyError"),
            WorkflowError::StageTimeout { .. } | WorkflowError::WorkflowTimeout => {
                (StatusCode::SERVICE_UNAVAILABLE, "DependencyError")
            }
            WorkflowError::Stage(e) if e.is_transient() => (StatusCode::SERVICE_UNAVAILABLE, "DependencyError"),
            WorkflowError::Stage(_) | WorkflowError::Runner(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError")
            }
        };
        Self::new(status, kind, err.to_string())
    }
}

impl From<WorkflowStoreError> for ApiError {
    fn from(err: WorkflowStoreError) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NotFound", err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "AuthError", err.to_string())
    }
}

impl From<UserStoreError> for ApiError {
    fn from(err: UserStoreError) -> Self {
        let status = match err {
            UserStoreError::NotFound(_) => StatusCode::NOT_FOUND,
            UserStoreError::DuplicateUsername(_) => StatusCode::CONFLICT,
            UserStoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, "PersistentInternalError", err.to_string())
    }
}
