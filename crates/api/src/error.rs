//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{ErrorCategory, WorkflowError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No usable caller identity on the request.
    Unauthorized(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Workflow or query error.
    Workflow(WorkflowError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Workflow(err) => workflow_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn workflow_error_to_response(err: WorkflowError) -> (StatusCode, String) {
    let category = err.category();
    metrics::counter!("api_workflow_errors_total", "category" => category_label(category))
        .increment(1);

    let status = match category {
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Conflict => StatusCode::CONFLICT,
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::Forbidden => StatusCode::FORBIDDEN,
        ErrorCategory::Integrity => {
            tracing::error!(error = %err, "request failed on inconsistent or unreadable data");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ErrorCategory::Transient => {
            tracing::warn!(error = %err, "request failed on a transient storage error");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, err.to_string())
}

fn category_label(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::NotFound => "not_found",
        ErrorCategory::Conflict => "conflict",
        ErrorCategory::Validation => "validation",
        ErrorCategory::Forbidden => "forbidden",
        ErrorCategory::Integrity => "integrity",
        ErrorCategory::Transient => "transient",
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError::Workflow(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "rejected request body");
        ApiError::BadRequest(rejection.body_text())
    }
}
