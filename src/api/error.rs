//! JSON error responses.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::assignments::{AssignmentError, ValidationErrors};

/// Error body returned by every API route.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    /// Field → message, only for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                code,
                fields: None,
            },
        }
    }
}

impl From<AssignmentError> for ApiError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::Validation(fields) => Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody {
                    error: "Validation failed".to_string(),
                    code: "VALIDATION_ERROR",
                    fields: Some(fields),
                },
            },
            err @ AssignmentError::Io { .. } => {
                tracing::error!(error = %err, "Failed to store uploaded file");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR", err.to_string())
            }
            AssignmentError::Store(err) => {
                tracing::error!(error = %err, "Session store failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", err.to_string())
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(
            err.status(),
            "MULTIPART_ERROR",
            format!("Failed to read multipart field: {}", err.body_text()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
