//! HTTP Error Types
//!
//! Maps application errors to HTTP status codes and the fixed JSON
//! error body clients key on.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use stemflow_core::domain::DomainError;
use stemflow_core::error::AppError;

/// Client-facing message for any failure inside the processing
/// pipeline. Details stay in the logs.
pub const PROCESSING_ERROR_MESSAGE: &str = "Error processing audio file.";

/// Client-facing message for a multipart request without a file part.
pub const NO_FILE_MESSAGE: &str = "No file uploaded.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn no_file() -> Self {
        Self::BadRequest(NO_FILE_MESSAGE.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => Self::BadRequest(msg),
            AppError::Domain(DomainError::JobNotFound(msg)) => Self::NotFound(msg),
            // The pipeline failed somewhere; the client gets the fixed
            // message, the logs already carry the stage and cause
            _ => Self::Internal(PROCESSING_ERROR_MESSAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let api: ApiError = AppError::Validation("empty file".to_string()).into();
        assert!(matches!(api, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_pipeline_failures_map_to_fixed_internal_message() {
        let api: ApiError = AppError::ProcessFailure { exit_code: 1 }.into();
        match api {
            ApiError::Internal(msg) => assert_eq!(msg, PROCESSING_ERROR_MESSAGE),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
