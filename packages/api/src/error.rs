// ABOUTME: API error type and its HTTP response mapping
// ABOUTME: Keeps not-found, conflicts, denials and faults distinct as status codes with a JSON body

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use cloudtrain_security::{PermissionError, TokenError};
use cloudtrain_storage::StorageError;
use cloudtrain_tasks::TaskError;

/// Main application error type that all handlers should return
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] TokenError),

    #[error(transparent)]
    Task(#[from] TaskError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Structured error response format for API consistency
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorDetail,
    request_id: String,
}

/// Error detail structure with machine-readable codes
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

fn storage_status_and_code(err: &StorageError) -> (StatusCode, &'static str) {
    match err {
        StorageError::NotFound { .. } | StorageError::NoResult { .. } => {
            (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND")
        }
        StorageError::OptimisticLock { .. } => (StatusCode::CONFLICT, "CONCURRENT_MODIFICATION"),
        StorageError::DuplicateKey { .. } => (StatusCode::CONFLICT, "DUPLICATE_KEY"),
        StorageError::InvalidInput(_) | StorageError::MissingKey(_) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
    }
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Convert AppError to appropriate HTTP status code and error code
    fn to_status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Task(task_error) => match task_error {
                TaskError::Validation(_) | TaskError::IdAlreadySet(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
                }
                TaskError::IdMismatch { .. } => (StatusCode::BAD_REQUEST, "ID_MISMATCH"),
                TaskError::IllegalTransition { .. } => {
                    (StatusCode::BAD_REQUEST, "ILLEGAL_LIFECYCLE_TRANSITION")
                }
                TaskError::Permission(PermissionError::Denied { .. }) => {
                    (StatusCode::FORBIDDEN, "FORBIDDEN")
                }
                TaskError::Permission(PermissionError::Service(_)) => {
                    (StatusCode::BAD_GATEWAY, "PERMISSION_SERVICE_ERROR")
                }
                TaskError::Permission(PermissionError::Configuration(_)) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
                }
                TaskError::Storage(storage_error) => storage_status_and_code(storage_error),
            },
        }
    }

    /// Get user-friendly error message (sanitized for external consumption)
    fn to_user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => format!("Validation failed: {}", msg),
            AppError::NotFound => "The requested resource was not found".to_string(),
            AppError::Unauthorized(_) => "Authentication required".to_string(),
            AppError::Task(task_error) => match task_error {
                TaskError::Validation(e) => format!("Validation failed: {}", e),
                TaskError::IdAlreadySet(_)
                | TaskError::IdMismatch { .. }
                | TaskError::IllegalTransition { .. } => task_error.to_string(),
                TaskError::Permission(PermissionError::Denied { .. }) => task_error.to_string(),
                TaskError::Permission(_) => "Permission check is currently unavailable".to_string(),
                TaskError::Storage(storage_error) => match storage_error {
                    StorageError::NotFound { .. } | StorageError::NoResult { .. } => {
                        "The requested resource was not found".to_string()
                    }
                    StorageError::OptimisticLock { .. } => {
                        "The resource has been modified concurrently; reload and retry".to_string()
                    }
                    StorageError::DuplicateKey { .. } => "The resource already exists".to_string(),
                    StorageError::InvalidInput(msg) => format!("Validation failed: {}", msg),
                    _ => "Data storage error".to_string(),
                },
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status_code, error_code) = self.to_status_and_code();
        let user_message = self.to_user_message();

        // Log internal errors with full context but don't expose details
        if status_code.is_server_error() {
            error!(
                request_id = %request_id,
                error_code = %error_code,
                error = %self,
                "Internal server error occurred"
            );
        } else if status_code == StatusCode::FORBIDDEN {
            warn!(
                request_id = %request_id,
                error = %self,
                audit = true,
                "Permission denied"
            );
        } else {
            info!(
                request_id = %request_id,
                error_code = %error_code,
                error = %self,
                "API error response"
            );
        }

        let error_response = ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: error_code.to_string(),
                message: user_message,
            },
            request_id,
        };

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;
