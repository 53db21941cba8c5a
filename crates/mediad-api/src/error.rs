//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain errors
//! (`AppError`, `StorageError`, validation lists) convert into `HttpAppError`
//! via `From` impls so they render consistently: status, JSON body with a
//! stable machine code, and a log line at the error's own level.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mediad_core::{AppError, LogLevel};
use mediad_processing::ValidationError;
use mediad_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;

/// Public error response contract: always `error` + `code`, optionally
/// `details` (non-production) and `errors` (multi-violation validation).
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from mediad-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::Internal(err.to_string()))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(app_error_from_storage(err))
    }
}

/// Map a storage failure onto the request-path taxonomy. Missing files are
/// 404; everything else is a server-side storage fault.
pub fn app_error_from_storage(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(msg) => AppError::NotFound(msg),
        StorageError::InvalidName(msg) => AppError::NotFound(msg),
        StorageError::WriteFailed(msg)
        | StorageError::ReadFailed(msg)
        | StorageError::DeleteFailed(msg)
        | StorageError::ConfigError(msg) => AppError::Storage(msg),
        StorageError::IoError(e) => AppError::Storage(format!("IO error: {}", e)),
    }
}

/// Collapse accumulated validation violations into one `AppError`.
///
/// A lone size violation keeps its own code so clients can react to it
/// without parsing the message; anything else reports `validation_failed`
/// with the full list.
pub fn app_error_from_violations(violations: Vec<ValidationError>) -> AppError {
    match violations.as_slice() {
        [ValidationError::FileTooLarge { size, max }] => AppError::FileTooLarge(format!(
            "{} bytes exceeds the maximum of {} bytes",
            size, max
        )),
        _ => AppError::Validation(violations.iter().map(|v| v.to_string()).collect()),
    }
}

fn log_error(error: &AppError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, code = code, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, code = code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, code = code, "Request failed");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let details = if is_production_env() {
            None
        } else {
            Some(app_error.to_string())
        };

        let body = Json(ErrorResponse {
            error: app_error.to_string(),
            code: app_error.error_code().to_string(),
            details,
            errors: app_error.violations().map(|v| v.to_vec()),
        });

        (status, body).into_response()
    }
}
