//! Error types module
//!
//! All request-path errors are unified under the `AppError` enum, which
//! self-describes its HTTP status, machine-readable code, and log level.
//! The api crate wraps it for response rendering.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like oversized requests
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed multipart body: {0}")]
    MultipartInvalid(String),

    #[error("No file provided")]
    NoFileProvided,

    #[error("Unexpected field: {0}")]
    UnexpectedField(String),

    #[error("Too many files: {0}")]
    TooManyFiles(String),

    #[error("File too large: {0}")]
    FileTooLarge(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code to return for this error.
    ///
    /// Validation and parse failures are 400 across the board, including
    /// oversized files (the upload contract reports them as a validation
    /// outcome, not a transport-level 413).
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_)
            | AppError::MultipartInvalid(_)
            | AppError::NoFileProvided
            | AppError::UnexpectedField(_)
            | AppError::TooManyFiles(_)
            | AppError::FileTooLarge(_)
            | AppError::Validation(_) => 400,
            AppError::Unauthorized(_) => 401,
            AppError::Forbidden(_) => 403,
            AppError::NotFound(_) => 404,
            AppError::Storage(_) | AppError::Processing(_) | AppError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::MultipartInvalid(_) => "multipart_invalid",
            AppError::NoFileProvided => "no_file_provided",
            AppError::UnexpectedField(_) => "unexpected_field",
            AppError::TooManyFiles(_) => "too_many_files",
            AppError::FileTooLarge(_) => "file_too_large",
            AppError::Validation(_) => "validation_failed",
            AppError::NotFound(_) => "not_found",
            AppError::Storage(_) => "storage_error",
            AppError::Processing(_) => "processing_error",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Log level for this error.
    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_)
            | AppError::MultipartInvalid(_)
            | AppError::NoFileProvided
            | AppError::UnexpectedField(_)
            | AppError::Validation(_)
            | AppError::NotFound(_) => LogLevel::Debug,
            AppError::TooManyFiles(_)
            | AppError::FileTooLarge(_)
            | AppError::Unauthorized(_)
            | AppError::Forbidden(_)
            | AppError::Processing(_) => LogLevel::Warn,
            AppError::Storage(_) | AppError::Internal(_) => LogLevel::Error,
        }
    }

    /// Individual violation messages for list-shaped validation failures.
    pub fn violations(&self) -> Option<&[String]> {
        match self {
            AppError::Validation(errors) if errors.len() > 1 => Some(errors),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NoFileProvided.http_status_code(), 400);
        assert_eq!(AppError::FileTooLarge("60 MiB".into()).http_status_code(), 400);
        assert_eq!(AppError::NotFound("x".into()).http_status_code(), 404);
        assert_eq!(AppError::Storage("disk".into()).http_status_code(), 500);
        assert_eq!(AppError::Unauthorized("no principal".into()).http_status_code(), 401);
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(AppError::FileTooLarge("x".into()).error_code(), "file_too_large");
        assert_eq!(AppError::TooManyFiles("x".into()).error_code(), "too_many_files");
        assert_eq!(AppError::NoFileProvided.error_code(), "no_file_provided");
        assert_eq!(
            AppError::Validation(vec!["a".into()]).error_code(),
            "validation_failed"
        );
    }

    #[test]
    fn test_violations_only_for_multiple() {
        let single = AppError::Validation(vec!["file too large".into()]);
        assert!(single.violations().is_none());

        let multiple = AppError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(multiple.violations().unwrap().len(), 2);
    }
}
