//! Error metadata shared by the upload error types.
//!
//! Concrete error enums live next to the code that raises them
//! (`ValidationError` here, `StorageError` in the storage crate, `UploadError`
//! in the orchestrator). This module defines how an error describes itself to
//! the notification channel and to the logs.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a duplicate key
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for surfacing an error to a user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether picking another file or retrying by hand can succeed.
    /// Nothing in the pipeline retries automatically.
    fn is_recoverable(&self) -> bool;

    /// User-facing message, already localized.
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Emit a tracing event at the level the error asks for.
pub fn log_error<E>(err: &E, context: &str)
where
    E: ErrorMetadata + std::fmt::Display,
{
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(
            error = %err,
            error_code = err.error_code(),
            "{}",
            context
        ),
        LogLevel::Warn => tracing::warn!(
            error = %err,
            error_code = err.error_code(),
            "{}",
            context
        ),
        LogLevel::Error => tracing::error!(
            error = %err,
            error_code = err.error_code(),
            "{}",
            context
        ),
    }
}
