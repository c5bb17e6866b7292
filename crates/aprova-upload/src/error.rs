//! Upload error taxonomy.
//!
//! Every failure is caught inside the orchestrator and turned into a
//! notification, an optional callback and a `None` result. The variants keep
//! enough context to build the user-facing message.

use aprova_core::{ErrorMetadata, LogLevel, ValidationError};
use aprova_storage::StorageError;

use crate::messages;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The file broke the size or type policy; no network call was made.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The storage write failed.
    #[error("Storage upload of {file_name} failed: {source}")]
    Transport {
        file_name: String,
        file_size: u64,
        #[source]
        source: StorageError,
    },

    /// Anything else, such as a panic inside the storage backend.
    #[error("Unexpected upload failure: {0}")]
    Unknown(String),
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::Validation(_) => "VALIDATION_ERROR",
            UploadError::Transport { source, .. } => match source {
                StorageError::PayloadTooLarge { .. } => "STORAGE_LIMIT_EXCEEDED",
                StorageError::AlreadyExists(_) => "DUPLICATE_OBJECT",
                _ => "STORAGE_ERROR",
            },
            UploadError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            UploadError::Validation(_) => false,
            UploadError::Transport { source, .. } => {
                !matches!(source, StorageError::PayloadTooLarge { .. })
            }
            UploadError::Unknown(_) => false,
        }
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::Validation(e) => e.to_string(),
            UploadError::Transport {
                file_size, source, ..
            } => match source {
                StorageError::PayloadTooLarge { limit, .. } => {
                    messages::storage_ceiling_exceeded(*file_size, *limit)
                }
                StorageError::AlreadyExists(_) => messages::DUPLICATE_OBJECT.to_string(),
                _ => messages::UPLOAD_FAILED.to_string(),
            },
            UploadError::Unknown(_) => messages::UPLOAD_FAILED.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::Validation(_) => LogLevel::Debug,
            UploadError::Transport { source, .. } => match source {
                StorageError::PayloadTooLarge { .. } | StorageError::AlreadyExists(_) => {
                    LogLevel::Warn
                }
                _ => LogLevel::Error,
            },
            UploadError::Unknown(_) => LogLevel::Error,
        }
    }
}
