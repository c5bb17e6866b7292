//! Aprova Core Library
//!
//! This crate provides the domain models, error metadata, configuration and file
//! validation shared by the storage backends, the upload orchestrator and the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorMetadata, LogLevel};
pub use models::{MediaCategory, UploadStatus, UploadTask, UploadedFile};
pub use storage_types::StorageBackend;
pub use validation::{
    check_file, validate_file, FileConstraints, FileDescriptor, FileMeta, ValidationError,
    ValidationResult,
};
