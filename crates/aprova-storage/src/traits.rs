//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    /// The key is taken and the caller asked not to overwrite it.
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    /// The payload is above the storage-wide object ceiling.
    #[error("The object exceeded the maximum allowed size ({size} bytes, limit {limit} bytes)")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Options for a single object write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: String,
    /// Cache directive in seconds, e.g. "3600".
    pub cache_control: String,
    /// Overwrite an existing object. When false the write fails with
    /// [`StorageError::AlreadyExists`].
    pub upsert: bool,
}

impl PutOptions {
    /// Create-only write with the given content type and cache directive.
    pub fn create_only(content_type: impl Into<String>, cache_control: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            cache_control: cache_control.into(),
            upsert: false,
        }
    }
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// Objects are addressed by `(bucket, key)`; see the crate root for the key format.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `bucket/key`.
    ///
    /// Backends must report [`StorageError::AlreadyExists`] when
    /// `options.upsert` is false and the key is taken, and
    /// [`StorageError::PayloadTooLarge`] when the payload is above their
    /// object ceiling.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> StorageResult<()>;

    /// Download an object
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool>;

    /// Generate a short-lived URL for viewing an object.
    ///
    /// Uploaded files have no permanent public URL; viewers ask for one of
    /// these at display time.
    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
