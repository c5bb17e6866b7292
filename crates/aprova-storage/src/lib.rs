//! Aprova Storage Library
//!
//! This crate provides the object storage abstraction used by the upload
//! orchestrator, with implementations for the local filesystem and S3.
//!
//! # Storage key format
//!
//! Objects live in a caller-chosen bucket. Keys are generated per upload as
//! `{prefix}/{timestamp_ms}-{token}.{ext}` (prefix optional) and are never
//! overwritten: uploads pass `upsert = false` and backends must refuse an
//! existing key. Keys must not contain `..` or a leading `/`. Key generation
//! is centralized in the `keys` module so all callers stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use aprova_core::StorageBackend;
pub use factory::create_storage;
pub use keys::generate_upload_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{PutOptions, Storage, StorageError, StorageResult};
