//! Input and settings types for the upload orchestrator.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use aprova_core::constants::{
    DEFAULT_BUCKET, DEFAULT_CACHE_CONTROL, ERROR_LINGER_MS, SIGNED_URL_TTL_SECS, SUCCESS_LINGER_MS,
};
use aprova_core::validation::content_type_for_extension;
use aprova_core::{Config, FileConstraints, FileDescriptor, UploadTask};
use aprova_storage::keys::file_extension;
use bytes::Bytes;

use crate::error::UploadError;
use crate::progress::ProgressSettings;

/// A file picked by the user, held in memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = file_extension(&name)
            .map(content_type_for_extension)
            .unwrap_or_default();

        Ok(Self::new(name, content_type, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl FileDescriptor for UploadFile {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Settings for one [`UploadService`](crate::UploadService).
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub bucket: String,
    /// Replaces the built-in allow-list when set.
    pub allowed_types: Option<Vec<String>>,
    pub constraints: FileConstraints,
    pub cache_control: String,
    pub progress: ProgressSettings,
    pub success_linger: Duration,
    pub error_linger: Duration,
    pub signed_url_ttl: Duration,
}

impl UploadSettings {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            allowed_types: None,
            constraints: FileConstraints::default(),
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
            progress: ProgressSettings::default(),
            success_linger: Duration::from_millis(SUCCESS_LINGER_MS),
            error_linger: Duration::from_millis(ERROR_LINGER_MS),
            signed_url_ttl: Duration::from_secs(SIGNED_URL_TTL_SECS),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            bucket: config.upload_bucket().to_string(),
            allowed_types: None,
            constraints: config.file_constraints(),
            cache_control: config.cache_control().to_string(),
            progress: ProgressSettings::from_config(config),
            success_linger: config.success_linger(),
            error_linger: config.error_linger(),
            signed_url_ttl: config.signed_url_ttl(),
        }
    }

    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = Some(types.into_iter().map(Into::into).collect());
        self
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET)
    }
}

/// Called with `(file_path, public_url)` after a successful upload.
pub type SuccessCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;
/// Called with the failure after any unsuccessful upload.
pub type ErrorCallback = Arc<dyn Fn(&UploadError) + Send + Sync>;
/// Called with every displayed state change of the current upload.
pub type ProgressCallback = Arc<dyn Fn(&UploadTask) + Send + Sync>;
