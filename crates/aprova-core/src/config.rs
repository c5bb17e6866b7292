//! Configuration module
//!
//! Storage backend selection, upload policy limits and the timing of the
//! progress display, read from the environment (and `.env` when present).

use std::env;
use std::time::Duration;

use crate::constants::{
    BYTES_PER_MB, DEFAULT_BUCKET, DEFAULT_CACHE_CONTROL, DOCUMENT_MAX_SIZE_MB, ERROR_LINGER_MS,
    IMAGE_MAX_SIZE_MB, PROGRESS_CAP_PERCENT, PROGRESS_INTERVAL_MS, PROGRESS_STEP_PERCENT,
    SIGNED_URL_TTL_SECS, STORAGE_MAX_OBJECT_SIZE_MB, SUCCESS_LINGER_MS, VIDEO_MAX_SIZE_MB,
};
use crate::storage_types::StorageBackend;
use crate::validation::FileConstraints;

/// Base configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
}

/// Uploader configuration
#[derive(Clone, Debug)]
pub struct UploaderConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub upload_bucket: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, Supabase, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub storage_max_object_size_bytes: u64,
    // Upload policy
    pub image_max_size_bytes: u64,
    pub video_max_size_bytes: u64,
    pub document_max_size_bytes: u64,
    pub cache_control: String,
    // Progress display
    pub progress_step_percent: u8,
    pub progress_interval_ms: u64,
    pub progress_cap_percent: u8,
    pub success_linger_ms: u64,
    pub error_linger_ms: u64,
    pub signed_url_ttl_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploaderConfig>);

impl Config {
    fn as_uploader(&self) -> &UploaderConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_uploader().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = UploaderConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config(Box::new(config)))
    }

    /// Build from an arbitrary key lookup instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config(Box::new(UploaderConfig::from_lookup(lookup)?)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_uploader().validate()
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_uploader().storage_backend
    }

    pub fn upload_bucket(&self) -> &str {
        &self.as_uploader().upload_bucket
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_uploader().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_uploader().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_uploader().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_uploader().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_uploader().local_storage_base_url.as_deref()
    }

    pub fn storage_max_object_size_bytes(&self) -> u64 {
        self.as_uploader().storage_max_object_size_bytes
    }

    pub fn cache_control(&self) -> &str {
        &self.as_uploader().cache_control
    }

    pub fn progress_step_percent(&self) -> u8 {
        self.as_uploader().progress_step_percent
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.as_uploader().progress_interval_ms)
    }

    pub fn progress_cap_percent(&self) -> u8 {
        self.as_uploader().progress_cap_percent
    }

    pub fn success_linger(&self) -> Duration {
        Duration::from_millis(self.as_uploader().success_linger_ms)
    }

    pub fn error_linger(&self) -> Duration {
        Duration::from_millis(self.as_uploader().error_linger_ms)
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.as_uploader().signed_url_ttl_secs)
    }

    /// Per-category limits with the built-in allow-lists.
    pub fn file_constraints(&self) -> FileConstraints {
        let cfg = self.as_uploader();
        FileConstraints {
            image_max_bytes: cfg.image_max_size_bytes,
            video_max_bytes: cfg.video_max_size_bytes,
            document_max_bytes: cfg.document_max_size_bytes,
            ..FileConstraints::default()
        }
    }
}

impl UploaderConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => Some(value.parse::<StorageBackend>()?),
            None => None,
        };

        let mb = |key: &str, default: u64| -> Result<u64, anyhow::Error> {
            let megabytes = lookup(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(default);
            megabytes
                .checked_mul(BYTES_PER_MB)
                .ok_or_else(|| anyhow::anyhow!("{} is too large: {}MB", key, megabytes))
        };

        let config = UploaderConfig {
            base: BaseConfig { environment },
            storage_backend,
            upload_bucket: lookup("UPLOAD_BUCKET")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            s3_region: lookup("S3_REGION"),
            s3_endpoint: lookup("S3_ENDPOINT"),
            aws_region: lookup("AWS_REGION"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
            storage_max_object_size_bytes: mb(
                "STORAGE_MAX_OBJECT_SIZE_MB",
                STORAGE_MAX_OBJECT_SIZE_MB,
            )?,
            image_max_size_bytes: mb("IMAGE_MAX_SIZE_MB", IMAGE_MAX_SIZE_MB)?,
            video_max_size_bytes: mb("VIDEO_MAX_SIZE_MB", VIDEO_MAX_SIZE_MB)?,
            document_max_size_bytes: mb("DOCUMENT_MAX_SIZE_MB", DOCUMENT_MAX_SIZE_MB)?,
            cache_control: lookup("UPLOAD_CACHE_CONTROL")
                .unwrap_or_else(|| DEFAULT_CACHE_CONTROL.to_string()),
            progress_step_percent: lookup("UPLOAD_PROGRESS_STEP")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PROGRESS_STEP_PERCENT),
            progress_interval_ms: lookup("UPLOAD_PROGRESS_INTERVAL_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PROGRESS_INTERVAL_MS),
            progress_cap_percent: lookup("UPLOAD_PROGRESS_CAP")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PROGRESS_CAP_PERCENT),
            success_linger_ms: lookup("UPLOAD_SUCCESS_LINGER_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SUCCESS_LINGER_MS),
            error_linger_ms: lookup("UPLOAD_ERROR_LINGER_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(ERROR_LINGER_MS),
            signed_url_ttl_secs: lookup("SIGNED_URL_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SIGNED_URL_TTL_SECS),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.progress_step_percent == 0 {
            return Err(anyhow::anyhow!("UPLOAD_PROGRESS_STEP must be greater than 0"));
        }

        if self.progress_cap_percent >= 100 {
            return Err(anyhow::anyhow!(
                "UPLOAD_PROGRESS_CAP must stay below 100 until the upload settles"
            ));
        }

        if self.progress_interval_ms == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_PROGRESS_INTERVAL_MS must be greater than 0"
            ));
        }

        let largest_category = self
            .image_max_size_bytes
            .max(self.video_max_size_bytes)
            .max(self.document_max_size_bytes);
        if largest_category > self.storage_max_object_size_bytes {
            tracing::warn!(
                largest_category_bytes = largest_category,
                storage_max_bytes = self.storage_max_object_size_bytes,
                "A category limit exceeds the storage ceiling; large files will fail at upload"
            );
        }

        // Validate storage backend configuration
        let backend = self.storage_backend.unwrap_or(StorageBackend::Local);
        match backend {
            StorageBackend::S3 => {
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
