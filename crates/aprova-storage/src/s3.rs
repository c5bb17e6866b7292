use crate::keys::{validate_bucket, validate_key};
use crate::traits::{PutOptions, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutMode, PutOptions as ObjectPutOptions,
    PutPayload, Result as ObjectResult,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// S3 storage implementation
///
/// One object_store client is built per bucket on first use and reused.
pub struct S3Storage {
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    max_object_size: u64,
    stores: RwLock<HashMap<String, AmazonS3>>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `max_object_size` - Storage-wide ceiling in bytes, enforced before the request
    pub fn new(region: String, endpoint_url: Option<String>, max_object_size: u64) -> Self {
        S3Storage {
            region,
            endpoint_url,
            max_object_size,
            stores: RwLock::new(HashMap::new()),
        }
    }

    async fn store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        validate_bucket(bucket)?;

        if let Some(store) = self.stores.read().await.get(bucket) {
            return Ok(store.clone());
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        self.stores
            .write()
            .await
            .insert(bucket.to_string(), store.clone());

        Ok(store)
    }

    fn attributes(options: &PutOptions) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, options.content_type.clone().into());
        let cache_control = if options.cache_control.chars().all(|c| c.is_ascii_digit()) {
            format!("max-age={}", options.cache_control)
        } else {
            options.cache_control.clone()
        };
        attributes.insert(Attribute::CacheControl, cache_control.into());
        attributes
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> StorageResult<()> {
        validate_key(key)?;
        let size = data.len() as u64;
        if size > self.max_object_size {
            tracing::warn!(
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                limit_bytes = self.max_object_size,
                "S3 upload rejected by object ceiling"
            );
            return Err(StorageError::PayloadTooLarge {
                size,
                limit: self.max_object_size,
            });
        }

        let store = self.store(bucket).await?;
        let location = Path::from(key.to_string());
        let put_options = ObjectPutOptions {
            mode: if options.upsert {
                PutMode::Overwrite
            } else {
                PutMode::Create
            },
            attributes: Self::attributes(options),
            ..Default::default()
        };

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store
            .put_opts(&location, PutPayload::from(data), put_options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            match e {
                ObjectStoreError::AlreadyExists { .. } | ObjectStoreError::Precondition { .. } => {
                    StorageError::AlreadyExists(key.to_string())
                }
                other => StorageError::UploadFailed(other.to_string()),
            }
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(key)?;
        let store = self.store(bucket).await?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes.to_vec())
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let store = self.store(bucket).await?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let store = self.store(bucket).await?;
        let location = Path::from(key.to_string());
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(key)?;
        let store = self.store(bucket).await?;
        let location = Path::from(key.to_string());
        let url_result: ObjectResult<_> = store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ceiling_enforced_before_any_request() {
        let storage = S3Storage::new(
            "us-east-1".to_string(),
            Some("http://localhost:9".to_string()),
            8,
        );
        let result = storage
            .upload(
                "creatives",
                "big.bin",
                Bytes::from_static(b"123456789"),
                &PutOptions::create_only("application/octet-stream", "3600"),
            )
            .await;
        assert!(matches!(
            result,
            Err(StorageError::PayloadTooLarge { size: 9, limit: 8 })
        ));
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let storage = S3Storage::new("us-east-1".to_string(), None, 1024);
        let result = storage.exists("creatives", "../secret").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_numeric_cache_control_becomes_max_age() {
        let attributes = S3Storage::attributes(&PutOptions::create_only("image/png", "3600"));
        let cache = attributes.get(&Attribute::CacheControl).unwrap();
        assert_eq!(*cache, object_store::AttributeValue::from("max-age=3600"));
    }
}
