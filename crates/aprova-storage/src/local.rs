use crate::keys::{validate_bucket, validate_key};
use crate::traits::{PutOptions, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Local filesystem storage implementation
///
/// Each bucket is a directory under `base_path`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    max_object_size: u64,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for buckets (e.g., "/var/lib/aprova/storage")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/storage")
    /// * `max_object_size` - Storage-wide ceiling in bytes
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        max_object_size: u64,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            max_object_size,
        })
    }

    /// Convert bucket and key to a filesystem path with security validation
    ///
    /// This function validates that the key doesn't contain path traversal
    /// sequences that could escape the bucket directory.
    fn key_to_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        validate_bucket(bucket)?;
        validate_key(key)?;

        let bucket_path = self.base_path.join(bucket);
        let path = bucket_path.join(key);

        if let (Ok(base_canonical), Ok(canonical)) =
            (self.base_path.canonicalize(), path.canonicalize())
        {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Generate URL for a file
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        let encoded_key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket,
            encoded_key
        )
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// Write all of `data` and flush it, removing `path` if either step fails.
///
/// `tokio::fs::File` hands writes to a background task; an error from that
/// write only surfaces on the next operation, so the flush is what reports a
/// short write.
async fn write_or_discard<W>(writer: &mut W, data: &[u8], path: &Path) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let result = async {
        writer.write_all(data).await?;
        writer.flush().await
    }
    .await;
    if result.is_err() {
        discard_partial(path).await;
    }
    result
}

/// Remove what a failed write left behind so the key stays free.
async fn discard_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            error = %e,
            path = %path.display(),
            "Failed to remove partial upload"
        ),
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> StorageResult<()> {
        let size = data.len() as u64;
        if size > self.max_object_size {
            tracing::warn!(
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                limit_bytes = self.max_object_size,
                "Local storage upload rejected by object ceiling"
            );
            return Err(StorageError::PayloadTooLarge {
                size,
                limit: self.max_object_size,
            });
        }

        let path = self.key_to_path(bucket, key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut open = fs::OpenOptions::new();
        open.write(true);
        if options.upsert {
            open.create(true).truncate(true);
        } else {
            open.create_new(true);
        }

        let mut file = open.open(&path).await.map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => StorageError::AlreadyExists(key.to_string()),
            _ => StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                path.display(),
                e
            )),
        })?;

        let written = match write_or_discard(&mut file, &data, &path).await {
            Ok(()) => match file.sync_all().await {
                Ok(()) => Ok(()),
                Err(e) => {
                    discard_partial(&path).await;
                    Err(e)
                }
            },
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            tracing::error!(
                error = %e,
                path = %path.display(),
                bucket = %bucket,
                key = %key,
                "Local storage write failed"
            );
            return Err(StorageError::UploadFailed(format!(
                "Failed to write file {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            content_type = %options.content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(bucket, key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(data)
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(bucket, key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(bucket, key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let path = self.key_to_path(bucket, key)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let expires_at = chrono::Utc::now().timestamp() + expires_in.as_secs() as i64;
        Ok(format!(
            "{}?expires={}",
            self.generate_url(bucket, key),
            expires_at
        ))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::tempdir;

    /// Accepts writes into memory like a buffered file and fails on flush,
    /// the way a background write hitting a file size limit does.
    struct FailingFlush {
        accepted: usize,
    }

    impl AsyncWrite for FailingFlush {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.accepted += buf.len();
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "File too large")))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    const LIMIT: u64 = 1024;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:3000/storage".to_string(), LIMIT)
            .await
            .unwrap()
    }

    fn opts() -> PutOptions {
        PutOptions::create_only("text/plain", "3600")
    }

    #[tokio::test]
    async fn test_local_storage_upload_download() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let data = Bytes::from_static(b"test data");

        storage
            .upload("creatives", "campaign/test.txt", data.clone(), &opts())
            .await
            .unwrap();

        let downloaded = storage.download("creatives", "campaign/test.txt").await.unwrap();
        assert_eq!(data.to_vec(), downloaded);
        assert!(dir.path().join("creatives/campaign/test.txt").exists());
    }

    #[tokio::test]
    async fn test_create_only_refuses_existing_key() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("creatives", "a.txt", Bytes::from_static(b"first"), &opts())
            .await
            .unwrap();

        let result = storage
            .upload("creatives", "a.txt", Bytes::from_static(b"second"), &opts())
            .await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(ref k)) if k == "a.txt"));

        // Original content untouched
        let data = storage.download("creatives", "a.txt").await.unwrap();
        assert_eq!(data, b"first");
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let upsert = PutOptions {
            upsert: true,
            ..opts()
        };

        storage
            .upload("creatives", "a.txt", Bytes::from_static(b"first version"), &upsert)
            .await
            .unwrap();
        storage
            .upload("creatives", "a.txt", Bytes::from_static(b"second"), &upsert)
            .await
            .unwrap();

        let data = storage.download("creatives", "a.txt").await.unwrap();
        assert_eq!(data, b"second");
    }

    #[tokio::test]
    async fn test_object_ceiling() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let at_limit = Bytes::from(vec![0u8; LIMIT as usize]);
        assert!(storage
            .upload("creatives", "ok.bin", at_limit, &opts())
            .await
            .is_ok());

        let over = Bytes::from(vec![0u8; LIMIT as usize + 1]);
        let result = storage.upload("creatives", "big.bin", over, &opts()).await;
        assert!(matches!(
            result,
            Err(StorageError::PayloadTooLarge { size, limit }) if size == LIMIT + 1 && limit == LIMIT
        ));
        assert!(!storage.exists("creatives", "big.bin").await.unwrap());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.download("creatives", "../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("creatives", "../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("creatives", "/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("../outside", "file.txt").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.delete("creatives", "nonexistent/file.txt").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_local_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("creatives", "gone.txt", Bytes::from_static(b"x"), &opts())
            .await
            .unwrap();
        assert!(storage.exists("creatives", "gone.txt").await.unwrap());

        storage.delete("creatives", "gone.txt").await.unwrap();
        assert!(!storage.exists("creatives", "gone.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_signed_url() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("creatives", "job 1/arte.png", Bytes::from_static(b"png"), &opts())
            .await
            .unwrap();

        let url = storage
            .create_signed_url("creatives", "job 1/arte.png", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:3000/storage/creatives/job%201/arte.png?expires="));

        let missing = storage
            .create_signed_url("creatives", "missing.png", Duration::from_secs(60))
            .await;
        assert!(matches!(missing, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_short_write_is_reported_and_discarded() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let path = storage.key_to_path("creatives", "c/1-abcdef.png").unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        // What a background write managed to put on disk before failing.
        std::fs::write(&path, vec![0u8; 64 * 1024]).unwrap();

        let mut writer = FailingFlush { accepted: 0 };
        let result = write_or_discard(&mut writer, &[0u8; 256 * 1024], &path).await;

        assert_eq!(writer.accepted, 256 * 1024);
        assert_eq!(result.unwrap_err().to_string(), "File too large");
        assert!(!storage.exists("creatives", "c/1-abcdef.png").await.unwrap());
        let signed = storage
            .create_signed_url("creatives", "c/1-abcdef.png", Duration::from_secs(60))
            .await;
        assert!(matches!(signed, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_successful_write_is_flushed_to_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut file = fs::File::create(&path).await.unwrap();

        write_or_discard(&mut file, b"payload", &path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_discard_of_missing_file_is_silent() {
        let dir = tempdir().unwrap();
        discard_partial(&dir.path().join("never-written.bin")).await;
    }
}
