//! Upload orchestration.
//!
//! One call moves through validating, then either rejected or uploading,
//! then completed or error, and back to idle after a short linger. The
//! displayed state lives in a `watch` channel so a UI can render it without
//! polling.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use aprova_core::error::log_error;
use aprova_core::{ErrorMetadata, UploadTask, UploadedFile};
use aprova_storage::{generate_upload_key, PutOptions, Storage, StorageError, StorageResult};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::{self, Instant};
use uuid::Uuid;

use crate::error::UploadError;
use crate::messages;
use crate::notifier::Notifier;
use crate::progress::ProgressTicker;
use crate::types::{ErrorCallback, ProgressCallback, SuccessCallback, UploadFile, UploadSettings};

pub struct UploadService {
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    settings: UploadSettings,
    state: Arc<watch::Sender<Option<UploadTask>>>,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
    on_progress: Option<ProgressCallback>,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        settings: UploadSettings,
    ) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            storage,
            notifier,
            settings,
            state: Arc::new(state),
            on_success: None,
            on_error: None,
            on_progress: None,
        }
    }

    /// Called with `(file_path, public_url)` after each successful upload.
    /// `public_url` is always empty.
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&UploadError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Called on every published task state. Not called when the state is
    /// cleared after the linger.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&UploadTask) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// Watch the displayed upload. `None` means idle.
    pub fn subscribe(&self) -> watch::Receiver<Option<UploadTask>> {
        self.state.subscribe()
    }

    pub fn current_task(&self) -> Option<UploadTask> {
        self.state.borrow().clone()
    }

    /// Upload one file. Every failure is reported through the notifier and
    /// the error callback; `None` is the only signal returned to the caller.
    pub async fn upload_file(
        &self,
        file: &UploadFile,
        path_prefix: Option<&str>,
    ) -> Option<UploadedFile> {
        self.try_upload(file, path_prefix).await.ok()
    }

    /// Same as [`UploadService::upload_file`], keeping the error.
    pub async fn try_upload(
        &self,
        file: &UploadFile,
        path_prefix: Option<&str>,
    ) -> Result<UploadedFile, UploadError> {
        if let Err(e) = self
            .settings
            .constraints
            .check(file, self.settings.allowed_types.as_deref())
        {
            let err = UploadError::from(e);
            self.report_failure(&err);
            return Err(err);
        }

        let bucket = self.settings.bucket.as_str();
        let key = generate_upload_key(path_prefix, &file.name);
        let options = PutOptions::create_only(
            file.content_type.clone(),
            self.settings.cache_control.clone(),
        );

        let mut task = UploadTask::start(file.name.clone());
        self.publish(&task);

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            size_bytes = file.size(),
            content_type = %file.content_type,
            "Starting upload"
        );
        let started = Instant::now();

        let write = AssertUnwindSafe(self.storage.upload(bucket, &key, file.data.clone(), &options))
            .catch_unwind();
        let outcome = ProgressTicker::start(&self.settings.progress)
            .run_until(write, |percent| {
                task.advance_to(percent);
                self.publish(&task);
            })
            .await;

        let result = match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(UploadError::Transport {
                file_name: file.name.clone(),
                file_size: file.size(),
                source,
            }),
            Err(payload) => Err(UploadError::Unknown(panic_message(payload.as_ref()))),
        };

        match result {
            Ok(()) => {
                task.complete();
                self.publish(&task);
                self.schedule_clear(task.id, self.settings.success_linger);

                tracing::info!(
                    bucket = %bucket,
                    key = %key,
                    size_bytes = file.size(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Upload completed"
                );

                let uploaded = UploadedFile::new(key);
                self.notifier.success(messages::UPLOAD_SUCCEEDED);
                if let Some(callback) = &self.on_success {
                    callback(&uploaded.file_path, &uploaded.public_url);
                }
                Ok(uploaded)
            }
            Err(err) => {
                task.fail();
                self.publish(&task);
                self.schedule_clear(task.id, self.settings.error_linger);

                tracing::debug!(
                    bucket = %bucket,
                    key = %key,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Upload did not complete"
                );
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    /// Upload files one after another. Returns the successes in input order;
    /// failures are skipped after being reported individually.
    pub async fn upload_multiple(
        &self,
        files: &[UploadFile],
        path_prefix: Option<&str>,
    ) -> Vec<UploadedFile> {
        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            if let Some(result) = self.upload_file(file, path_prefix).await {
                uploaded.push(result);
            }
        }
        self.summarize_batch(uploaded.len(), files.len());
        uploaded
    }

    /// Like [`UploadService::upload_multiple`] with up to `limit` uploads in
    /// flight. Results keep input order. The displayed task follows whichever
    /// upload changed last.
    pub async fn upload_multiple_concurrent(
        &self,
        files: &[UploadFile],
        path_prefix: Option<&str>,
        limit: usize,
    ) -> Vec<UploadedFile> {
        let results: Vec<Option<UploadedFile>> = stream::iter(files)
            .map(|file| self.upload_file(file, path_prefix))
            .buffered(limit.max(1))
            .collect()
            .await;

        let uploaded: Vec<UploadedFile> = results.into_iter().flatten().collect();
        self.summarize_batch(uploaded.len(), files.len());
        uploaded
    }

    /// Short-lived URL for viewing an uploaded file. Missing objects are
    /// reported as [`StorageError::NotFound`] instead of signed.
    pub async fn signed_url(&self, file_path: &str) -> StorageResult<String> {
        let bucket = self.settings.bucket.as_str();
        if !self.storage.exists(bucket, file_path).await? {
            return Err(StorageError::NotFound(file_path.to_string()));
        }
        self.storage
            .create_signed_url(bucket, file_path, self.settings.signed_url_ttl)
            .await
    }

    /// Remove an uploaded file. The outcome is reported through the notifier.
    pub async fn delete_file(&self, file_path: &str) -> bool {
        match self.storage.delete(&self.settings.bucket, file_path).await {
            Ok(()) => {
                tracing::info!(bucket = %self.settings.bucket, key = %file_path, "File deleted");
                self.notifier.success(messages::FILE_DELETED);
                true
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.settings.bucket,
                    key = %file_path,
                    "Failed to delete file"
                );
                self.notifier.error(messages::DELETE_FAILED);
                false
            }
        }
    }

    fn publish(&self, task: &UploadTask) {
        self.state.send_replace(Some(task.clone()));
        if let Some(callback) = &self.on_progress {
            callback(task);
        }
    }

    /// Clear the displayed task after `linger`, unless a newer upload has
    /// replaced it by then.
    fn schedule_clear(&self, task_id: Uuid, linger: Duration) {
        let deadline = Instant::now() + linger;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            time::sleep_until(deadline).await;
            state.send_if_modified(|current| {
                if current.as_ref().map(|t| t.id) == Some(task_id) {
                    *current = None;
                    true
                } else {
                    false
                }
            });
        });
    }

    fn report_failure(&self, err: &UploadError) {
        log_error(err, "Upload failed");
        self.notifier.error(&err.client_message());
        if let Some(callback) = &self.on_error {
            callback(err);
        }
    }

    fn summarize_batch(&self, uploaded: usize, total: usize) {
        if total > 1 && uploaded < total {
            self.notifier.info(&messages::batch_summary(uploaded, total));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "storage backend panicked".to_string()
    }
}
