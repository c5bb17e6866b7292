//! Scripted storage backend.
//!
//! Each upload consumes the next scripted outcome (success once the script
//! is empty) after an optional simulated latency, and is recorded.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use aprova_storage::{PutOptions, Storage, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum Outcome {
    Succeed,
    TooLarge { limit: u64 },
    Duplicate,
    Fail(String),
    Panic(&'static str),
}

#[derive(Debug, Clone)]
pub struct UploadCall {
    pub bucket: String,
    pub key: String,
    pub size: usize,
    pub options: PutOptions,
    pub started_at: Instant,
}

#[derive(Default)]
pub struct ScriptedStorage {
    latency: Duration,
    script: Mutex<VecDeque<Outcome>>,
    uploads: Mutex<Vec<UploadCall>>,
    deletes: Mutex<Vec<String>>,
    fail_deletes: bool,
}

impl ScriptedStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn then(mut self, outcome: Outcome) -> Self {
        self.script.get_mut().unwrap().push_back(outcome);
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn uploads(&self) -> Vec<UploadCall> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for ScriptedStorage {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> StorageResult<()> {
        self.uploads.lock().unwrap().push(UploadCall {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: data.len(),
            options: options.clone(),
            started_at: Instant::now(),
        });
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Outcome::Succeed);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match outcome {
            Outcome::Succeed => Ok(()),
            Outcome::TooLarge { limit } => Err(StorageError::PayloadTooLarge {
                size: data.len() as u64,
                limit,
            }),
            Outcome::Duplicate => Err(StorageError::AlreadyExists(key.to_string())),
            Outcome::Fail(reason) => Err(StorageError::UploadFailed(reason)),
            Outcome::Panic(message) => panic!("{}", message),
        }
    }

    async fn download(&self, _bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        Err(StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, _bucket: &str, key: &str) -> StorageResult<()> {
        if self.fail_deletes {
            return Err(StorageError::DeleteFailed("scripted".to_string()));
        }
        self.deletes.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn exists(&self, _bucket: &str, key: &str) -> StorageResult<bool> {
        Ok(self.uploads().iter().any(|c| c.key == key))
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!(
            "https://signed.test/{}/{}?ttl={}",
            bucket,
            key,
            expires_in.as_secs()
        ))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
