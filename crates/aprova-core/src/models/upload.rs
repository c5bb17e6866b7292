use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a single upload as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Completed,
    Error,
}

/// Display state of one in-flight upload.
///
/// Created when the transport call begins, advanced by the progress ticker,
/// finalized by the orchestrator and cleared after a short linger. Never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTask {
    /// Identifies the upload call that owns this state.
    pub id: Uuid,
    pub file_name: String,
    pub progress_percent: u8,
    pub status: UploadStatus,
    pub started_at: DateTime<Utc>,
}

impl UploadTask {
    pub fn start(file_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            progress_percent: 0,
            status: UploadStatus::Uploading,
            started_at: Utc::now(),
        }
    }

    /// Move progress forward; never backwards and never past 100.
    pub fn advance_to(&mut self, percent: u8) {
        self.progress_percent = self.progress_percent.max(percent.min(100));
    }

    pub fn complete(&mut self) {
        self.progress_percent = 100;
        self.status = UploadStatus::Completed;
    }

    pub fn fail(&mut self) {
        self.status = UploadStatus::Error;
    }
}

/// Result of a successful upload.
///
/// `file_path` is the only durable reference. `public_url` is always empty:
/// viewers request a short-lived signed URL instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_path: String,
    pub public_url: String,
}

impl UploadedFile {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            public_url: String::new(),
        }
    }
}
