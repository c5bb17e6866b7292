//! Aprova upload orchestrator
//!
//! Validates a file against the upload policy, writes it to object storage
//! under a fresh create-only key, shows approximate progress while the write
//! is in flight, and reports the outcome through an injected [`Notifier`] and
//! optional callbacks. Failures never escape as errors from
//! [`UploadService::upload_file`]; a `None` result is the failure signal.

pub mod error;
pub mod messages;
pub mod notifier;
pub mod progress;
pub mod service;
pub mod types;

pub use error::UploadError;
pub use notifier::{ChannelNotifier, Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use progress::{ProgressSettings, ProgressTicker};
pub use service::UploadService;
pub use types::{UploadFile, UploadSettings};

pub use aprova_core::{UploadStatus, UploadTask, UploadedFile};
