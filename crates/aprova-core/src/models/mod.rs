//! Data models for the upload pipeline

mod media;
mod upload;

pub use media::MediaCategory;
pub use upload::{UploadStatus, UploadTask, UploadedFile};
