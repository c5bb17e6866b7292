//! Defaults shared by configuration, validation and the upload orchestrator.

/// One megabyte as used in every size limit and message.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

pub const IMAGE_MAX_SIZE_MB: u64 = 50;
pub const VIDEO_MAX_SIZE_MB: u64 = 100;
pub const DOCUMENT_MAX_SIZE_MB: u64 = 50;

/// Storage-wide object ceiling enforced by the backends.
pub const STORAGE_MAX_OBJECT_SIZE_MB: u64 = 100;

pub const DEFAULT_BUCKET: &str = "creatives";
pub const DEFAULT_CACHE_CONTROL: &str = "3600";

pub const PROGRESS_STEP_PERCENT: u8 = 10;
pub const PROGRESS_INTERVAL_MS: u64 = 200;
pub const PROGRESS_CAP_PERCENT: u8 = 90;

pub const SUCCESS_LINGER_MS: u64 = 1000;
pub const ERROR_LINGER_MS: u64 = 2000;

pub const SIGNED_URL_TTL_SECS: u64 = 3600;

pub const IMAGE_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

pub const VIDEO_CONTENT_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/webm",
];

pub const DOCUMENT_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];
