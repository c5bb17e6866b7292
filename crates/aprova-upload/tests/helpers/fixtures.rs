//! Upload file fixtures.

use aprova_core::constants::BYTES_PER_MB;
use aprova_upload::UploadFile;

pub fn file_of(name: &str, content_type: &str, size: usize) -> UploadFile {
    UploadFile::new(name, content_type, vec![0u8; size])
}

pub fn image_mb(name: &str, mb: u64) -> UploadFile {
    file_of(name, "image/jpeg", (mb * BYTES_PER_MB) as usize)
}

pub fn small_png(name: &str) -> UploadFile {
    file_of(name, "image/png", 1024)
}

pub fn text_file(name: &str) -> UploadFile {
    file_of(name, "text/plain", 16)
}
