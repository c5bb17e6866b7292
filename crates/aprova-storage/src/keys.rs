//! Shared key generation for uploads.
//!
//! Key format: `{prefix}/{timestamp_ms}-{token}.{ext}`, where the prefix is
//! optional, the token is six lowercase alphanumerics and the extension is
//! taken from the original file name.

use crate::traits::{StorageError, StorageResult};
use rand::distr::Alphanumeric;
use rand::Rng;

const TOKEN_LEN: usize = 6;

/// Generate a destination key for an upload of `file_name`.
///
/// The timestamp and random token make collisions unlikely; uploads are
/// still written create-only so a collision fails instead of overwriting.
pub fn generate_upload_key(path_prefix: Option<&str>, file_name: &str) -> String {
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    let mut name = format!("{}-{}", chrono::Utc::now().timestamp_millis(), token);
    if let Some(ext) = file_extension(file_name) {
        name.push('.');
        name.push_str(ext);
    }

    match path_prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}/{}", prefix, name),
        None => name,
    }
}

/// Extension of the original file name, without the dot.
///
/// A name without a dot, or a dotfile such as `.env`, has no extension.
pub fn file_extension(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 == base.len() => None,
        Some(idx) => Some(&base[idx + 1..]),
    }
}

/// Reject keys that could escape the bucket.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Reject bucket names that are not a single plain path segment.
pub fn validate_bucket(bucket: &str) -> StorageResult<()> {
    if bucket.is_empty()
        || bucket.contains('/')
        || bucket.contains('\\')
        || bucket.contains("..")
    {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {:?}",
            bucket
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_keeps_extension_and_prefix() {
        let key = generate_upload_key(Some("client-42/campaign"), "Banner Final.PNG");
        assert!(key.starts_with("client-42/campaign/"));
        assert!(key.ends_with(".PNG"));

        let name = key.rsplit('/').next().unwrap();
        let (timestamp, rest) = name.split_once('-').unwrap();
        assert!(timestamp.parse::<i64>().is_ok());
        let token = rest.trim_end_matches(".PNG");
        assert_eq!(token.len(), 6);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_prefix_slashes_are_trimmed() {
        let key = generate_upload_key(Some("/briefings/"), "a.pdf");
        assert!(key.starts_with("briefings/"));
        assert!(!key.contains("//"));

        let key = generate_upload_key(Some(""), "a.pdf");
        assert!(!key.contains('/'));
    }

    #[test]
    fn test_consecutive_keys_differ() {
        let a = generate_upload_key(None, "a.jpg");
        let b = generate_upload_key(None, "a.jpg");
        assert_ne!(a, b);
    }

    #[test]
    fn test_extension_rules() {
        assert_eq!(file_extension("photo.jpeg"), Some("jpeg"));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".env"), None);
        assert_eq!(file_extension("trailing."), None);
        assert_eq!(file_extension("dir.d/file"), None);

        let key = generate_upload_key(None, "README");
        assert!(!key.contains('.'));
    }

    #[test]
    fn test_key_validation_rejects_traversal() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("campaign/1700000000000-abc123.png").is_ok());
    }

    #[test]
    fn test_bucket_validation() {
        assert!(validate_bucket("creatives").is_ok());
        assert!(validate_bucket("a/b").is_err());
        assert!(validate_bucket("..").is_err());
        assert!(validate_bucket("").is_err());
    }
}
