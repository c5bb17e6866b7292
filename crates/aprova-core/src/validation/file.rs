//! Pre-upload file policy: per-category size ceilings and MIME allow-lists.
//!
//! Checks run before any network call. The size check runs first and the
//! first failing check wins; errors are never aggregated.

use crate::constants::{
    BYTES_PER_MB, DOCUMENT_CONTENT_TYPES, DOCUMENT_MAX_SIZE_MB, IMAGE_CONTENT_TYPES,
    IMAGE_MAX_SIZE_MB, VIDEO_CONTENT_TYPES, VIDEO_MAX_SIZE_MB,
};
use crate::models::MediaCategory;
use serde::{Deserialize, Serialize};

/// Anything that can be validated before upload.
pub trait FileDescriptor {
    /// Size in bytes
    fn size(&self) -> u64;

    /// MIME type as reported by the picker; may be empty.
    fn content_type(&self) -> &str;
}

/// Size and type of a file without its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub size: u64,
    pub content_type: String,
}

impl FileMeta {
    pub fn new(size: u64, content_type: impl Into<String>) -> Self {
        Self {
            size,
            content_type: content_type.into(),
        }
    }
}

impl FileDescriptor for FileMeta {
    fn size(&self) -> u64 {
        self.size
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{} devem ter no máximo {}MB", .category.label(), .max_bytes / BYTES_PER_MB)]
    FileTooLarge {
        category: MediaCategory,
        size: u64,
        max_bytes: u64,
    },

    #[error("Tipo de arquivo não permitido. Tipos aceitos: {}", .allowed.join(", "))]
    ContentTypeNotAllowed {
        content_type: String,
        allowed: Vec<String>,
    },
}

/// Plain outcome of a validation, for callers that only need a flag and a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(message.into()),
        }
    }
}

impl From<Result<MediaCategory, ValidationError>> for ValidationResult {
    fn from(result: Result<MediaCategory, ValidationError>) -> Self {
        match result {
            Ok(_) => ValidationResult::ok(),
            Err(e) => ValidationResult::rejected(e.to_string()),
        }
    }
}

/// Size ceilings and MIME allow-lists per category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConstraints {
    pub image_max_bytes: u64,
    pub video_max_bytes: u64,
    pub document_max_bytes: u64,
    pub image_types: Vec<String>,
    pub video_types: Vec<String>,
    pub document_types: Vec<String>,
}

impl Default for FileConstraints {
    fn default() -> Self {
        Self {
            image_max_bytes: IMAGE_MAX_SIZE_MB * BYTES_PER_MB,
            video_max_bytes: VIDEO_MAX_SIZE_MB * BYTES_PER_MB,
            document_max_bytes: DOCUMENT_MAX_SIZE_MB * BYTES_PER_MB,
            image_types: to_owned_list(IMAGE_CONTENT_TYPES),
            video_types: to_owned_list(VIDEO_CONTENT_TYPES),
            document_types: to_owned_list(DOCUMENT_CONTENT_TYPES),
        }
    }
}

impl FileConstraints {
    pub fn max_bytes(&self, category: MediaCategory) -> u64 {
        match category {
            MediaCategory::Image => self.image_max_bytes,
            MediaCategory::Video => self.video_max_bytes,
            MediaCategory::Document => self.document_max_bytes,
        }
    }

    pub fn allowed_types(&self, category: MediaCategory) -> &[String] {
        match category {
            MediaCategory::Image => &self.image_types,
            MediaCategory::Video => &self.video_types,
            MediaCategory::Document => &self.document_types,
        }
    }

    /// Union of the three built-in lists, in image, video, document order.
    pub fn all_types(&self) -> Vec<String> {
        MediaCategory::ALL
            .iter()
            .flat_map(|c| self.allowed_types(*c).iter().cloned())
            .collect()
    }

    /// Check size, then type. `allowed_types` replaces the built-in union
    /// when given.
    pub fn check<F: FileDescriptor + ?Sized>(
        &self,
        file: &F,
        allowed_types: Option<&[String]>,
    ) -> Result<MediaCategory, ValidationError> {
        let content_type = file.content_type();
        let category = MediaCategory::from_content_type(content_type);
        let max_bytes = self.max_bytes(category);

        if file.size() > max_bytes {
            tracing::debug!(
                category = %category,
                size_bytes = file.size(),
                max_bytes = max_bytes,
                "Rejected file over category limit"
            );
            return Err(ValidationError::FileTooLarge {
                category,
                size: file.size(),
                max_bytes,
            });
        }

        let allowed = match allowed_types {
            Some(list) => list.to_vec(),
            None => self.all_types(),
        };

        if !allowed.iter().any(|t| t == content_type) {
            tracing::debug!(content_type = %content_type, "Rejected file type");
            return Err(ValidationError::ContentTypeNotAllowed {
                content_type: content_type.to_string(),
                allowed,
            });
        }

        Ok(category)
    }

    /// Same as [`FileConstraints::check`], flattened to a [`ValidationResult`].
    pub fn validate<F: FileDescriptor + ?Sized>(
        &self,
        file: &F,
        allowed_types: Option<&[String]>,
    ) -> ValidationResult {
        self.check(file, allowed_types).into()
    }
}

/// Check a file against the built-in constraints.
pub fn check_file<F: FileDescriptor + ?Sized>(
    file: &F,
    allowed_types: Option<&[String]>,
) -> Result<MediaCategory, ValidationError> {
    FileConstraints::default().check(file, allowed_types)
}

/// Validate a file against the built-in constraints.
pub fn validate_file<F: FileDescriptor + ?Sized>(
    file: &F,
    allowed_types: Option<&[String]>,
) -> ValidationResult {
    FileConstraints::default().validate(file, allowed_types)
}

/// Best-effort MIME type for a file extension. Returns an empty string for
/// unknown extensions, which validation then treats as a document type that
/// is not allow-listed.
pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "",
    }
}

fn to_owned_list(types: &[&str]) -> Vec<String> {
    types.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = BYTES_PER_MB;

    #[test]
    fn test_size_at_limit_passes_and_one_byte_over_fails() {
        let cases = [
            ("image/png", 50 * MB, "Imagens", "50MB"),
            ("video/mp4", 100 * MB, "Vídeos", "100MB"),
            ("application/pdf", 50 * MB, "Documentos", "50MB"),
        ];

        for (content_type, max, label, limit) in cases {
            let at_limit = validate_file(&FileMeta::new(max, content_type), None);
            assert!(at_limit.valid, "{} at limit should pass", content_type);

            let over = validate_file(&FileMeta::new(max + 1, content_type), None);
            assert!(!over.valid);
            let message = over.error.unwrap();
            assert!(message.contains(label), "{}", message);
            assert!(message.contains(limit), "{}", message);
        }
    }

    #[test]
    fn test_size_message_format() {
        let err = check_file(&FileMeta::new(101 * MB, "video/mp4"), None).unwrap_err();
        assert_eq!(err.to_string(), "Vídeos devem ter no máximo 100MB");
    }

    #[test]
    fn test_every_builtin_type_is_accepted_within_limits() {
        let constraints = FileConstraints::default();
        for content_type in constraints.all_types() {
            let result = validate_file(&FileMeta::new(1024, content_type.clone()), None);
            assert!(result.valid, "{} should be accepted", content_type);
        }
    }

    #[test]
    fn test_unknown_types_are_rejected_with_accepted_list() {
        for content_type in ["image/tiff", "text/plain", "", "application/zip"] {
            let result = validate_file(&FileMeta::new(10, content_type), None);
            assert!(!result.valid, "{:?} should be rejected", content_type);
            let message = result.error.unwrap();
            assert!(message.starts_with("Tipo de arquivo não permitido"));
            assert!(message.contains("image/jpeg"));
            assert!(message.contains("application/pdf"));
        }
    }

    #[test]
    fn test_explicit_allow_list_replaces_builtin_union() {
        let only_pdf = vec!["application/pdf".to_string()];

        let png = validate_file(&FileMeta::new(10, "image/png"), Some(&only_pdf));
        assert!(!png.valid);
        assert_eq!(
            png.error.as_deref(),
            Some("Tipo de arquivo não permitido. Tipos aceitos: application/pdf")
        );

        let pdf = validate_file(&FileMeta::new(10, "application/pdf"), Some(&only_pdf));
        assert!(pdf.valid);
    }

    #[test]
    fn test_size_check_runs_before_type_check() {
        // Oversized and not allow-listed: the size message wins
        let err = check_file(&FileMeta::new(51 * MB, "image/tiff"), None).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
    }

    #[test]
    fn test_empty_type_uses_document_limit() {
        let err = check_file(&FileMeta::new(50 * MB + 1, ""), None).unwrap_err();
        assert!(err.to_string().starts_with("Documentos"));
    }

    #[test]
    fn test_builtin_types_map_to_their_own_category() {
        let constraints = FileConstraints::default();
        for category in MediaCategory::ALL {
            for content_type in constraints.allowed_types(category) {
                assert_eq!(
                    MediaCategory::from_content_type(content_type),
                    category,
                    "{} is listed under {}",
                    content_type,
                    category
                );
            }
        }
    }

    #[test]
    fn test_custom_limits_apply() {
        let constraints = FileConstraints {
            image_max_bytes: MB,
            ..FileConstraints::default()
        };
        assert!(constraints
            .check(&FileMeta::new(MB + 1, "image/png"), None)
            .is_err());
        assert!(constraints
            .check(&FileMeta::new(MB + 1, "video/mp4"), None)
            .is_ok());
    }

    #[test]
    fn test_validation_is_repeatable() {
        let file = FileMeta::new(10, "image/webp");
        assert_eq!(validate_file(&file, None), validate_file(&file, None));
    }

    #[test]
    fn test_extension_lookup() {
        assert_eq!(content_type_for_extension("JPG"), "image/jpeg");
        assert_eq!(content_type_for_extension("mov"), "video/quicktime");
        assert_eq!(content_type_for_extension("xyz"), "");
    }
}
