use serde::{Deserialize, Serialize};
use std::fmt;

/// Size category of an uploaded file, resolved from its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Video,
    Document,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 3] = [
        MediaCategory::Image,
        MediaCategory::Video,
        MediaCategory::Document,
    ];

    /// `video/*` is a video, `image/*` an image, anything else (including an
    /// empty type) is treated as a document.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("video/") {
            MediaCategory::Video
        } else if content_type.starts_with("image/") {
            MediaCategory::Image
        } else {
            MediaCategory::Document
        }
    }

    /// Plural label shown in validation messages.
    pub fn label(&self) -> &'static str {
        match self {
            MediaCategory::Image => "Imagens",
            MediaCategory::Video => "Vídeos",
            MediaCategory::Document => "Documentos",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaCategory::Image => write!(f, "image"),
            MediaCategory::Video => write!(f, "video"),
            MediaCategory::Document => write!(f, "document"),
        }
    }
}
