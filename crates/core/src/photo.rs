//! Photo attachment naming and references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content types accepted for photo uploads.
pub const ALLOWED_PHOTO_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

/// A stored photo as recorded on a user or post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRef {
    /// Public URL of the object.
    pub url: String,
    /// Object name inside the bucket.
    pub filename: String,
    /// MIME type supplied at upload time.
    pub content_type: String,
}

impl PhotoRef {
    /// Rebuilds a reference from its three stored columns.
    ///
    /// Returns `None` unless all three are present.
    #[must_use]
    pub fn from_parts(
        url: Option<String>,
        filename: Option<String>,
        content_type: Option<String>,
    ) -> Option<Self> {
        Some(Self {
            url: url?,
            filename: filename?,
            content_type: content_type?,
        })
    }
}

/// Builds the object name for an upload: upload time in milliseconds
/// followed by the sanitized original filename.
#[must_use]
pub fn object_name(uploaded_at: DateTime<Utc>, original_filename: &str) -> String {
    let sanitized = sanitize_filename(original_filename);
    let name = if sanitized.is_empty() {
        "photo".to_string()
    } else {
        sanitized
    };

    format!("{}{name}", uploaded_at.timestamp_millis())
}

/// Sanitize filename for storage key.
///
/// Only ASCII alphanumeric characters, dots, hyphens, and underscores are
/// kept; anything else becomes an underscore. Path components are dropped.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Returns true if `content_type` may be uploaded as a photo.
#[must_use]
pub fn is_allowed_photo_type(content_type: &str) -> bool {
    ALLOWED_PHOTO_TYPES.contains(&content_type)
}
