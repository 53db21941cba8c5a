//! Upload candidate validation.
//!
//! Pure policy checks, no I/O. Violations are accumulated rather than
//! short-circuited so the caller gets the complete list, and the matched
//! `Category` is produced exactly once here; everything downstream
//! pattern-matches on it instead of re-comparing MIME strings.

use mediad_core::config::Config;
use mediad_core::models::{Category, UploadCandidate};

/// Size cap and MIME allow-lists for upload validation.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_file_size: usize,
    pub image_types: Vec<String>,
    pub video_types: Vec<String>,
    pub document_types: Vec<String>,
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_file_size: config.max_file_size_bytes,
            image_types: config.image_allowed_content_types.clone(),
            video_types: config.video_allowed_content_types.clone(),
            document_types: config.document_allowed_content_types.clone(),
        }
    }

    /// Map a declared MIME type onto a category via the allow-lists.
    pub fn classify(&self, content_type: &str) -> Category {
        let normalized = normalize_mime_type(content_type);
        if self.image_types.iter().any(|t| t == &normalized) {
            Category::Image
        } else if self.video_types.iter().any(|t| t == &normalized) {
            Category::Video
        } else if self.document_types.iter().any(|t| t == &normalized) {
            Category::Document
        } else {
            Category::Unknown
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("file too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("type not allowed: {content_type}")]
    TypeNotAllowed { content_type: String },

    #[error("empty file")]
    EmptyFile,
}

impl ValidationError {
    /// Stable machine-readable code for this violation.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::FileTooLarge { .. } => "file_too_large",
            ValidationError::TypeNotAllowed { .. } => "type_not_allowed",
            ValidationError::EmptyFile => "empty_file",
        }
    }
}

/// Normalize a MIME type: lowercase, parameters stripped
/// (`image/JPEG; charset=utf-8` becomes `image/jpeg`).
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Validate a candidate against policy, accumulating every violation.
/// Returns the matched category only when there are none.
pub fn validate(
    candidate: &UploadCandidate,
    policy: &UploadPolicy,
) -> Result<Category, Vec<ValidationError>> {
    let mut errors = Vec::new();

    if candidate.size() == 0 {
        errors.push(ValidationError::EmptyFile);
    } else if candidate.size() > policy.max_file_size {
        errors.push(ValidationError::FileTooLarge {
            size: candidate.size(),
            max: policy.max_file_size,
        });
    }

    let category = policy.classify(&candidate.content_type);
    if category == Category::Unknown {
        errors.push(ValidationError::TypeNotAllowed {
            content_type: candidate.content_type.clone(),
        });
    }

    if errors.is_empty() {
        Ok(category)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_policy() -> UploadPolicy {
        UploadPolicy {
            max_file_size: 1024,
            image_types: vec!["image/jpeg".into(), "image/png".into()],
            video_types: vec!["video/mp4".into()],
            document_types: vec!["application/pdf".into()],
        }
    }

    fn candidate(content_type: &str, size: usize) -> UploadCandidate {
        UploadCandidate {
            original_filename: "f".into(),
            content_type: content_type.into(),
            data: vec![0u8; size],
            principal_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_accepts_each_category() {
        let policy = test_policy();
        assert_eq!(
            validate(&candidate("image/png", 10), &policy).unwrap(),
            Category::Image
        );
        assert_eq!(
            validate(&candidate("video/mp4", 10), &policy).unwrap(),
            Category::Video
        );
        assert_eq!(
            validate(&candidate("application/pdf", 10), &policy).unwrap(),
            Category::Document
        );
    }

    #[test]
    fn test_rejects_unknown_type() {
        let policy = test_policy();
        let errors = validate(&candidate("audio/mpeg", 10), &policy).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "type_not_allowed");
    }

    #[test]
    fn test_rejects_oversized() {
        let policy = test_policy();
        let errors = validate(&candidate("image/png", 2048), &policy).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "file_too_large");
    }

    #[test]
    fn test_accumulates_all_violations() {
        let policy = test_policy();
        let errors = validate(&candidate("audio/mpeg", 2048), &policy).unwrap_err();
        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["file_too_large", "type_not_allowed"]);
    }

    #[test]
    fn test_rejects_empty_file() {
        let policy = test_policy();
        let errors = validate(&candidate("image/png", 0), &policy).unwrap_err();
        assert_eq!(errors[0].code(), "empty_file");
    }

    #[test]
    fn test_mime_normalization() {
        let policy = test_policy();
        assert_eq!(
            policy.classify("IMAGE/PNG; charset=binary"),
            Category::Image
        );
        assert_eq!(normalize_mime_type("Video/MP4 ; foo=bar"), "video/mp4");
    }
}
