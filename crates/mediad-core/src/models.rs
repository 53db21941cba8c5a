//! Data models for the ingestion service
//!
//! Request-side types (`UploadCandidate`, `ProcessingOptions`) are transient
//! and in-memory; response-side types (`MediaAsset`, `BatchResult`) are the
//! durable descriptors handed back to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Coarse media classification. Derived exactly once from the MIME
/// allow-lists by the validator; `Unknown` never survives validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Video,
    Document,
    Unknown,
}

impl Category {
    /// Storage directory for this category, relative to the upload root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Image => "images",
            Category::Video => "videos",
            Category::Document => "documents",
            Category::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s.to_lowercase().as_str() {
            "image" | "images" => Some(Category::Image),
            "video" | "videos" => Some(Category::Video),
            "document" | "documents" => Some(Category::Document),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Image => write!(f, "image"),
            Category::Video => write!(f, "video"),
            Category::Document => write!(f, "document"),
            Category::Unknown => write!(f, "unknown"),
        }
    }
}

/// One uploaded file, parsed from a multipart part but not yet accepted.
/// Consumed by the upload orchestrator; nothing retains it afterwards.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub original_filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub principal_id: Uuid,
}

impl UploadCandidate {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Output encoding for processed images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    pub fn parse(s: &str) -> Option<ImageFormat> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// Bounding box, quality, and encoding for image processing.
#[derive(Debug, Clone, Copy)]
pub struct ImageOptions {
    pub target_width: u32,
    pub target_height: u32,
    pub quality: u8,
    pub output_format: ImageFormat,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            target_width: 1920,
            target_height: 1920,
            quality: 80,
            output_format: ImageFormat::Jpeg,
        }
    }
}

/// Transcode bounds for video processing. Unlike images, videos are only
/// transcoded when the caller asks for it.
#[derive(Debug, Clone)]
pub struct VideoOptions {
    pub target_width: u32,
    pub target_height: u32,
    pub target_bitrate_kbps: u32,
    pub output_format: String,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            target_width: 1280,
            target_height: 720,
            target_bitrate_kbps: 2000,
            output_format: "mp4".to_string(),
        }
    }
}

/// Per-request processing configuration, parsed from the non-file form
/// fields of an upload request. Image options always apply (with defaults);
/// video options being absent means "store as-is, probe and thumbnail only".
#[derive(Debug, Clone, Default)]
pub struct ProcessingOptions {
    pub image: ImageOptions,
    pub video: Option<VideoOptions>,
}

/// The durable result of a successful upload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MediaAsset {
    /// Generated storage name, unique per upload.
    pub file_name: String,
    pub category: Category,
    pub original_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
    /// Thumbnail storage name under the thumbnails directory, when one
    /// was generated (best-effort).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub principal_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Per-file failure record in a batch response. Always carries the original
/// filename so a failed file is never silently dropped.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadFailure {
    pub file_name: String,
    pub errors: Vec<String>,
}

/// Result of a multi-file upload: successes and failures in request order.
/// `files.len() + errors.len()` always equals the number of candidates.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct BatchResult {
    pub files: Vec<MediaAsset>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<UploadFailure>,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.files.len() + self.errors.len()
    }
}

/// Result of a mixed upload, grouped by the form field the file arrived
/// under.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct MixedResult {
    pub images: BatchResult,
    pub videos: BatchResult,
    pub documents: BatchResult,
}

/// Filesystem metadata for a stored asset (info endpoint).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MediaInfo {
    pub file_name: String,
    pub category: Category,
    pub size: u64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Outcome of a temp-area sweep.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CleanupReport {
    pub removed: usize,
}
