//! Multipart ingestion.
//!
//! Parses upload requests into in-memory `UploadCandidate`s plus the
//! `ProcessingOptions` carried by the non-file form fields. Framework-level
//! failures (oversized part, malformed body) are mapped to 400s with
//! machine codes before any candidate reaches the orchestrator.

use axum::extract::multipart::{Field, Multipart, MultipartError};
use mediad_core::models::{
    ImageFormat, ImageOptions, ProcessingOptions, UploadCandidate, VideoOptions,
};
use mediad_core::AppError;
use uuid::Uuid;

/// File caps for the mixed endpoint, one per named field.
#[derive(Debug, Clone, Copy)]
pub struct MixedCaps {
    pub images: usize,
    pub videos: usize,
    pub documents: usize,
}

/// Candidates from a mixed upload, grouped by the field they arrived under.
#[derive(Debug, Default)]
pub struct MixedCandidates {
    pub images: Vec<UploadCandidate>,
    pub videos: Vec<UploadCandidate>,
    pub documents: Vec<UploadCandidate>,
}

fn map_multipart_error(err: MultipartError) -> AppError {
    let text = err.body_text();
    if text.contains("exceeded") || text.contains("length limit") {
        AppError::FileTooLarge(text)
    } else {
        AppError::MultipartInvalid(text)
    }
}

async fn read_candidate(field: Field<'_>, principal_id: Uuid) -> Result<UploadCandidate, AppError> {
    let original_filename = field
        .file_name()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let data = field.bytes().await.map_err(map_multipart_error)?;

    tracing::debug!(
        filename = %original_filename,
        content_type = %content_type,
        bytes = data.len(),
        "Buffered upload part"
    );

    Ok(UploadCandidate {
        original_filename,
        content_type,
        data: data.to_vec(),
        principal_id,
    })
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(map_multipart_error)
}

/// Accumulates non-file form fields into `ProcessingOptions`. Image options
/// start from defaults; video options only materialize when at least one
/// `video_*` field is present.
#[derive(Debug, Default)]
struct OptionsBuilder {
    image: ImageOptions,
    video: Option<VideoOptions>,
}

impl OptionsBuilder {
    fn video_mut(&mut self) -> &mut VideoOptions {
        self.video.get_or_insert_with(VideoOptions::default)
    }

    fn apply(&mut self, name: &str, value: &str) -> Result<(), AppError> {
        match name {
            "image_width" => self.image.target_width = parse_field(name, value)?,
            "image_height" => self.image.target_height = parse_field(name, value)?,
            "image_quality" => self.image.quality = parse_field(name, value)?,
            "image_format" => {
                self.image.output_format = ImageFormat::parse(value).ok_or_else(|| {
                    AppError::InvalidInput(format!("Unknown image format: {}", value))
                })?;
            }
            "video_width" => self.video_mut().target_width = parse_field(name, value)?,
            "video_height" => self.video_mut().target_height = parse_field(name, value)?,
            "video_bitrate_kbps" => {
                self.video_mut().target_bitrate_kbps = parse_field(name, value)?;
            }
            "video_format" => self.video_mut().output_format = value.to_lowercase(),
            other => {
                return Err(AppError::UnexpectedField(other.to_string()));
            }
        }
        Ok(())
    }

    fn build(self) -> ProcessingOptions {
        ProcessingOptions {
            image: self.image,
            video: self.video,
        }
    }
}

fn parse_field<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, AppError> {
    value
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid value for {}: {}", name, value)))
}

/// Parse a single-file upload: exactly one part named `file`, plus optional
/// processing option fields.
pub async fn parse_single(
    mut multipart: Multipart,
    principal_id: Uuid,
) -> Result<(UploadCandidate, ProcessingOptions), AppError> {
    let mut candidate: Option<UploadCandidate> = None;
    let mut options = OptionsBuilder::default();

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() {
            if name != "file" {
                return Err(AppError::UnexpectedField(name));
            }
            if candidate.is_some() {
                return Err(AppError::TooManyFiles(
                    "Exactly one part named 'file' is accepted".to_string(),
                ));
            }
            candidate = Some(read_candidate(field, principal_id).await?);
        } else {
            let value = read_text(field).await?;
            options.apply(&name, &value)?;
        }
    }

    let candidate = candidate.ok_or(AppError::NoFileProvided)?;
    Ok((candidate, options.build()))
}

/// Parse a batch upload: up to `max_files` parts named `field_name`.
pub async fn parse_batch(
    mut multipart: Multipart,
    principal_id: Uuid,
    field_name: &str,
    max_files: usize,
) -> Result<(Vec<UploadCandidate>, ProcessingOptions), AppError> {
    let mut candidates = Vec::new();
    let mut options = OptionsBuilder::default();

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() {
            if name != field_name {
                return Err(AppError::UnexpectedField(name));
            }
            if candidates.len() >= max_files {
                return Err(AppError::TooManyFiles(format!(
                    "At most {} files per request under '{}'",
                    max_files, field_name
                )));
            }
            candidates.push(read_candidate(field, principal_id).await?);
        } else {
            let value = read_text(field).await?;
            options.apply(&name, &value)?;
        }
    }

    if candidates.is_empty() {
        return Err(AppError::NoFileProvided);
    }

    Ok((candidates, options.build()))
}

/// Parse a mixed upload: parts named `images`, `videos`, `documents`, each
/// with its own cap. At least one file across all three is required.
pub async fn parse_mixed(
    mut multipart: Multipart,
    principal_id: Uuid,
    caps: MixedCaps,
) -> Result<(MixedCandidates, ProcessingOptions), AppError> {
    let mut out = MixedCandidates::default();
    let mut options = OptionsBuilder::default();

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() {
            let (bucket, cap) = match name.as_str() {
                "images" => (&mut out.images, caps.images),
                "videos" => (&mut out.videos, caps.videos),
                "documents" => (&mut out.documents, caps.documents),
                other => return Err(AppError::UnexpectedField(other.to_string())),
            };
            if bucket.len() >= cap {
                return Err(AppError::TooManyFiles(format!(
                    "At most {} files per request under '{}'",
                    cap, name
                )));
            }
            bucket.push(read_candidate(field, principal_id).await?);
        } else {
            let value = read_text(field).await?;
            options.apply(&name, &value)?;
        }
    }

    if out.images.is_empty() && out.videos.is_empty() && out.documents.is_empty() {
        return Err(AppError::NoFileProvided);
    }

    Ok((out, options.build()))
}
