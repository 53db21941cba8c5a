//! Upload orchestration.
//!
//! One entry point per candidate: validate (no writes on reject), generate
//! the storage name, persist the original (the durability point), then
//! dispatch by category. Transform failures are downgraded to "stored
//! without processing"; storage failures after the durability point are
//! fatal for that file only and leave the original in place.

use chrono::Utc;
use mediad_core::models::{
    BatchResult, Category, MediaAsset, ProcessingOptions, UploadCandidate, UploadFailure,
};
use mediad_core::{AppError, Config};
use mediad_processing::{validate, ImageEngine, UploadPolicy, VideoEngine};
use mediad_storage::{naming, MediaStore};
use std::sync::Arc;

use crate::error::{app_error_from_storage, app_error_from_violations};
use crate::state::AppState;

pub struct UploadService {
    config: Config,
    store: MediaStore,
    policy: UploadPolicy,
    video: Arc<VideoEngine>,
}

/// Metadata gathered during category dispatch. Everything here is optional:
/// a candidate that fails every processing step still uploads successfully.
#[derive(Debug, Default)]
struct ProcessedMeta {
    processed_size: Option<u64>,
    width: Option<u32>,
    height: Option<u32>,
    duration_seconds: Option<f64>,
    codec: Option<String>,
    bitrate: Option<u64>,
    thumbnail: Option<String>,
}

impl UploadService {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            config: state.config.clone(),
            store: state.store.clone(),
            policy: state.policy.clone(),
            video: state.video.clone(),
        }
    }

    /// Upload one candidate end to end.
    #[tracing::instrument(
        skip(self, candidate, options),
        fields(
            filename = %candidate.original_filename,
            content_type = %candidate.content_type,
            size_bytes = candidate.size(),
            principal_id = %candidate.principal_id,
        )
    )]
    pub async fn upload_one(
        &self,
        candidate: UploadCandidate,
        options: &ProcessingOptions,
    ) -> Result<MediaAsset, AppError> {
        let category = validate(&candidate, &self.policy).map_err(app_error_from_violations)?;

        let name = naming::storage_name(&candidate.original_filename, candidate.principal_id)
            .map_err(app_error_from_storage)?;

        let pending = self
            .store
            .write_original(category, &name, &candidate.data)
            .await
            .map_err(app_error_from_storage)?;

        // From here the original is durable; the guard only rolls it back
        // if the request future is dropped before we commit.
        let outcome = self.process(category, &name, &candidate, options).await;

        pending.commit();

        let meta = outcome?;

        Ok(MediaAsset {
            file_name: name.clone(),
            category,
            original_size: candidate.size() as u64,
            processed_size: meta.processed_size,
            width: meta.width,
            height: meta.height,
            duration_seconds: meta.duration_seconds,
            codec: meta.codec,
            bitrate: meta.bitrate,
            thumbnail_url: meta.thumbnail.as_deref().map(|t| self.store.thumbnail_url(t)),
            thumbnail: meta.thumbnail,
            principal_id: candidate.principal_id,
            created_at: Utc::now(),
            url: self.store.url_for(category, &name),
        })
    }

    /// Upload many candidates sequentially, in request order. One file's
    /// failure is recorded and never aborts its siblings. When `expected`
    /// is set, candidates whose MIME classifies differently are rejected
    /// before the orchestrator runs.
    pub async fn upload_batch(
        &self,
        candidates: Vec<UploadCandidate>,
        options: &ProcessingOptions,
        expected: Option<Category>,
    ) -> BatchResult {
        let mut result = BatchResult::default();

        for candidate in candidates {
            let file_name = candidate.original_filename.clone();

            if let Some(expected) = expected {
                let actual = self.policy.classify(&candidate.content_type);
                if actual != expected {
                    result.errors.push(UploadFailure {
                        file_name,
                        errors: vec![format!(
                            "expected {} content, got '{}'",
                            expected, candidate.content_type
                        )],
                    });
                    continue;
                }
            }

            match self.upload_one(candidate, options).await {
                Ok(asset) => result.files.push(asset),
                Err(err) => {
                    let errors = err
                        .violations()
                        .map(|v| v.to_vec())
                        .unwrap_or_else(|| vec![err.to_string()]);
                    result.errors.push(UploadFailure { file_name, errors });
                }
            }
        }

        result
    }

    async fn process(
        &self,
        category: Category,
        name: &str,
        candidate: &UploadCandidate,
        options: &ProcessingOptions,
    ) -> Result<ProcessedMeta, AppError> {
        match category {
            Category::Image => self.process_image(name, candidate, options).await,
            Category::Video => self.process_video(name, candidate, options).await,
            Category::Document => Ok(ProcessedMeta::default()),
            // Unreachable: validation never lets Unknown through.
            Category::Unknown => Err(AppError::Internal(
                "Unclassified candidate reached the orchestrator".to_string(),
            )),
        }
    }

    async fn process_image(
        &self,
        name: &str,
        candidate: &UploadCandidate,
        options: &ProcessingOptions,
    ) -> Result<ProcessedMeta, AppError> {
        let mut meta = ProcessedMeta::default();

        match ImageEngine::transform(&candidate.data, &options.image) {
            Ok(processed) => {
                self.store
                    .replace_with_processed(Category::Image, name, &processed.data)
                    .await
                    .map_err(app_error_from_storage)?;
                meta.processed_size = Some(processed.data.len() as u64);
                meta.width = Some(processed.width);
                meta.height = Some(processed.height);
            }
            Err(err) => {
                tracing::warn!(
                    name = name,
                    error = %err,
                    "Image transform failed; storing original as-is"
                );
            }
        }

        let thumb = ImageEngine::thumbnail(
            &candidate.data,
            self.config.thumbnail_size,
            self.config.thumbnail_quality,
        );
        match thumb {
            Ok(bytes) => {
                let thumb_name = naming::thumbnail_name(name);
                match self.store.write_thumbnail(&thumb_name, &bytes).await {
                    Ok(()) => meta.thumbnail = Some(thumb_name),
                    Err(err) => {
                        tracing::warn!(name = name, error = %err, "Thumbnail write failed");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(name = name, error = %err, "Thumbnail generation failed");
            }
        }

        Ok(meta)
    }

    async fn process_video(
        &self,
        name: &str,
        _candidate: &UploadCandidate,
        options: &ProcessingOptions,
    ) -> Result<ProcessedMeta, AppError> {
        let mut meta = ProcessedMeta::default();

        let asset_path = self
            .store
            .asset_path(Category::Video, name)
            .map_err(app_error_from_storage)?;

        match self.video.probe(&asset_path).await {
            Ok(probed) => {
                meta.width = Some(probed.width);
                meta.height = Some(probed.height);
                meta.duration_seconds = Some(probed.duration);
                meta.codec = Some(probed.codec);
                meta.bitrate = probed.bitrate;
            }
            Err(err) => {
                tracing::warn!(name = name, error = %err, "Video probe failed; storing without metadata");
            }
        }

        if let Some(video_opts) = &options.video {
            let transcode_out = self
                .store
                .temp_dir()
                .join(format!("{}.transcode.{}", name, video_opts.output_format));

            match self
                .video
                .transcode(&asset_path, &transcode_out, video_opts)
                .await
            {
                Ok(()) => {
                    let bytes = tokio::fs::read(&transcode_out).await.map_err(|e| {
                        AppError::Storage(format!("Failed to read transcoded output: {}", e))
                    })?;
                    let _ = tokio::fs::remove_file(&transcode_out).await;
                    self.store
                        .replace_with_processed(Category::Video, name, &bytes)
                        .await
                        .map_err(app_error_from_storage)?;
                    meta.processed_size = Some(bytes.len() as u64);
                }
                Err(err) => {
                    tracing::warn!(name = name, error = %err, "Transcode failed; keeping original");
                }
            }
        }

        let frame_out = self.store.temp_dir().join(format!("{}.frame.jpg", name));
        match self
            .video
            .extract_frame(&asset_path, &frame_out, 0.10, self.config.thumbnail_size)
            .await
        {
            Ok(()) => {
                if let Ok(bytes) = tokio::fs::read(&frame_out).await {
                    let thumb_name = naming::thumbnail_name(name);
                    match self.store.write_thumbnail(&thumb_name, &bytes).await {
                        Ok(()) => meta.thumbnail = Some(thumb_name),
                        Err(err) => {
                            tracing::warn!(name = name, error = %err, "Thumbnail write failed");
                        }
                    }
                }
                let _ = tokio::fs::remove_file(&frame_out).await;
            }
            Err(err) => {
                tracing::warn!(name = name, error = %err, "Frame extraction failed; no thumbnail");
            }
        }

        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediad_storage::StoreConfig;
    use std::time::Duration;
    use uuid::Uuid;

    async fn test_service(root: &std::path::Path) -> UploadService {
        let config = Config {
            storage_root: root.to_path_buf(),
            ..Config::default()
        };
        let store = MediaStore::open(StoreConfig {
            root: config.storage_root.clone(),
            base_url: config.public_base_url.clone(),
        })
        .await
        .unwrap();
        let policy = UploadPolicy::from_config(&config);
        let video = Arc::new(
            VideoEngine::new(
                "ffmpeg-test-missing".into(),
                "ffprobe-test-missing".into(),
                Duration::from_secs(5),
            )
            .unwrap(),
        );
        UploadService {
            config,
            store,
            policy,
            video,
        }
    }

    fn png_candidate() -> UploadCandidate {
        let img = ::image::DynamicImage::new_rgb8(8, 8);
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, ::image::ImageFormat::Png).unwrap();
        UploadCandidate {
            original_filename: "tiny.png".to_string(),
            content_type: "image/png".to_string(),
            data: buf.into_inner(),
            principal_id: Uuid::new_v4(),
        }
    }

    fn count_files(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).map(|rd| rd.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_rejected_mime_makes_no_writes() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path()).await;

        let candidate = UploadCandidate {
            original_filename: "payload.zip".to_string(),
            content_type: "application/zip".to_string(),
            data: vec![1, 2, 3],
            principal_id: Uuid::new_v4(),
        };

        let err = service
            .upload_one(candidate, &ProcessingOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 400);

        for sub in ["images", "videos", "documents", "thumbnails"] {
            assert_eq!(count_files(&dir.path().join(sub)), 0, "{} not empty", sub);
        }
    }

    #[tokio::test]
    async fn test_image_upload_is_processed_and_thumbnailed() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path()).await;

        let asset = service
            .upload_one(png_candidate(), &ProcessingOptions::default())
            .await
            .unwrap();

        assert_eq!(asset.category, Category::Image);
        assert!(asset.processed_size.is_some());
        assert_eq!(asset.width, Some(8));
        assert_eq!(asset.height, Some(8));
        assert!(asset.thumbnail.is_some());
        assert_eq!(count_files(&dir.path().join("images")), 1);
        assert_eq!(count_files(&dir.path().join("thumbnails")), 1);
    }

    #[tokio::test]
    async fn test_corrupt_image_is_stored_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path()).await;

        let candidate = UploadCandidate {
            original_filename: "broken.png".to_string(),
            content_type: "image/png".to_string(),
            data: vec![0xDE, 0xAD, 0xBE, 0xEF],
            principal_id: Uuid::new_v4(),
        };

        let asset = service
            .upload_one(candidate, &ProcessingOptions::default())
            .await
            .unwrap();

        assert!(asset.processed_size.is_none());
        assert!(asset.width.is_none());
        assert!(asset.thumbnail.is_none());
        assert_eq!(count_files(&dir.path().join("images")), 1);
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_total() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path()).await;

        let good = png_candidate();
        let bad = UploadCandidate {
            original_filename: "nope.zip".to_string(),
            content_type: "application/zip".to_string(),
            data: vec![1],
            principal_id: good.principal_id,
        };
        let good2 = UploadCandidate {
            original_filename: "second.png".to_string(),
            ..png_candidate()
        };

        let result = service
            .upload_batch(
                vec![good, bad, good2],
                &ProcessingOptions::default(),
                None,
            )
            .await;

        assert_eq!(result.total(), 3);
        assert_eq!(result.files.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file_name, "nope.zip");
        assert!(result.files[0].file_name.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_category_restriction_rejects_before_orchestration() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path()).await;

        let pdf = UploadCandidate {
            original_filename: "doc.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: b"%PDF-1.4".to_vec(),
            principal_id: Uuid::new_v4(),
        };

        let result = service
            .upload_batch(
                vec![pdf],
                &ProcessingOptions::default(),
                Some(Category::Image),
            )
            .await;

        assert!(result.files.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(count_files(&dir.path().join("documents")), 0);
    }
}
