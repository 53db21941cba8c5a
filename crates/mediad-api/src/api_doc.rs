//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use mediad_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mediad API",
        version = "0.1.0",
        description = "Media ingestion service: multipart upload of images, videos, and \
                       documents with validation, image resizing, video transcoding, \
                       thumbnails, and byte-range video serving."
    ),
    paths(
        handlers::upload::upload_single,
        handlers::upload::upload_multiple,
        handlers::upload::upload_images,
        handlers::upload::upload_videos,
        handlers::upload::upload_mixed,
        handlers::serve::get_image,
        handlers::serve::get_thumbnail,
        handlers::serve::get_video,
        handlers::serve::get_document,
        handlers::manage::delete_media,
        handlers::manage::get_info,
        handlers::manage::cleanup,
        handlers::health::health,
    ),
    components(schemas(
        models::MediaAsset,
        models::BatchResult,
        models::MixedResult,
        models::UploadFailure,
        models::MediaInfo,
        models::CleanupReport,
        models::Category,
        models::ImageFormat,
        ErrorResponse,
    )),
    tags(
        (name = "upload", description = "Multipart upload endpoints"),
        (name = "serve", description = "Asset serving"),
        (name = "manage", description = "Delete, info, cleanup"),
        (name = "health", description = "Health check")
    )
)]
pub struct ApiDoc;
