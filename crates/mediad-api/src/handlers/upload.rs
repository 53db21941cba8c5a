//! Upload handlers.
//!
//! Thin layer over the ingestion parser and the upload orchestrator: parse
//! multipart into candidates, run the service, map the outcome to 201 +
//! JSON. All of them require an authenticated principal.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mediad_core::models::{BatchResult, Category, MediaAsset, MixedResult};
use std::sync::Arc;

use crate::auth::Principal;
use crate::error::{ErrorResponse, HttpAppError};
use crate::ingest::{self, MixedCaps};
use crate::services::upload::UploadService;
use crate::state::AppState;

/// Upload a single file
///
/// One part named `file`; non-file form fields configure processing
/// (`image_width`, `image_quality`, `video_bitrate_kbps`, ...).
#[utoipa::path(
    post,
    path = "/media/upload/single",
    tag = "upload",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded", body = MediaAsset),
        (status = 400, description = "Validation or parse failure", body = ErrorResponse),
        (status = 401, description = "Missing or invalid principal", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(principal_id = %principal.id))]
pub async fn upload_single(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (candidate, options) = ingest::parse_single(multipart, principal.id)
        .await
        .map_err(HttpAppError)?;

    let service = UploadService::from_state(&state);
    let asset = service
        .upload_one(candidate, &options)
        .await
        .map_err(HttpAppError)?;

    Ok((StatusCode::CREATED, Json(asset)))
}

/// Upload up to `batch_max_files` files under the `files` field.
#[utoipa::path(
    post,
    path = "/media/upload/multiple",
    tag = "upload",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Batch processed; per-file failures in `errors`", body = BatchResult),
        (status = 400, description = "Parse failure", body = ErrorResponse),
        (status = 401, description = "Missing or invalid principal", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(principal_id = %principal.id))]
pub async fn upload_multiple(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    upload_batch(state, principal, multipart, None).await
}

/// Upload images only; non-image MIME types are rejected per file.
#[utoipa::path(
    post,
    path = "/media/upload/images",
    tag = "upload",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Batch processed", body = BatchResult),
        (status = 400, description = "Parse failure", body = ErrorResponse),
        (status = 401, description = "Missing or invalid principal", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(principal_id = %principal.id))]
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    upload_batch(state, principal, multipart, Some(Category::Image)).await
}

/// Upload videos only; non-video MIME types are rejected per file.
#[utoipa::path(
    post,
    path = "/media/upload/videos",
    tag = "upload",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Batch processed", body = BatchResult),
        (status = 400, description = "Parse failure", body = ErrorResponse),
        (status = 401, description = "Missing or invalid principal", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(principal_id = %principal.id))]
pub async fn upload_videos(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    upload_batch(state, principal, multipart, Some(Category::Video)).await
}

async fn upload_batch(
    state: Arc<AppState>,
    principal: Principal,
    multipart: Multipart,
    expected: Option<Category>,
) -> Result<(StatusCode, Json<BatchResult>), HttpAppError> {
    let (candidates, options) = ingest::parse_batch(
        multipart,
        principal.id,
        "files",
        state.config.batch_max_files,
    )
    .await
    .map_err(HttpAppError)?;

    let service = UploadService::from_state(&state);
    let result = service.upload_batch(candidates, &options, expected).await;

    Ok((StatusCode::CREATED, Json(result)))
}

/// Mixed upload: fields `images`, `videos`, `documents` with independent
/// caps; the response groups results by field.
#[utoipa::path(
    post,
    path = "/media/upload/mixed",
    tag = "upload",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Batches processed per field", body = MixedResult),
        (status = 400, description = "Parse failure", body = ErrorResponse),
        (status = 401, description = "Missing or invalid principal", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(principal_id = %principal.id))]
pub async fn upload_mixed(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let caps = MixedCaps {
        images: state.config.mixed_max_images,
        videos: state.config.mixed_max_videos,
        documents: state.config.mixed_max_documents,
    };

    let (candidates, options) = ingest::parse_mixed(multipart, principal.id, caps)
        .await
        .map_err(HttpAppError)?;

    let service = UploadService::from_state(&state);
    let result = MixedResult {
        images: service
            .upload_batch(candidates.images, &options, Some(Category::Image))
            .await,
        videos: service
            .upload_batch(candidates.videos, &options, Some(Category::Video))
            .await,
        documents: service
            .upload_batch(candidates.documents, &options, Some(Category::Document))
            .await,
    };

    Ok((StatusCode::CREATED, Json(result)))
}
