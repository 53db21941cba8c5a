//! Asset serving.
//!
//! Generated names are immutable, so public assets get a year-long
//! immutable cache policy. Videos honor single byte ranges; everything is
//! streamed off disk rather than buffered.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use mediad_core::models::Category;
use mediad_core::AppError;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio_util::io::ReaderStream;

use crate::auth::Principal;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

const STREAM_CHUNK_SIZE: usize = 64 * 1024;
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";
const PRIVATE_CACHE: &str = "private, max-age=0";

/// MIME type from the storage name's extension. Names are generated from
/// sanitized filenames, so the extension is already lower-cased.
pub(crate) fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next().unwrap_or("") {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

async fn open_asset(
    state: &AppState,
    category: Category,
    name: &str,
) -> Result<(tokio::fs::File, u64), HttpAppError> {
    let path = state.store.asset_path(category, name)?;

    let file = tokio::fs::File::open(&path).await.map_err(|_| {
        HttpAppError(AppError::NotFound(format!("{}/{}", category.dir_name(), name)))
    })?;

    let size = file
        .metadata()
        .await
        .map_err(|e| HttpAppError(AppError::Storage(format!("Failed to stat file: {}", e))))?
        .len();

    Ok((file, size))
}

fn stream_full(file: tokio::fs::File, size: u64, content_type: &str, cache: &str) -> Response {
    let stream = ReaderStream::with_capacity(file, STREAM_CHUNK_SIZE);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, size.to_string()),
            (header::CACHE_CONTROL, cache.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

/// Parse a `Range` header against the file size. Only single ranges are
/// supported. Returns the inclusive byte span, or None when the header is
/// unsatisfiable for this file.
fn parse_range_header(raw: &str, file_size: u64) -> Option<(u64, u64)> {
    if file_size == 0 {
        return None;
    }
    let spec = raw.strip_prefix("bytes=")?;
    let (start_str, end_str) = spec.split_once('-')?;

    if start_str.is_empty() {
        // Suffix range: last N bytes.
        let suffix: u64 = end_str.parse().ok()?;
        if suffix == 0 {
            return None;
        }
        Some((file_size.saturating_sub(suffix), file_size - 1))
    } else {
        let start: u64 = start_str.parse().ok()?;
        if start >= file_size {
            return None;
        }
        let end = if end_str.is_empty() {
            file_size - 1
        } else {
            end_str.parse::<u64>().ok()?.min(file_size - 1)
        };
        if start > end {
            return None;
        }
        Some((start, end))
    }
}

/// Serve a processed image (public, immutable cache)
#[utoipa::path(
    get,
    path = "/media/images/{name}",
    tag = "serve",
    params(("name" = String, Path, description = "Storage name")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Unknown name", body = ErrorResponse)
    )
)]
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, HttpAppError> {
    let (file, size) = open_asset(&state, Category::Image, &name).await?;
    Ok(stream_full(file, size, content_type_for(&name), IMMUTABLE_CACHE))
}

/// Serve a thumbnail (public, immutable cache)
#[utoipa::path(
    get,
    path = "/media/thumbnails/{name}",
    tag = "serve",
    params(("name" = String, Path, description = "Thumbnail storage name")),
    responses(
        (status = 200, description = "Thumbnail bytes"),
        (status = 404, description = "Unknown name", body = ErrorResponse)
    )
)]
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, HttpAppError> {
    let path = state.store.thumbnail_path(&name)?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| HttpAppError(AppError::NotFound(format!("thumbnails/{}", name))))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| HttpAppError(AppError::Storage(format!("Failed to stat file: {}", e))))?
        .len();

    Ok(stream_full(file, size, content_type_for(&name), IMMUTABLE_CACHE))
}

/// Serve a document (authenticated, private cache)
#[utoipa::path(
    get,
    path = "/media/documents/{name}",
    tag = "serve",
    params(("name" = String, Path, description = "Storage name")),
    responses(
        (status = 200, description = "Document bytes"),
        (status = 401, description = "Missing or invalid principal", body = ErrorResponse),
        (status = 404, description = "Unknown name", body = ErrorResponse)
    )
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(name): Path<String>,
) -> Result<Response, HttpAppError> {
    let (file, size) = open_asset(&state, Category::Document, &name).await?;
    Ok(stream_full(file, size, content_type_for(&name), PRIVATE_CACHE))
}

/// Serve a video with byte-range support
///
/// A `Range` header yields 206 with `Content-Range`; an unsatisfiable
/// range yields 416; no header yields the full file.
#[utoipa::path(
    get,
    path = "/media/videos/{name}",
    tag = "serve",
    params(("name" = String, Path, description = "Storage name")),
    responses(
        (status = 200, description = "Full video bytes"),
        (status = 206, description = "Requested byte range"),
        (status = 404, description = "Unknown name", body = ErrorResponse),
        (status = 416, description = "Range not satisfiable")
    )
)]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let (mut file, size) = open_asset(&state, Category::Video, &name).await?;
    let content_type = content_type_for(&name);

    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        // multi-range requests are valid but unsupported; ignore them and
        // serve the full representation instead of failing
        .filter(|raw| !raw.contains(','));

    let Some(raw_range) = range_header else {
        let mut response = stream_full(file, size, content_type, IMMUTABLE_CACHE);
        response.headers_mut().insert(
            header::ACCEPT_RANGES,
            header::HeaderValue::from_static("bytes"),
        );
        return Ok(response);
    };

    let Some((start, end)) = parse_range_header(raw_range, size) else {
        return Ok((
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("bytes */{}", size))],
        )
            .into_response());
    };

    let length = end - start + 1;

    file.seek(SeekFrom::Start(start))
        .await
        .map_err(|e| HttpAppError(AppError::Storage(format!("Failed to seek: {}", e))))?;

    let stream = ReaderStream::with_capacity(file.take(length), STREAM_CHUNK_SIZE);

    Ok((
        StatusCode::PARTIAL_CONTENT,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, end, size),
            ),
            (header::CONTENT_LENGTH, length.to_string()),
            (header::ACCEPT_RANGES, "bytes".to_string()),
            (header::CACHE_CONTROL, IMMUTABLE_CACHE.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
