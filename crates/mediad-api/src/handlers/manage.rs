//! Asset management: delete, info, and the temp-area sweep.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mediad_core::models::{Category, CleanupReport, MediaInfo};
use mediad_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AdminPrincipal, Principal};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: String,
}

fn parse_category(raw: &str) -> Result<Category, HttpAppError> {
    Category::parse(raw).ok_or_else(|| {
        HttpAppError(AppError::InvalidInput(format!(
            "Unknown category: {}",
            raw
        )))
    })
}

/// Delete an asset and its thumbnail
#[utoipa::path(
    delete,
    path = "/media/{name}",
    tag = "manage",
    params(
        ("name" = String, Path, description = "Storage name"),
        ("category" = String, Query, description = "image | video | document")
    ),
    responses(
        (status = 204, description = "Asset and thumbnail removed"),
        (status = 401, description = "Missing or invalid principal", body = ErrorResponse),
        (status = 404, description = "Unknown name", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(principal_id = %principal.id))]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(name): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let category = parse_category(&query.category)?;

    state.store.delete(category, &name).await?;

    tracing::info!(name = %name, category = %category, "Asset deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Filesystem metadata for a stored asset
#[utoipa::path(
    get,
    path = "/media/info/{name}",
    tag = "manage",
    params(
        ("name" = String, Path, description = "Storage name"),
        ("category" = String, Query, description = "image | video | document")
    ),
    responses(
        (status = 200, description = "Asset metadata", body = MediaInfo),
        (status = 401, description = "Missing or invalid principal", body = ErrorResponse),
        (status = 404, description = "Unknown name", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(principal_id = %principal.id))]
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(name): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<MediaInfo>, HttpAppError> {
    let category = parse_category(&query.category)?;

    let stat = state.store.stat(category, &name).await?;

    Ok(Json(MediaInfo {
        content_type: content_type_from_name(&name),
        file_name: name,
        category,
        size: stat.size,
        created_at: stat.created_at,
        modified_at: stat.modified_at,
    }))
}

fn content_type_from_name(name: &str) -> String {
    super::serve::content_type_for(name).to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanupRequest {
    /// Retention window in milliseconds; entries older than this are
    /// removed. Defaults to the configured retention (24h).
    pub max_age_ms: Option<u64>,
}

/// Sweep the temp area (admin only)
#[utoipa::path(
    post,
    path = "/media/cleanup",
    tag = "manage",
    request_body(content = inline(Object), content_type = "application/json"),
    responses(
        (status = 200, description = "Sweep completed", body = CleanupReport),
        (status = 401, description = "Missing or invalid principal", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body), fields(principal_id = %admin.principal.id))]
pub async fn cleanup(
    State(state): State<Arc<AppState>>,
    admin: AdminPrincipal,
    body: Option<Json<CleanupRequest>>,
) -> Result<Json<CleanupReport>, HttpAppError> {
    let max_age_ms = body
        .and_then(|Json(req)| req.max_age_ms)
        .unwrap_or(state.config.temp_retention_ms);

    let removed = state
        .store
        .sweep_temp(Duration::from_millis(max_age_ms))
        .await?;

    tracing::info!(removed, max_age_ms, "Temp area swept");
    Ok(Json(CleanupReport { removed }))
}
