//! Route configuration and setup.

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use mediad_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/media/upload/single",
            post(handlers::upload::upload_single),
        )
        .route(
            "/media/upload/multiple",
            post(handlers::upload::upload_multiple),
        )
        .route(
            "/media/upload/images",
            post(handlers::upload::upload_images),
        )
        .route(
            "/media/upload/videos",
            post(handlers::upload::upload_videos),
        )
        .route("/media/upload/mixed", post(handlers::upload::upload_mixed))
        .route("/media/images/{name}", get(handlers::serve::get_image))
        .route(
            "/media/thumbnails/{name}",
            get(handlers::serve::get_thumbnail),
        )
        .route("/media/videos/{name}", get(handlers::serve::get_video))
        .route(
            "/media/documents/{name}",
            get(handlers::serve::get_document),
        )
        .route("/media/info/{name}", get(handlers::manage::get_info))
        .route("/media/cleanup", post(handlers::manage::cleanup))
        .route("/media/{name}", delete(handlers::manage::delete_media))
        .route("/api/openapi.json", get(openapi_json))
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(RequestBodyLimitLayer::new(config.request_body_limit()))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();
        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
