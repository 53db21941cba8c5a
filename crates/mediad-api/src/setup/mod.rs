//! Application assembly: state construction, routes, server lifecycle.

pub mod routes;
pub mod server;

use crate::state::AppState;
use axum::Router;
use mediad_core::Config;
use std::sync::Arc;

/// Build the application state and router from configuration.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    let state = Arc::new(AppState::from_config(config).await?);
    let router = routes::setup_routes(&state.config, state.clone())?;
    Ok((state, router))
}
