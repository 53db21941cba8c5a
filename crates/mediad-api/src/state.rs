//! Application state shared across handlers.

use mediad_core::Config;
use mediad_processing::{UploadPolicy, VideoEngine};
use mediad_storage::{MediaStore, StoreConfig};
use std::sync::Arc;
use std::time::Duration;

/// Everything a handler needs, built once at startup (or per test).
pub struct AppState {
    pub config: Config,
    pub store: MediaStore,
    pub policy: UploadPolicy,
    pub video: Arc<VideoEngine>,
}

impl AppState {
    /// Build the state from configuration: opens the storage tree and
    /// constructs the engines.
    pub async fn from_config(config: Config) -> Result<Self, anyhow::Error> {
        let store = MediaStore::open(StoreConfig {
            root: config.storage_root.clone(),
            base_url: config.public_base_url.clone(),
        })
        .await?;

        let policy = UploadPolicy::from_config(&config);

        let video = Arc::new(VideoEngine::new(
            config.ffmpeg_path.clone(),
            config.ffprobe_path.clone(),
            Duration::from_secs(config.transcode_timeout_secs),
        )?);

        Ok(Self {
            config,
            store,
            policy,
            video,
        })
    }
}
