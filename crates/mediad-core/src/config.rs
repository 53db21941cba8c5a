//! Configuration module
//!
//! Env-driven configuration with defaults for every knob. The storage root
//! is carried here and injected into the store at construction, so tests can
//! point the whole service at an isolated temporary directory.

use std::env;
use std::path::PathBuf;

const SERVER_PORT: u16 = 4000;
const MAX_FILE_SIZE_MB: usize = 50;
const BATCH_MAX_FILES: usize = 10;
const MIXED_MAX_IMAGES: usize = 5;
const MIXED_MAX_VIDEOS: usize = 2;
const MIXED_MAX_DOCUMENTS: usize = 3;
const THUMBNAIL_SIZE: u32 = 300;
const THUMBNAIL_QUALITY: u8 = 75;
const TEMP_RETENTION_MS: u64 = 24 * 60 * 60 * 1000;
const TRANSCODE_TIMEOUT_SECS: u64 = 300;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    /// Root of the on-disk storage tree (category directories live under it).
    pub storage_root: PathBuf,
    /// Base URL prefixed to generated asset URLs.
    pub public_base_url: String,
    pub max_file_size_bytes: usize,
    pub image_allowed_content_types: Vec<String>,
    pub video_allowed_content_types: Vec<String>,
    pub document_allowed_content_types: Vec<String>,
    pub batch_max_files: usize,
    pub mixed_max_images: usize,
    pub mixed_max_videos: usize,
    pub mixed_max_documents: usize,
    pub thumbnail_size: u32,
    pub thumbnail_quality: u8,
    /// Default retention window for the temp-area sweep.
    pub temp_retention_ms: u64,
    pub transcode_timeout_secs: u64,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let image_allowed_content_types = parse_list_env(
            "IMAGE_ALLOWED_CONTENT_TYPES",
            "image/jpeg,image/png,image/gif,image/webp",
        );
        let video_allowed_content_types = parse_list_env(
            "VIDEO_ALLOWED_CONTENT_TYPES",
            "video/mp4,video/webm,video/quicktime,video/x-msvideo",
        );
        let document_allowed_content_types = parse_list_env(
            "DOCUMENT_ALLOWED_CONTENT_TYPES",
            "application/pdf,text/plain,application/msword,\
             application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        );

        let server_port = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let storage_root = PathBuf::from(
            env::var("STORAGE_ROOT").unwrap_or_else(|_| "./uploads".to_string()),
        );

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", server_port));

        Ok(Config {
            server_port,
            environment,
            cors_origins,
            storage_root,
            public_base_url,
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            image_allowed_content_types,
            video_allowed_content_types,
            document_allowed_content_types,
            batch_max_files: parse_num_env("BATCH_MAX_FILES", BATCH_MAX_FILES),
            mixed_max_images: parse_num_env("MIXED_MAX_IMAGES", MIXED_MAX_IMAGES),
            mixed_max_videos: parse_num_env("MIXED_MAX_VIDEOS", MIXED_MAX_VIDEOS),
            mixed_max_documents: parse_num_env("MIXED_MAX_DOCUMENTS", MIXED_MAX_DOCUMENTS),
            thumbnail_size: parse_num_env("THUMBNAIL_SIZE", THUMBNAIL_SIZE),
            thumbnail_quality: parse_num_env("THUMBNAIL_QUALITY", THUMBNAIL_QUALITY),
            temp_retention_ms: parse_num_env("TEMP_RETENTION_MS", TEMP_RETENTION_MS),
            transcode_timeout_secs: parse_num_env(
                "TRANSCODE_TIMEOUT_SECS",
                TRANSCODE_TIMEOUT_SECS,
            ),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Upper bound on the whole request body: one batch of maximum files,
    /// plus slack for multipart framing and form fields.
    pub fn request_body_limit(&self) -> usize {
        self.max_file_size_bytes * self.batch_max_files + 1024 * 1024
    }
}

impl Default for Config {
    /// Defaults suitable for tests; storage root must be overridden to an
    /// isolated directory by the caller.
    fn default() -> Self {
        Config {
            server_port: SERVER_PORT,
            environment: "test".to_string(),
            cors_origins: vec!["*".to_string()],
            storage_root: PathBuf::from("./uploads"),
            public_base_url: format!("http://localhost:{}", SERVER_PORT),
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            image_allowed_content_types: split_list("image/jpeg,image/png,image/gif,image/webp"),
            video_allowed_content_types: split_list(
                "video/mp4,video/webm,video/quicktime,video/x-msvideo",
            ),
            document_allowed_content_types: split_list(
                "application/pdf,text/plain,application/msword,\
                 application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ),
            batch_max_files: BATCH_MAX_FILES,
            mixed_max_images: MIXED_MAX_IMAGES,
            mixed_max_videos: MIXED_MAX_VIDEOS,
            mixed_max_documents: MIXED_MAX_DOCUMENTS,
            thumbnail_size: THUMBNAIL_SIZE,
            thumbnail_quality: THUMBNAIL_QUALITY,
            temp_retention_ms: TEMP_RETENTION_MS,
            transcode_timeout_secs: TRANSCODE_TIMEOUT_SECS,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

fn parse_list_env(key: &str, default: &str) -> Vec<String> {
    split_list(&env::var(key).unwrap_or_else(|_| default.to_string()))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_num_env<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
