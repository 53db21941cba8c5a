//! Mediad Core Library
//!
//! Core domain models, error types, and configuration shared across all
//! mediad crates.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, LogLevel};
pub use models::{
    BatchResult, Category, CleanupReport, ImageFormat, ImageOptions, MediaAsset, MediaInfo,
    MixedResult, ProcessingOptions, UploadCandidate, UploadFailure, VideoOptions,
};
