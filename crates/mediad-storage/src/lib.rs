//! Local filesystem storage for the media ingestion service.
//!
//! The storage tree is flat: one directory per category plus a thumbnails
//! directory and a temp area. Generated names alone provide uniqueness, so
//! concurrent requests always write to disjoint paths.

pub mod local;
pub mod naming;

pub use local::{AssetStat, MediaStore, PendingFile, StoreConfig};
pub use naming::{sanitize_filename, storage_name, storage_name_with, thumbnail_name};

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage name: {0}")]
    InvalidName(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Storage configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;
