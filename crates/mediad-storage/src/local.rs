//! Local filesystem media store.
//!
//! The store owns the upload root and all name-to-path mapping. Writes go
//! to paths derived from generated names only, and every lookup rejects
//! names that could escape the tree.

use crate::naming::thumbnail_name;
use crate::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use mediad_core::models::Category;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const THUMBNAILS_DIR: &str = "thumbnails";
const TEMP_DIR: &str = "tmp";

/// Explicit store configuration, injected at construction.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Root directory of the storage tree.
    pub root: PathBuf,
    /// Base URL for serving files (e.g. `http://localhost:4000`).
    pub base_url: String,
}

/// Filesystem timestamps and size for a stored asset.
#[derive(Debug, Clone)]
pub struct AssetStat {
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A freshly written original that is deleted on drop unless committed.
/// Handlers hold this across processing so a client disconnect (which drops
/// the request future) rolls back the partial upload.
#[derive(Debug)]
pub struct PendingFile {
    path: PathBuf,
    committed: bool,
}

impl PendingFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file; the upload reached its durability point.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Failed to roll back aborted upload"
                    );
                }
            } else {
                tracing::debug!(path = %self.path.display(), "Rolled back aborted upload");
            }
        }
    }
}

/// Local filesystem storage implementation.
#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    /// Open (or initialize) a store rooted at `config.root`.
    ///
    /// Directory creation is create-if-absent, so concurrent instances may
    /// start against the same root.
    pub async fn open(config: StoreConfig) -> StorageResult<Self> {
        let root = config.root;

        for dir in [
            Category::Image.dir_name(),
            Category::Video.dir_name(),
            Category::Document.dir_name(),
            THUMBNAILS_DIR,
            TEMP_DIR,
        ] {
            let path = root.join(dir);
            fs::create_dir_all(&path).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        tracing::info!(root = %root.display(), "Media store initialized");

        Ok(MediaStore {
            root,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Reject names that could resolve outside the storage tree.
    fn checked_name(name: &str) -> StorageResult<&str> {
        if name.is_empty()
            || name.contains("..")
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(StorageError::InvalidName(
                "Storage name contains invalid characters".to_string(),
            ));
        }
        Ok(name)
    }

    fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Resolve an asset path under its category directory.
    pub fn asset_path(&self, category: Category, name: &str) -> StorageResult<PathBuf> {
        Ok(self.category_dir(category).join(Self::checked_name(name)?))
    }

    /// Resolve a thumbnail path under the thumbnails directory.
    pub fn thumbnail_path(&self, name: &str) -> StorageResult<PathBuf> {
        Ok(self.root.join(THUMBNAILS_DIR).join(Self::checked_name(name)?))
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join(TEMP_DIR)
    }

    /// Public URL for a stored asset.
    pub fn url_for(&self, category: Category, name: &str) -> String {
        format!("{}/media/{}/{}", self.base_url, category.dir_name(), name)
    }

    pub fn thumbnail_url(&self, name: &str) -> String {
        format!("{}/media/{}/{}", self.base_url, THUMBNAILS_DIR, name)
    }

    /// Write the original bytes of an upload. Once this returns, the
    /// original is recoverable even if later processing fails; the returned
    /// guard must be committed to keep it past the request.
    pub async fn write_original(
        &self,
        category: Category,
        name: &str,
        data: &[u8],
    ) -> StorageResult<PendingFile> {
        let path = self.asset_path(category, name)?;
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            category = %category,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Original persisted"
        );

        Ok(PendingFile {
            path,
            committed: false,
        })
    }

    /// Atomically replace a stored asset with its processed bytes.
    ///
    /// Writes to the temp area first, then renames over the original, so a
    /// crash mid-write never leaves a partial file at the asset path.
    pub async fn replace_with_processed(
        &self,
        category: Category,
        name: &str,
        data: &[u8],
    ) -> StorageResult<()> {
        let final_path = self.asset_path(category, name)?;
        let staging_path = self
            .temp_dir()
            .join(format!("{}.{}.part", name, Uuid::new_v4()));

        let mut file = fs::File::create(&staging_path).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create staging file {}: {}",
                staging_path.display(),
                e
            ))
        })?;

        let write_result = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = write_result {
            let _ = fs::remove_file(&staging_path).await;
            return Err(StorageError::WriteFailed(format!(
                "Failed to write staging file {}: {}",
                staging_path.display(),
                e
            )));
        }

        if let Err(e) = fs::rename(&staging_path, &final_path).await {
            // The durable original stays in place; the caller reports this
            // as a storage failure for this file only.
            let _ = fs::remove_file(&staging_path).await;
            return Err(StorageError::WriteFailed(format!(
                "Failed to swap processed file into {}: {}",
                final_path.display(),
                e
            )));
        }

        tracing::info!(
            path = %final_path.display(),
            size_bytes = data.len(),
            "Processed bytes swapped in"
        );

        Ok(())
    }

    /// Write a thumbnail under the thumbnails directory.
    pub async fn write_thumbnail(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.thumbnail_path(name)?;
        fs::write(&path, data).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to write thumbnail {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::debug!(path = %path.display(), size_bytes = data.len(), "Thumbnail written");
        Ok(())
    }

    pub async fn read(&self, category: Category, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.asset_path(category, name)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(name.to_string()));
        }
        fs::read(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    pub async fn exists(&self, category: Category, name: &str) -> StorageResult<bool> {
        let path = self.asset_path(category, name)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    /// Size and timestamps for a stored asset.
    pub async fn stat(&self, category: Category, name: &str) -> StorageResult<AssetStat> {
        let path = self.asset_path(category, name)?;
        let meta = fs::metadata(&path)
            .await
            .map_err(|_| StorageError::NotFound(name.to_string()))?;

        let modified_at = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let created_at = meta
            .created()
            .map(DateTime::<Utc>::from)
            .unwrap_or(modified_at);

        Ok(AssetStat {
            size: meta.len(),
            created_at,
            modified_at,
        })
    }

    /// Delete an asset and its thumbnail sibling. A missing primary file is
    /// an error (404 at the HTTP layer), a missing thumbnail is not.
    pub async fn delete(&self, category: Category, name: &str) -> StorageResult<()> {
        let path = self.asset_path(category, name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(name.to_string()));
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        let thumb = self.thumbnail_path(&thumbnail_name(name))?;
        match fs::remove_file(&thumb).await {
            Ok(()) => {
                tracing::debug!(path = %thumb.display(), "Thumbnail deleted");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %thumb.display(), error = %e, "Failed to delete thumbnail");
            }
        }

        tracing::info!(path = %path.display(), category = %category, "Asset deleted");
        Ok(())
    }

    /// Remove temp-area entries whose last modification is older than
    /// `max_age`. Returns the number of entries removed.
    pub async fn sweep_temp(&self, max_age: Duration) -> StorageResult<usize> {
        let temp = self.temp_dir();
        let mut removed = 0usize;

        let mut entries = fs::read_dir(&temp).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }

            let stale = meta
                .modified()
                .ok()
                .and_then(|m| m.elapsed().ok())
                .map(|age| age >= max_age)
                .unwrap_or(false);

            if stale {
                match fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to sweep temp file");
                    }
                }
            }
        }

        tracing::info!(removed, max_age_secs = max_age.as_secs(), "Temp sweep completed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_store() -> (tempfile::TempDir, MediaStore) {
        let dir = tempdir().unwrap();
        let store = MediaStore::open(StoreConfig {
            root: dir.path().to_path_buf(),
            base_url: "http://localhost:4000".to_string(),
        })
        .await
        .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let dir = tempdir().unwrap();
        let config = StoreConfig {
            root: dir.path().to_path_buf(),
            base_url: "http://localhost:4000".to_string(),
        };
        MediaStore::open(config.clone()).await.unwrap();
        MediaStore::open(config).await.unwrap();
        assert!(dir.path().join("images").is_dir());
        assert!(dir.path().join("tmp").is_dir());
    }

    #[tokio::test]
    async fn test_write_commit_read_roundtrip() {
        let (_dir, store) = test_store().await;
        let pending = store
            .write_original(Category::Document, "doc.pdf", b"content")
            .await
            .unwrap();
        pending.commit();

        let data = store.read(Category::Document, "doc.pdf").await.unwrap();
        assert_eq!(data, b"content");
    }

    #[tokio::test]
    async fn test_uncommitted_write_is_rolled_back() {
        let (_dir, store) = test_store().await;
        {
            let _pending = store
                .write_original(Category::Image, "img.png", b"partial")
                .await
                .unwrap();
            // dropped without commit
        }
        assert!(!store.exists(Category::Image, "img.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_traversal_names_rejected() {
        let (_dir, store) = test_store().await;
        assert!(matches!(
            store.read(Category::Image, "../etc/passwd").await,
            Err(StorageError::InvalidName(_))
        ));
        assert!(matches!(
            store.delete(Category::Image, "a/b.png").await,
            Err(StorageError::InvalidName(_))
        ));
        assert!(store.asset_path(Category::Image, "").is_err());
    }

    #[tokio::test]
    async fn test_replace_swaps_content() {
        let (_dir, store) = test_store().await;
        store
            .write_original(Category::Image, "a.png", b"original")
            .await
            .unwrap()
            .commit();

        store
            .replace_with_processed(Category::Image, "a.png", b"processed")
            .await
            .unwrap();

        let data = store.read(Category::Image, "a.png").await.unwrap();
        assert_eq!(data, b"processed");
        // no staging leftovers
        let mut entries = tokio::fs::read_dir(store.temp_dir()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_asset_and_thumbnail() {
        let (_dir, store) = test_store().await;
        store
            .write_original(Category::Image, "b.png", b"img")
            .await
            .unwrap()
            .commit();
        store.write_thumbnail("b.jpg", b"thumb").await.unwrap();

        store.delete(Category::Image, "b.png").await.unwrap();
        assert!(!store.exists(Category::Image, "b.png").await.unwrap());
        assert!(!tokio::fs::try_exists(store.thumbnail_path("b.jpg").unwrap())
            .await
            .unwrap());

        // second delete is NotFound, not a silent success
        assert!(matches!(
            store.delete(Category::Image, "b.png").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sweep_temp_zero_age_removes_everything() {
        let (_dir, store) = test_store().await;
        tokio::fs::write(store.temp_dir().join("stale1.part"), b"x")
            .await
            .unwrap();
        tokio::fs::write(store.temp_dir().join("stale2.part"), b"y")
            .await
            .unwrap();

        let removed = store.sweep_temp(Duration::ZERO).await.unwrap();
        assert_eq!(removed, 2);

        let removed_again = store.sweep_temp(Duration::ZERO).await.unwrap();
        assert_eq!(removed_again, 0);
    }

    #[tokio::test]
    async fn test_sweep_temp_keeps_fresh_files() {
        let (_dir, store) = test_store().await;
        tokio::fs::write(store.temp_dir().join("fresh.part"), b"x")
            .await
            .unwrap();

        let removed = store.sweep_temp(Duration::from_secs(3600)).await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_urls() {
        let (_dir, store) = test_store().await;
        assert_eq!(
            store.url_for(Category::Video, "v.mp4"),
            "http://localhost:4000/media/videos/v.mp4"
        );
        assert_eq!(
            store.thumbnail_url("v.jpg"),
            "http://localhost:4000/media/thumbnails/v.jpg"
        );
    }
}
