/// Disk-based blob storage backend
use crate::{
    blob_store::BlobBackend,
    error::{SiteError, SiteResult},
};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Disk storage backend
///
/// Stores objects on the local filesystem, mirroring the key's
/// slash-separated segments as directories.
#[derive(Clone)]
pub struct DiskBlobBackend {
    base_path: PathBuf,
}

impl DiskBlobBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the file path for a key
    ///
    /// Keys that are empty, absolute or contain `..` segments are rejected
    /// so a request path can never escape the base directory.
    fn get_object_path(&self, key: &str) -> SiteResult<PathBuf> {
        let relative = Path::new(key);
        let is_safe = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_safe {
            return Err(SiteError::Validation(format!("Invalid object key: {}", key)));
        }

        Ok(self.base_path.join(relative))
    }

    /// Ensure the directory for an object exists
    async fn ensure_object_dir(&self, key: &str) -> SiteResult<PathBuf> {
        let object_path = self.get_object_path(key)?;
        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                SiteError::BlobStorage(format!("Failed to create object directory: {}", e))
            })?;
        }
        Ok(object_path)
    }
}

#[async_trait]
impl BlobBackend for DiskBlobBackend {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> SiteResult<()> {
        let object_path = self.ensure_object_dir(key).await?;

        fs::write(&object_path, data)
            .await
            .map_err(|e| SiteError::BlobStorage(format!("Failed to write object {}: {}", key, e)))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> SiteResult<Option<Vec<u8>>> {
        let object_path = self.get_object_path(key)?;

        match fs::read(&object_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SiteError::BlobStorage(format!(
                "Failed to read object {}: {}",
                key, e
            ))),
        }
    }

    async fn delete(&self, key: &str) -> SiteResult<()> {
        let object_path = self.get_object_path(key)?;

        match fs::remove_file(&object_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SiteError::BlobStorage(format!(
                "Failed to delete object {}: {}",
                key, e
            ))),
        }
    }

    async fn exists(&self, key: &str) -> SiteResult<bool> {
        let object_path = self.get_object_path(key)?;
        Ok(fs::try_exists(&object_path).await.unwrap_or(false))
    }
}
