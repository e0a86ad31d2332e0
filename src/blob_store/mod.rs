/// Image Storage
///
/// Object storage for uploaded site images. The backend trait keeps the
/// storage medium swappable; `ImageStore` adds validation, key naming and
/// public URL resolution on top.

pub mod disk;
pub mod models;
pub mod store;

pub use models::*;
pub use store::{ImageStore, ImageStoreConfig};

use crate::error::SiteResult;
use async_trait::async_trait;

/// Blob storage backend trait
///
/// Implementations handle the actual storage and retrieval of object data
/// addressed by a slash-separated key.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Store an object under a key
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> SiteResult<()>;

    /// Retrieve an object by key
    async fn get(&self, key: &str) -> SiteResult<Option<Vec<u8>>>;

    /// Delete an object by key
    async fn delete(&self, key: &str) -> SiteResult<()>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> SiteResult<bool>;
}
