/// Image Store Manager
///
/// Coordinates the blob backend with upload validation, object key naming
/// and public URL resolution.
use crate::{
    blob_store::{disk::DiskBlobBackend, BlobBackend, PendingFile, StoredImage},
    config::UploadLimits,
    error::{SiteError, SiteResult},
};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

/// Route prefix under which stored images are served
pub const IMAGE_ROUTE_PREFIX: &str = "/images";

/// Longest sanitized file name kept in an object key
const MAX_NAME_LEN: usize = 64;

/// Image store configuration
#[derive(Debug, Clone)]
pub struct ImageStoreConfig {
    /// Directory for the disk backend
    pub location: PathBuf,
    /// Base URL prepended to `/images/<key>`
    pub public_url: String,
    pub limits: UploadLimits,
}

/// Main image store manager
#[derive(Clone)]
pub struct ImageStore {
    public_url: String,
    limits: UploadLimits,
    backend: Arc<dyn BlobBackend>,
}

impl ImageStore {
    /// Create an image store backed by local disk
    pub fn new(config: ImageStoreConfig) -> Self {
        let backend = Arc::new(DiskBlobBackend::new(config.location.clone()));
        Self::with_backend(config, backend)
    }

    /// Create an image store over an arbitrary backend
    pub fn with_backend(config: ImageStoreConfig, backend: Arc<dyn BlobBackend>) -> Self {
        Self {
            public_url: config.public_url.trim_end_matches('/').to_string(),
            limits: config.limits,
            backend,
        }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Upload one file and return its public location
    ///
    /// `index` is the file's position in its batch; together with the
    /// millisecond timestamp and a random suffix it keeps keys unique even
    /// when two files in one batch share a name.
    pub async fn upload(&self, prefix: &str, index: usize, file: PendingFile) -> SiteResult<StoredImage> {
        let content_type = Self::resolve_content_type(&file)?;
        self.limits.check(file.size(), &content_type)?;

        let key = Self::object_key(prefix, index, &file.file_name);
        let size = file.size() as i64;

        self.backend.put(&key, file.data, &content_type).await?;

        tracing::info!("Stored image {} ({} bytes)", key, size);

        Ok(StoredImage {
            url: self.public_url(&key),
            key,
            content_type,
            size,
        })
    }

    /// Fetch a stored image with its sniffed content type
    pub async fn get(&self, key: &str) -> SiteResult<Option<(Vec<u8>, String)>> {
        let Some(data) = self.backend.get(key).await? else {
            return Ok(None);
        };

        let content_type = image::guess_format(&data)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string());

        Ok(Some((data, content_type)))
    }

    /// Delete a stored image
    pub async fn delete(&self, key: &str) -> SiteResult<()> {
        self.backend.delete(key).await
    }

    /// Build the public URL for a key, percent-encoding each segment
    pub fn public_url(&self, key: &str) -> String {
        let encoded = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        format!("{}{}/{}", self.public_url, IMAGE_ROUTE_PREFIX, encoded)
    }

    /// Build a collision-resistant object key
    ///
    /// Format: `<prefix>/<unix-millis>_<index>_<random8>_<sanitized-name>`
    pub fn object_key(prefix: &str, index: usize, file_name: &str) -> String {
        let stamp = Utc::now().timestamp_millis();
        let nonce = uuid::Uuid::new_v4().simple().to_string();

        format!(
            "{}/{}_{}_{}_{}",
            prefix.trim_matches('/'),
            stamp,
            index,
            &nonce[..8],
            sanitize_file_name(file_name)
        )
    }

    /// Determine the real content type from the file's magic bytes
    ///
    /// The declared type is only trusted for the error message; a file whose
    /// bytes are not a recognizable image is rejected.
    fn resolve_content_type(file: &PendingFile) -> SiteResult<String> {
        image::guess_format(&file.data)
            .map(|format| format.to_mime_type().to_string())
            .map_err(|_| {
                SiteError::Validation(format!(
                    "{} is not a recognized image (declared {})",
                    file.file_name, file.content_type
                ))
            })
    }
}

/// Reduce a client-supplied file name to a safe key segment
pub fn sanitize_file_name(file_name: &str) -> String {
    // Browsers on some platforms send the full client path
    let base = file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);

    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    // Leading dots would produce hidden files
    sanitized = sanitized.trim_start_matches('.').to_string();

    if sanitized.len() > MAX_NAME_LEN {
        sanitized = sanitized[sanitized.len() - MAX_NAME_LEN..].to_string();
    }

    if sanitized.is_empty() {
        "image".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn png_bytes() -> Vec<u8> {
        let mut data = PNG_MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 32]);
        data
    }

    fn test_store(dir: &std::path::Path) -> ImageStore {
        ImageStore::new(ImageStoreConfig {
            location: dir.to_path_buf(),
            public_url: "https://example.com/".to_string(),
            limits: UploadLimits::default(),
        })
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Hero Image.PNG"), "hero_image.png");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\공장.jpg"), "__.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "image");
        assert_eq!(sanitize_file_name(&"a".repeat(100)).len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_object_keys_are_unique_within_a_batch() {
        let first = ImageStore::object_key("home", 0, "same.png");
        let second = ImageStore::object_key("home", 0, "same.png");

        assert!(first.starts_with("home/"));
        assert!(first.contains("_0_"));
        assert!(first.ends_with("_same.png"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_public_url_encodes_segments() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());

        assert_eq!(
            store.public_url("home/a b.png"),
            "https://example.com/images/home/a%20b.png"
        );
    }

    #[tokio::test]
    async fn test_upload_and_get() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());

        let stored = store
            .upload("home", 2, PendingFile::new("Hero.png", "image/png", png_bytes()))
            .await
            .unwrap();

        assert_eq!(stored.content_type, "image/png");
        assert!(stored.key.ends_with("_hero.png"));
        assert!(stored.url.starts_with("https://example.com/images/home/"));

        let (data, content_type) = store.get(&stored.key).await.unwrap().unwrap();
        assert_eq!(data, png_bytes());
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());

        let result = store
            .upload("home", 0, PendingFile::new("notes.png", "image/png", b"plain text".to_vec()))
            .await;

        assert!(matches!(result, Err(SiteError::Validation(_))));
    }
}
