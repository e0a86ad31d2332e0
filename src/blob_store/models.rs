/// Image storage data models
use serde::{Deserialize, Serialize};

/// A file attached in the editor that has not been uploaded yet
#[derive(Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl PendingFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for PendingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size: i64,
}
