/// Image layout wire format
///
/// A layout is the ordered description of the image list at submit time.
/// Each entry is either an already stored image or a reference to the k-th
/// file of the accompanying upload batch.
use crate::error::{SiteError, SiteResult};
use serde::{Deserialize, Serialize};

/// Prefix of the string placeholders older form clients send
pub const LEGACY_PLACEHOLDER_PREFIX: &str = "new_file_";

/// One position in a submitted image layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutEntry {
    /// An image that is already stored
    Existing { url: String },
    /// The file at `file_index` in the submitted batch
    Pending { file_index: usize },
}

impl LayoutEntry {
    pub fn existing(url: impl Into<String>) -> Self {
        LayoutEntry::Existing { url: url.into() }
    }

    pub fn pending(file_index: usize) -> Self {
        LayoutEntry::Pending { file_index }
    }

    /// Interpret a plain string element
    ///
    /// `new_file_<k>` is a placeholder, anything else a URL. Blank strings and
    /// placeholders with an unparseable index carry no image and yield `None`.
    pub fn from_legacy_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        match token.strip_prefix(LEGACY_PLACEHOLDER_PREFIX) {
            Some(index) => match index.parse::<usize>() {
                Ok(file_index) => Some(LayoutEntry::pending(file_index)),
                Err(_) => {
                    tracing::warn!("Ignoring malformed layout placeholder {:?}", token);
                    None
                }
            },
            None => Some(LayoutEntry::existing(token)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireEntry {
    Tagged(LayoutEntry),
    Legacy(String),
}

/// Parse a JSON layout array
///
/// Elements may be tagged objects (`{"kind":"existing","url":..}`,
/// `{"kind":"pending","file_index":k}`) or legacy strings; both forms can be
/// mixed in one array.
pub fn parse_layout(json: &str) -> SiteResult<Vec<LayoutEntry>> {
    let entries: Vec<WireEntry> = serde_json::from_str(json)
        .map_err(|e| SiteError::Validation(format!("Invalid image layout: {}", e)))?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            WireEntry::Tagged(LayoutEntry::Existing { url }) => {
                let url = url.trim();
                (!url.is_empty()).then(|| LayoutEntry::existing(url))
            }
            WireEntry::Tagged(entry) => Some(entry),
            WireEntry::Legacy(token) => LayoutEntry::from_legacy_token(&token),
        })
        .collect())
}

/// Parse a JSON array of image URLs, dropping blanks
pub fn parse_url_list(json: &str) -> SiteResult<Vec<String>> {
    let urls: Vec<String> = serde_json::from_str(json)
        .map_err(|e| SiteError::Validation(format!("Invalid image list: {}", e)))?;

    Ok(urls
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect())
}
