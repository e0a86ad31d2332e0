/// Rendered page cache
///
/// Holds the rendered page model for a named path until it expires or is
/// explicitly revalidated after a content write. Entries are stored as JSON
/// so any serializable page model can be cached.
///
/// Every path carries a generation that `revalidate_path` bumps. A reader
/// takes the generation before loading the data it renders and hands it back
/// to `put`; if a revalidation happened in between, the render is discarded
/// instead of overwriting the invalidation with stale content.
use crate::error::SiteResult;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Paths that render home settings content
pub mod paths {
    pub const PUBLIC_HOME: &str = "/";
    pub const ADMIN_HOME_SETTINGS: &str = "/admin/settings/home";
}

struct CachedPage {
    body: String,
    stored_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CachedPage>,
    generations: HashMap<String, u64>,
}

impl CacheState {
    fn generation(&self, path: &str) -> u64 {
        self.generations.get(path).copied().unwrap_or_default()
    }
}

/// In-process page cache keyed by request path
pub struct PageCache {
    state: RwLock<CacheState>,
    ttl: Duration,
}

impl PageCache {
    /// Create a new page cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            ttl,
        }
    }

    /// Get a cached page model
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let state = self.state.read().await;

        let Some(entry) = state.entries.get(path) else {
            debug!("Page cache MISS: {}", path);
            return None;
        };

        if entry.stored_at.elapsed() >= self.ttl {
            debug!("Page cache STALE: {}", path);
            return None;
        }

        match serde_json::from_str(&entry.body) {
            Ok(value) => {
                debug!("Page cache HIT: {}", path);
                Some(value)
            }
            Err(e) => {
                warn!("Failed to deserialize cached page {}: {}", path, e);
                None
            }
        }
    }

    /// Current generation of a path; take it before loading page data
    pub async fn generation(&self, path: &str) -> u64 {
        self.state.read().await.generation(path)
    }

    /// Store a page model rendered at `generation`
    ///
    /// Returns `false` and stores nothing when the path was revalidated
    /// after `generation` was taken.
    pub async fn put<T: Serialize>(&self, path: &str, generation: u64, value: &T) -> SiteResult<bool> {
        let body = serde_json::to_string(value)?;

        let mut state = self.state.write().await;
        if state.generation(path) != generation {
            debug!("Page cache SKIP: {} was revalidated during render", path);
            return Ok(false);
        }

        state.entries.insert(
            path.to_string(),
            CachedPage {
                body,
                stored_at: Instant::now(),
            },
        );

        debug!("Page cache SET: {}", path);
        Ok(true)
    }

    /// Drop the cached render of a path so the next read re-fetches
    pub async fn revalidate_path(&self, path: &str) -> bool {
        let mut state = self.state.write().await;
        *state.generations.entry(path.to_string()).or_default() += 1;
        let removed = state.entries.remove(path).is_some();

        info!("Revalidated page {} (cached: {})", path, removed);
        removed
    }

    /// Number of cached pages, stale ones included
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}
