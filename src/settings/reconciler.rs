/// Image upload reconciliation
///
/// Uploads the files of a submit batch and merges their URLs back into the
/// positions the operator arranged. Upload completion order never affects the
/// result; the layout's order is authoritative.
use crate::{
    blob_store::{ImageStore, PendingFile, StoredImage},
    settings::LayoutEntry,
};
use futures::future::join_all;
use tracing::{debug, warn};

/// Object key prefix for home page images
pub const HOME_IMAGE_PREFIX: &str = "home";

/// Outcome of reconciling one submit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Final ordered image URLs to persist
    pub images: Vec<String>,
    /// Batch indices whose upload failed
    pub failed_uploads: Vec<usize>,
    /// Layout entries dropped because their placeholder did not resolve
    pub dropped_entries: usize,
    /// Object keys written by this submit, referenced or not
    pub uploaded_keys: Vec<String>,
}

/// Upload every file of a batch
///
/// The result is index-aligned with `files`; a failed upload is `None`.
pub async fn upload_batch(store: &ImageStore, prefix: &str, files: Vec<PendingFile>) -> Vec<Option<StoredImage>> {
    let uploads = files.into_iter().enumerate().map(|(index, file)| async move {
        let file_name = file.file_name.clone();
        match store.upload(prefix, index, file).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!("Upload of new image {} ({}) failed: {}", index, file_name, e);
                None
            }
        }
    });

    join_all(uploads).await
}

/// Resolve a layout against the uploaded URLs
///
/// Returns the ordered URL list and the number of entries that could not be
/// resolved.
pub fn assemble(layout: &[LayoutEntry], uploaded: &[Option<StoredImage>]) -> (Vec<String>, usize) {
    let mut images = Vec::with_capacity(layout.len());
    let mut dropped = 0;

    for entry in layout {
        match entry {
            LayoutEntry::Existing { url } => images.push(url.clone()),
            LayoutEntry::Pending { file_index } => {
                match uploaded.get(*file_index).and_then(|stored| stored.as_ref()) {
                    Some(stored) => images.push(stored.url.clone()),
                    None => {
                        warn!("Dropping image slot for unresolved file {}", file_index);
                        dropped += 1;
                    }
                }
            }
        }
    }

    (images, dropped)
}

/// Upload new files and produce the final list in layout order
pub async fn reconcile_layout(store: &ImageStore, layout: &[LayoutEntry], files: Vec<PendingFile>) -> Reconciliation {
    let referenced = layout
        .iter()
        .filter(|entry| matches!(entry, LayoutEntry::Pending { .. }))
        .count();
    if referenced != files.len() {
        debug!(
            "Layout references {} new images, batch holds {}",
            referenced,
            files.len()
        );
    }

    let uploaded = upload_batch(store, HOME_IMAGE_PREFIX, files).await;
    let (images, dropped_entries) = assemble(layout, &uploaded);

    Reconciliation {
        images,
        failed_uploads: failed_indices(&uploaded),
        dropped_entries,
        uploaded_keys: uploaded_keys(&uploaded),
    }
}

/// Deprecated fallback: keep `current` as-is and append uploads in batch order
pub async fn append_uploads(store: &ImageStore, current: Vec<String>, files: Vec<PendingFile>) -> Reconciliation {
    let uploaded = upload_batch(store, HOME_IMAGE_PREFIX, files).await;
    let failed_uploads = failed_indices(&uploaded);
    let uploaded_keys = uploaded_keys(&uploaded);

    let mut images = current;
    images.extend(uploaded.into_iter().flatten().map(|stored| stored.url));

    Reconciliation {
        images,
        dropped_entries: failed_uploads.len(),
        failed_uploads,
        uploaded_keys,
    }
}

/// Delete objects written by a submit whose settings write failed
///
/// Failures are logged and otherwise ignored.
pub async fn discard_uploads(store: &ImageStore, keys: &[String]) {
    let deletions = keys.iter().map(|key| async move {
        if let Err(e) = store.delete(key).await {
            warn!("Failed to delete orphaned image {}: {}", key, e);
        }
    });

    join_all(deletions).await;
    debug!("Discarded {} orphaned images", keys.len());
}

fn uploaded_keys(uploaded: &[Option<StoredImage>]) -> Vec<String> {
    uploaded.iter().flatten().map(|stored| stored.key.clone()).collect()
}

fn failed_indices<T>(uploaded: &[Option<T>]) -> Vec<usize> {
    uploaded
        .iter()
        .enumerate()
        .filter_map(|(index, url)| url.is_none().then_some(index))
        .collect()
}
