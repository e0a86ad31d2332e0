/// End-to-end tests for saving home settings through the service layer
use corp_site::{
    blob_store::{ImageStore, ImageStoreConfig, PendingFile},
    cache::PageCache,
    config::UploadLimits,
    db,
    settings::{
        HomeSettingsAction, HomeSettingsRepository, HomeSettingsService, HomeSettingsSubmission,
        ImageSubmission, LayoutEntry, MoveDirection, SettingsEditor,
    },
    SiteError,
};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const PUBLIC_URL: &str = "https://www.example.co.kr";

struct Harness {
    _dir: TempDir,
    pool: SqlitePool,
    image_dir: PathBuf,
    images: Arc<ImageStore>,
    service: HomeSettingsService,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::create_memory_pool().await.unwrap();
    let image_dir = dir.path().join("images");

    let images = Arc::new(ImageStore::new(ImageStoreConfig {
        location: image_dir.clone(),
        public_url: PUBLIC_URL.to_string(),
        limits: UploadLimits::default(),
    }));
    let pages = Arc::new(PageCache::new(Duration::from_secs(300)));
    let service = HomeSettingsService::new(HomeSettingsRepository::new(pool.clone()), images.clone(), pages);

    Harness {
        _dir: dir,
        pool,
        image_dir,
        images,
        service,
    }
}

/// Number of files stored under the image directory
fn stored_file_count(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };

    entries
        .map(|entry| entry.unwrap().path())
        .map(|path| if path.is_dir() { stored_file_count(&path) } else { 1 })
        .sum()
}

fn png(name: &str) -> PendingFile {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.extend_from_slice(name.as_bytes());
    PendingFile::new(name, "image/png", data)
}

fn submission(layout: Vec<LayoutEntry>, files: Vec<PendingFile>) -> HomeSettingsSubmission {
    HomeSettingsSubmission {
        hero_headline: "Precision presses since 1987".to_string(),
        hero_subheadline: "정밀 프레스 전문 기업".to_string(),
        show_products_section: None,
        expected_version: None,
        images: ImageSubmission::Layout(layout),
        files,
    }
}

/// Object key behind an uploaded image URL
fn key_of(url: &str) -> String {
    let prefix = format!("{}/images/", PUBLIC_URL);
    url.strip_prefix(&prefix)
        .expect("uploaded URL points at the image route")
        .to_string()
}

#[tokio::test]
async fn test_literal_layout_persists_in_order() {
    let h = harness().await;
    let layout = vec![
        LayoutEntry::existing("https://cdn/c.png"),
        LayoutEntry::existing("https://cdn/a.png"),
        LayoutEntry::existing("https://cdn/b.png"),
    ];

    let saved = h.service.update_home_settings(submission(layout, vec![])).await.unwrap();

    assert_eq!(
        saved.hero_images,
        vec!["https://cdn/c.png", "https://cdn/a.png", "https://cdn/b.png"]
    );
}

#[tokio::test]
async fn test_placeholders_resolve_to_batch_position() {
    let h = harness().await;
    let layout = vec![
        LayoutEntry::existing("https://cdn/a.png"),
        LayoutEntry::pending(0),
        LayoutEntry::existing("https://cdn/b.png"),
        LayoutEntry::pending(1),
    ];

    let saved = h
        .service
        .update_home_settings(submission(layout, vec![png("x.png"), png("y.png")]))
        .await
        .unwrap();

    assert_eq!(saved.hero_images.len(), 4);
    assert_eq!(saved.hero_images[0], "https://cdn/a.png");
    assert_eq!(saved.hero_images[2], "https://cdn/b.png");

    // Each uploaded URL serves the bytes of the matching file
    let (x, _) = h.images.get(&key_of(&saved.hero_images[1])).await.unwrap().unwrap();
    let (y, _) = h.images.get(&key_of(&saved.hero_images[3])).await.unwrap().unwrap();
    assert_eq!(x, png("x.png").data);
    assert_eq!(y, png("y.png").data);
}

#[tokio::test]
async fn test_empty_layout_clears_images() {
    let h = harness().await;
    h.service
        .update_home_settings(submission(vec![LayoutEntry::existing("https://cdn/a.png")], vec![]))
        .await
        .unwrap();

    let saved = h.service.update_home_settings(submission(vec![], vec![])).await.unwrap();

    assert!(saved.hero_images.is_empty());
    assert!(h.service.get().await.unwrap().unwrap().hero_images.is_empty());
}

#[tokio::test]
async fn test_failed_upload_does_not_abort_write() {
    let h = harness().await;
    let layout = vec![
        LayoutEntry::pending(0),
        LayoutEntry::existing("https://cdn/kept.png"),
        LayoutEntry::pending(1),
        LayoutEntry::pending(2),
    ];
    let broken = PendingFile::new("broken.png", "image/png", b"not really a png".to_vec());

    let saved = h
        .service
        .update_home_settings(submission(layout, vec![png("one.png"), broken, png("three.png")]))
        .await
        .unwrap();

    assert_eq!(saved.hero_images.len(), 3);
    assert!(saved.hero_images[0].ends_with("_one.png"));
    assert_eq!(saved.hero_images[1], "https://cdn/kept.png");
    assert!(saved.hero_images[2].ends_with("_three.png"));
}

#[tokio::test]
async fn test_resubmission_is_idempotent() {
    let h = harness().await;
    let layout = vec![
        LayoutEntry::existing("https://cdn/a.png"),
        LayoutEntry::existing("https://cdn/b.png"),
    ];

    let first = h
        .service
        .update_home_settings(submission(layout.clone(), vec![]))
        .await
        .unwrap();
    let second = h.service.update_home_settings(submission(layout, vec![])).await.unwrap();

    assert_eq!(first.hero_images, second.hero_images);
    assert_eq!(first.hero_headline, second.hero_headline);
    assert_eq!(first.id, second.id);
    assert_eq!(second.version, first.version + 1);
    assert!(second.updated_at >= first.updated_at);
}

#[tokio::test]
async fn test_first_save_inserts_then_updates() {
    let h = harness().await;
    assert!(h.service.get().await.unwrap().is_none());

    let created = h.service.update_home_settings(submission(vec![], vec![])).await.unwrap();
    let updated = h.service.update_home_settings(submission(vec![], vec![])).await.unwrap();

    assert_eq!(created.version, 1);
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.version, 2);
}

#[tokio::test]
async fn test_stale_version_is_rejected() {
    let h = harness().await;
    h.service.update_home_settings(submission(vec![], vec![])).await.unwrap();
    h.service.update_home_settings(submission(vec![], vec![])).await.unwrap();

    let mut stale = submission(vec![LayoutEntry::existing("https://cdn/z.png")], vec![]);
    stale.expected_version = Some(1);

    let result = h.service.update_home_settings(stale).await;
    assert!(matches!(result, Err(SiteError::Conflict(_))));
    assert!(h.service.get().await.unwrap().unwrap().hero_images.is_empty());
}

#[tokio::test]
async fn test_conflicted_save_leaves_no_uploaded_files() {
    let h = harness().await;
    h.service
        .update_home_settings(submission(vec![LayoutEntry::pending(0)], vec![png("first.png")]))
        .await
        .unwrap();
    h.service
        .update_home_settings(submission(vec![LayoutEntry::pending(0)], vec![png("second.png")]))
        .await
        .unwrap();
    assert_eq!(stored_file_count(&h.image_dir), 2);

    let mut stale = submission(vec![LayoutEntry::pending(0)], vec![png("late.png")]);
    stale.expected_version = Some(1);

    let result = h.service.update_home_settings(stale).await;
    assert!(matches!(result, Err(SiteError::Conflict(_))));
    assert_eq!(stored_file_count(&h.image_dir), 2);
}

#[tokio::test]
async fn test_failed_write_discards_uploads_and_keeps_cached_pages() {
    let h = harness().await;
    h.service
        .update_home_settings(submission(vec![LayoutEntry::existing("https://cdn/a.png")], vec![]))
        .await
        .unwrap();

    // Warm both cached pages
    let page = h.service.home_page().await.unwrap();
    let admin = h.service.admin_view().await.unwrap();

    h.pool.close().await;

    let result = h
        .service
        .update_home_settings(submission(vec![LayoutEntry::pending(0)], vec![png("lost.png")]))
        .await;
    assert!(matches!(result, Err(SiteError::Database(_))));
    assert_eq!(stored_file_count(&h.image_dir), 0);

    // Served from cache; the closed pool would fail any re-fetch
    assert_eq!(h.service.home_page().await.unwrap(), page);
    assert_eq!(h.service.admin_view().await.unwrap(), admin);
}

#[tokio::test]
async fn test_save_revalidates_admin_view() {
    let h = harness().await;
    h.service
        .update_home_settings(submission(vec![LayoutEntry::existing("https://cdn/a.png")], vec![]))
        .await
        .unwrap();

    let before = h.service.admin_view().await.unwrap().unwrap();
    assert_eq!(before.version, 1);

    let mut next = submission(vec![LayoutEntry::existing("https://cdn/b.png")], vec![]);
    next.hero_headline = "New headline".to_string();
    h.service.update_home_settings(next).await.unwrap();

    let after = h.service.admin_view().await.unwrap().unwrap();
    assert_eq!(after.version, 2);
    assert_eq!(after.hero_headline, "New headline");
    assert_eq!(after.hero_images, vec!["https://cdn/b.png"]);
}

#[tokio::test]
async fn test_appended_fallback_puts_uploads_last() {
    let h = harness().await;
    let mut legacy = submission(vec![], vec![png("new.png")]);
    legacy.images = ImageSubmission::Appended(vec!["https://cdn/old.png".to_string()]);

    let saved = h.service.update_home_settings(legacy).await.unwrap();

    assert_eq!(saved.hero_images.len(), 2);
    assert_eq!(saved.hero_images[0], "https://cdn/old.png");
    assert!(saved.hero_images[1].ends_with("_new.png"));
}

#[tokio::test]
async fn test_save_revalidates_public_page() {
    let h = harness().await;

    let before = h.service.home_page().await.unwrap();
    assert!(before.headline.is_empty());
    assert!(before.show_products_section);

    h.service.update_home_settings(submission(vec![], vec![])).await.unwrap();

    let after = h.service.home_page().await.unwrap();
    assert_eq!(after.headline, "Precision presses since 1987");
}

#[tokio::test]
async fn test_editor_round_trip() {
    let h = harness().await;
    h.service
        .update_home_settings(submission(
            vec![
                LayoutEntry::existing("https://cdn/a.png"),
                LayoutEntry::existing("https://cdn/b.png"),
            ],
            vec![],
        ))
        .await
        .unwrap();

    let stored = h.service.get().await.unwrap();
    let mut editor = SettingsEditor::load(stored.as_ref(), UploadLimits::default());
    editor.add_image(png("new.png")).unwrap();
    editor.move_image(2, MoveDirection::Left).unwrap();
    editor.move_image(0, MoveDirection::Right).unwrap();
    // new, a, b
    editor.set_hero_headline("Updated").unwrap();

    let saved = editor.submit(&h.service).await.unwrap();

    assert_eq!(saved.hero_headline, "Updated");
    assert_eq!(saved.hero_images.len(), 3);
    assert!(saved.hero_images[0].ends_with("_new.png"));
    assert_eq!(saved.hero_images[1], "https://cdn/a.png");
    assert_eq!(saved.hero_images[2], "https://cdn/b.png");

    // A fresh load shows server truth with no pending slots
    let reloaded = SettingsEditor::load(Some(&saved), UploadLimits::default());
    assert!(reloaded.slots().iter().all(|slot| !slot.is_new()));
}
