/// Application context and dependency injection
use crate::{
    blob_store::{ImageStore, ImageStoreConfig},
    cache::PageCache,
    config::ServerConfig,
    db,
    error::SiteResult,
    settings::{HomeSettingsRepository, HomeSettingsService},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub images: Arc<ImageStore>,
    pub pages: Arc<PageCache>,
    pub home_settings: Arc<HomeSettingsService>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> SiteResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        Ok(Self::with_pool(config, db))
    }

    /// Wire services over an already migrated pool
    pub fn with_pool(config: ServerConfig, db: SqlitePool) -> Self {
        let images = Arc::new(ImageStore::new(ImageStoreConfig {
            location: config.storage.image_directory.clone(),
            public_url: config.service.public_url.clone(),
            limits: config.uploads.clone(),
        }));

        let pages = Arc::new(PageCache::new(Duration::from_secs(config.cache.ttl)));

        let home_settings = Arc::new(HomeSettingsService::new(
            HomeSettingsRepository::new(db.clone()),
            images.clone(),
            pages.clone(),
        ));

        Self {
            config: Arc::new(config),
            db,
            images,
            pages,
            home_settings,
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> SiteResult<()> {
        for dir in [&config.storage.data_directory, &config.storage.image_directory] {
            tokio::fs::create_dir_all(dir).await?;
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> &str {
        &self.config.service.public_url
    }
}
