/// Home settings save action
use crate::{
    blob_store::ImageStore,
    cache::{paths, PageCache},
    error::SiteResult,
    settings::{
        reconciler::{self, Reconciliation},
        HomePage, HomeSettings, HomeSettingsRepository, HomeSettingsSubmission, HomeSettingsWrite,
        ImageSubmission,
    },
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Entry point the settings form submits to
#[async_trait]
pub trait HomeSettingsAction: Send + Sync {
    async fn update_home_settings(&self, submission: HomeSettingsSubmission) -> SiteResult<HomeSettings>;
}

/// Orchestrates reconciliation, the settings write and page revalidation
#[derive(Clone)]
pub struct HomeSettingsService {
    repository: HomeSettingsRepository,
    images: Arc<ImageStore>,
    pages: Arc<PageCache>,
}

impl HomeSettingsService {
    pub fn new(repository: HomeSettingsRepository, images: Arc<ImageStore>, pages: Arc<PageCache>) -> Self {
        Self {
            repository,
            images,
            pages,
        }
    }

    /// Stored settings, if any
    pub async fn get(&self) -> SiteResult<Option<HomeSettings>> {
        self.repository.get().await
    }

    /// Public home page model, served from the page cache when fresh
    pub async fn home_page(&self) -> SiteResult<HomePage> {
        if let Some(page) = self.pages.get::<HomePage>(paths::PUBLIC_HOME).await {
            return Ok(page);
        }

        let generation = self.pages.generation(paths::PUBLIC_HOME).await;
        let settings = self.repository.get().await?;
        let page = HomePage::from(settings.as_ref());
        self.pages.put(paths::PUBLIC_HOME, generation, &page).await?;

        Ok(page)
    }

    /// Admin settings view, served from the page cache when fresh
    pub async fn admin_view(&self) -> SiteResult<Option<HomeSettings>> {
        if let Some(settings) = self
            .pages
            .get::<Option<HomeSettings>>(paths::ADMIN_HOME_SETTINGS)
            .await
        {
            return Ok(settings);
        }

        let generation = self.pages.generation(paths::ADMIN_HOME_SETTINGS).await;
        let settings = self.repository.get().await?;
        self.pages
            .put(paths::ADMIN_HOME_SETTINGS, generation, &settings)
            .await?;

        Ok(settings)
    }

    async fn reconcile(&self, submission: HomeSettingsSubmission) -> (HomeSettingsWrite, Reconciliation) {
        let reconciliation = match submission.images {
            ImageSubmission::Layout(layout) => {
                reconciler::reconcile_layout(&self.images, &layout, submission.files).await
            }
            ImageSubmission::Appended(current) => {
                warn!("Home settings submitted without a layout, appending new images");
                reconciler::append_uploads(&self.images, current, submission.files).await
            }
        };

        let write = HomeSettingsWrite {
            hero_headline: submission.hero_headline,
            hero_subheadline: submission.hero_subheadline,
            hero_images: reconciliation.images.clone(),
            show_products_section: submission.show_products_section,
            expected_version: submission.expected_version,
        };

        (write, reconciliation)
    }
}

#[async_trait]
impl HomeSettingsAction for HomeSettingsService {
    /// Upload new images, write the settings row, then revalidate pages
    ///
    /// A failed image upload only drops that image. A failed row write fails
    /// the whole call, deletes this submit's uploads and leaves caches
    /// untouched.
    async fn update_home_settings(&self, submission: HomeSettingsSubmission) -> SiteResult<HomeSettings> {
        let file_count = submission.files.len();
        let (write, reconciliation) = self.reconcile(submission).await;

        if !reconciliation.failed_uploads.is_empty() {
            warn!(
                "{} of {} new images failed to upload (batch indices {:?})",
                reconciliation.failed_uploads.len(),
                file_count,
                reconciliation.failed_uploads
            );
        }

        let settings = match self.repository.upsert(&write).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Home settings write failed, discarding {} uploaded images: {}",
                    reconciliation.uploaded_keys.len(),
                    e
                );
                reconciler::discard_uploads(&self.images, &reconciliation.uploaded_keys).await;
                return Err(e);
            }
        };

        self.pages.revalidate_path(paths::PUBLIC_HOME).await;
        self.pages.revalidate_path(paths::ADMIN_HOME_SETTINGS).await;

        info!(
            "Saved home settings v{} with {} images ({} uploaded)",
            settings.version,
            settings.hero_images.len(),
            file_count - reconciliation.failed_uploads.len()
        );

        Ok(settings)
    }
}
