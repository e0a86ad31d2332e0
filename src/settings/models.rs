/// Home settings data models
use crate::{blob_store::PendingFile, settings::LayoutEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known primary key of the single home settings row
pub const HOME_SETTINGS_ID: i64 = 1;

/// Persisted home settings record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeSettings {
    pub id: i64,
    pub hero_headline: String,
    pub hero_subheadline: String,
    pub hero_images: Vec<String>,
    pub show_products_section: bool,
    /// Incremented on every write
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

/// Values written by a single upsert
#[derive(Debug, Clone, Default)]
pub struct HomeSettingsWrite {
    pub hero_headline: String,
    pub hero_subheadline: String,
    pub hero_images: Vec<String>,
    /// `None` keeps the stored value (or the default `true` on insert)
    pub show_products_section: Option<bool>,
    /// When set, the write only applies if the stored version matches
    pub expected_version: Option<i64>,
}

/// How the submitted image list is described
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSubmission {
    /// Ordered layout mixing existing URLs and pending file references
    Layout(Vec<LayoutEntry>),
    /// Deprecated form shape: kept URLs, with every uploaded file appended
    Appended(Vec<String>),
}

/// Everything one save of the settings form carries
#[derive(Debug, Clone)]
pub struct HomeSettingsSubmission {
    pub hero_headline: String,
    pub hero_subheadline: String,
    pub show_products_section: Option<bool>,
    pub expected_version: Option<i64>,
    pub images: ImageSubmission,
    /// Attached files, in the order their placeholders index them
    pub files: Vec<PendingFile>,
}

/// Public home page model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomePage {
    pub headline: String,
    pub subheadline: String,
    pub images: Vec<String>,
    pub show_products_section: bool,
}

impl From<Option<&HomeSettings>> for HomePage {
    fn from(settings: Option<&HomeSettings>) -> Self {
        match settings {
            Some(settings) => Self {
                headline: settings.hero_headline.clone(),
                subheadline: settings.hero_subheadline.clone(),
                images: settings.hero_images.clone(),
                show_products_section: settings.show_products_section,
            },
            None => Self {
                headline: String::new(),
                subheadline: String::new(),
                images: Vec::new(),
                show_products_section: true,
            },
        }
    }
}
