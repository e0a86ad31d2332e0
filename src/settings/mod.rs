/// Home page settings
///
/// The editor keeps the operator's working copy, the reconciler turns an
/// edited image layout plus freshly attached files into a final URL list,
/// and the service persists the result and revalidates cached pages.

pub mod editor;
pub mod layout;
pub mod models;
pub mod reconciler;
pub mod repository;
pub mod service;

pub use editor::{EditorState, ImageSlot, MoveDirection, Notice, SettingsEditor};
pub use layout::LayoutEntry;
pub use models::*;
pub use repository::HomeSettingsRepository;
pub use service::{HomeSettingsAction, HomeSettingsService};
