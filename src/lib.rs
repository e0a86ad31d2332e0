/// Corporate site backend
///
/// Admin API for the home page hero settings: editing state, image upload
/// reconciliation, settings persistence and public page revalidation.

pub mod api;
pub mod auth;
pub mod blob_store;
pub mod cache;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod server;
pub mod settings;

pub use context::AppContext;
pub use error::{SiteError, SiteResult};
