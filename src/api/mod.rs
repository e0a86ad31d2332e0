/// API routes and handlers
pub mod pages;
pub mod settings;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(pages::routes())
        .merge(settings::routes())
}
