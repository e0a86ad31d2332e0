/// Public page data and image serving
use crate::{
    context::AppContext,
    error::{SiteError, SiteResult},
    settings::HomePage,
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

/// Build public routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/pages/home", get(get_home_page))
        .route("/images/*key", get(get_image))
}

/// Home page model for the public site
async fn get_home_page(State(ctx): State<AppContext>) -> SiteResult<Json<HomePage>> {
    Ok(Json(ctx.home_settings.home_page().await?))
}

/// Serve an uploaded image
///
/// Object keys embed a timestamp and random suffix, so content under a key
/// never changes and can be cached indefinitely.
async fn get_image(State(ctx): State<AppContext>, Path(key): Path<String>) -> SiteResult<Response> {
    let (data, content_type) = ctx
        .images
        .get(&key)
        .await?
        .ok_or_else(|| SiteError::NotFound(format!("Image not found: {}", key)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        data,
    )
        .into_response())
}
