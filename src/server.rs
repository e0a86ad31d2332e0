/// HTTP server setup and routing
use crate::{
    config::UploadLimits,
    context::AppContext,
    error::{SiteError, SiteResult},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Room for form text fields on top of the image payload
const FORM_OVERHEAD: usize = 1024 * 1024;

/// Number of full-size images one settings submit is sized for
const MAX_IMAGES_PER_SUBMIT: usize = 10;

/// Build the main application router
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let body_limit = request_body_limit(&ctx.config.uploads);

    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .merge(crate::api::routes())
        // Provide state - converts Router<AppContext> to Router<()>
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

/// Largest accepted request body for a settings submit
fn request_body_limit(limits: &UploadLimits) -> usize {
    limits
        .max_image_size
        .saturating_mul(MAX_IMAGES_PER_SUBMIT)
        .saturating_add(FORM_OVERHEAD)
}

/// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> SiteResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("Corp site backend listening on {}", addr);
    info!("   Public URL: {}", ctx.service_url());

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SiteError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| SiteError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
