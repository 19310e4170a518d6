//! HTTP server setup and routing
//!
//! Sets up the axum router for the practice control API and SSE.
//! Base URL: http://localhost:5750 (configurable)

use crate::error::{Error, Result};
use crate::playback::PracticeHandle;
use crate::services::{Enrichment, VerseProvider};
use crate::state::{ProgressStore, ReviewStore};
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post, put},
    Router,
};
use hifz_common::events::EventBus;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Recorded recitations arrive base64-encoded in JSON bodies
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub practice: PracticeHandle,
    pub events: EventBus,
    pub provider: Arc<dyn VerseProvider>,
    /// None when no enrichment API key is configured
    pub enrichment: Option<Arc<dyn Enrichment>>,
    pub progress: Arc<ProgressStore>,
    pub reviews: Arc<ReviewStore>,
    pub port: u16,
}

/// Build the application router
pub fn router(ctx: AppContext) -> Router {
    use super::{handlers, sse};

    Router::new()
        .route("/health", get(handlers::health))
        // Catalog
        .route("/chapters", get(handlers::list_chapters))
        .route("/chapters/:chapter_id", get(handlers::get_chapter))
        .route("/juz", get(handlers::list_juz))
        // Practice session
        .route("/practice", get(handlers::get_practice))
        .route("/practice/start", post(handlers::start_practice))
        .route("/practice/stop", post(handlers::stop_practice))
        .route("/practice/config", put(handlers::update_config))
        .route("/practice/speed", put(handlers::set_speed))
        .route("/practice/chapter", put(handlers::select_chapter))
        .route("/practice/schedule", get(handlers::get_schedule))
        // SSE event stream
        .route("/events", get(sse::event_stream))
        // Progress book
        .route("/progress", get(handlers::get_progress))
        .route("/progress/:chapter_id", get(handlers::get_chapter_progress))
        .route(
            "/progress/:chapter_id/:verse/memorized",
            post(handlers::toggle_memorized),
        )
        .route(
            "/progress/:chapter_id/:verse/recited",
            post(handlers::toggle_recited),
        )
        // Enrichment
        .route("/enrich/words", post(handlers::enrich_words))
        .route("/enrich/tajweed", post(handlers::enrich_tajweed))
        .route("/enrich/feedback", post(handlers::enrich_feedback))
        .route("/enrich/transcribe", post(handlers::enrich_transcribe))
        .route("/enrich/tips/:chapter_id", get(handlers::enrich_tips))
        // Recitation review history
        .route("/reviews", get(handlers::list_reviews))
        .route("/reviews/:review_id", get(handlers::get_review))
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API until `shutdown` resolves
pub async fn run(
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], ctx.port));
    let app = router(ctx);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
