//! HTTP request handlers
//!
//! REST endpoints for the catalog, practice control, progress book and
//! enrichment. Practice commands go through the practice service handle;
//! every other endpoint works on shared state directly.

use crate::api::server::AppContext;
use crate::error::Error;
use crate::playback::PracticeStatus;
use crate::practice::config_store::ConfigUpdate;
use crate::practice::schedule::{schedule, total_plays, unit_label};
use crate::services::Enrichment;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hifz_common::catalog::{self, ChapterInfo, JuzInfo};
use hifz_common::events::{HifzEvent, SessionSnapshot};
use hifz_common::progress::{ChapterProgress, ChapterSummary, ProgressKind};
use hifz_common::quran::{Chapter, TajweedRule, Word};
use hifz_common::reviews::PastReview;
use hifz_common::session::{Phase, PracticeMethod};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub built_at: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub speed: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpeedResponse {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct ChapterRequest {
    pub chapter_id: u16,
}

/// One play of the session preview
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduledPlay {
    pub index: u32,
    pub verse: u16,
    /// Chain method only
    pub phase: Option<Phase>,
    pub repeat: u32,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub chapter_id: u16,
    pub total_plays: u32,
    pub plays: Vec<ScheduledPlay>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub memorized_total: usize,
    pub percent_memorized: f64,
    pub chapters: Vec<ChapterSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerseProgressResponse {
    pub chapter_id: u16,
    pub verse: u16,
    pub memorized: bool,
    pub recited: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerseTextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub audio_base64: String,
    pub verse_text: String,
    pub chapter_name: String,
    /// Verse number within the chapter, kept in the review history
    pub verse: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioRequest {
    pub audio_base64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TipsResponse {
    pub chapter_id: u16,
    pub tips: String,
}

type ApiError = (StatusCode, Json<StatusResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// HTTP status for an error
pub fn status_code(err: &Error) -> StatusCode {
    match err {
        Error::InvalidConfig(_) | Error::Common(hifz_common::Error::InvalidInput(_)) => {
            StatusCode::BAD_REQUEST
        }
        Error::Common(hifz_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
        Error::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Provider(_) | Error::Enrichment(_) | Error::PlaybackFailed { .. } => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: Error) -> ApiError {
    let status = status_code(&err);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", err),
        }),
    )
}

fn chapter_info(chapter_id: u16) -> Result<ChapterInfo, ApiError> {
    catalog::chapter(chapter_id).map_err(|e| api_error(e.into()))
}

fn enrichment(ctx: &AppContext) -> Result<Arc<dyn Enrichment>, ApiError> {
    ctx.enrichment.clone().ok_or_else(|| {
        api_error(Error::ServiceUnavailable(
            "enrichment is disabled (no API key configured)".to_string(),
        ))
    })
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "hifz-ap".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("HIFZ_GIT_HASH").to_string(),
        built_at: env!("HIFZ_BUILT_AT").to_string(),
        port: ctx.port,
    })
}

// ============================================================================
// Catalog Endpoints
// ============================================================================

/// GET /chapters - All 114 chapters with verse counts
pub async fn list_chapters() -> Json<Vec<ChapterInfo>> {
    Json(catalog::chapters().collect())
}

/// GET /chapters/:chapter_id - Chapter text and translations from the provider
pub async fn get_chapter(
    State(ctx): State<AppContext>,
    Path(chapter_id): Path<u16>,
) -> ApiResult<Chapter> {
    chapter_info(chapter_id)?;
    let chapter = ctx
        .provider
        .get_chapter(chapter_id)
        .await
        .map_err(api_error)?;
    Ok(Json(chapter))
}

/// GET /juz - Starting chapter and verse of each juz
pub async fn list_juz() -> Json<Vec<JuzInfo>> {
    Json(catalog::juz().collect())
}

// ============================================================================
// Practice Endpoints
// ============================================================================

/// GET /practice - Current parameters and running session
pub async fn get_practice(State(ctx): State<AppContext>) -> ApiResult<PracticeStatus> {
    ctx.practice.status().await.map(Json).map_err(api_error)
}

/// POST /practice/start - Start a session from the current parameters
pub async fn start_practice(State(ctx): State<AppContext>) -> ApiResult<SessionSnapshot> {
    let snapshot = ctx.practice.start().await.map_err(api_error)?;
    info!("Practice started via API: session {}", snapshot.session_id);
    Ok(Json(snapshot))
}

/// POST /practice/stop - Stop the running session (no-op when idle)
pub async fn stop_practice(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.practice.stop().await.map_err(api_error)?;
    Ok(Json(StatusResponse {
        status: "stopped".to_string(),
    }))
}

/// PUT /practice/config - Partial update of range, method, repeats, speed
pub async fn update_config(
    State(ctx): State<AppContext>,
    Json(update): Json<ConfigUpdate>,
) -> ApiResult<PracticeStatus> {
    ctx.practice
        .update_config(update)
        .await
        .map(Json)
        .map_err(api_error)
}

/// PUT /practice/speed - Change reciter speed without stopping
pub async fn set_speed(
    State(ctx): State<AppContext>,
    Json(request): Json<SpeedRequest>,
) -> ApiResult<SpeedResponse> {
    ctx.practice.set_speed(request.speed).await.map_err(api_error)?;
    Ok(Json(SpeedResponse {
        speed: request.speed,
    }))
}

/// PUT /practice/chapter - Select a chapter (stops a running session)
pub async fn select_chapter(
    State(ctx): State<AppContext>,
    Json(request): Json<ChapterRequest>,
) -> ApiResult<PracticeStatus> {
    ctx.practice
        .select_chapter(request.chapter_id)
        .await
        .map(Json)
        .map_err(api_error)
}

/// GET /practice/schedule - Every play the current parameters produce, in order
pub async fn get_schedule(State(ctx): State<AppContext>) -> ApiResult<ScheduleResponse> {
    let status = ctx.practice.status().await.map_err(api_error)?;
    let config = status.config;

    let plays = schedule(&config)
        .zip(1u32..)
        .map(|(state, index)| ScheduledPlay {
            index,
            verse: state.current_verse,
            phase: match config.method {
                PracticeMethod::Chain => Some(state.phase),
                PracticeMethod::Standard => None,
            },
            repeat: state.current_loop + 1,
            label: unit_label(&state, &config),
        })
        .collect();

    Ok(Json(ScheduleResponse {
        chapter_id: status.chapter.id,
        total_plays: total_plays(&config),
        plays,
    }))
}

// ============================================================================
// Progress Endpoints
// ============================================================================

/// GET /progress - Overall memorization progress
pub async fn get_progress(State(ctx): State<AppContext>) -> Json<ProgressResponse> {
    let (memorized_total, percent_memorized, chapters) = ctx.progress.overview().await;
    Json(ProgressResponse {
        memorized_total,
        percent_memorized,
        chapters,
    })
}

/// GET /progress/:chapter_id - Memorized and recited verses of one chapter
pub async fn get_chapter_progress(
    State(ctx): State<AppContext>,
    Path(chapter_id): Path<u16>,
) -> ApiResult<ChapterProgress> {
    chapter_info(chapter_id)?;
    Ok(Json(ctx.progress.chapter(chapter_id).await))
}

/// POST /progress/:chapter_id/:verse/memorized - Toggle the memorized flag
pub async fn toggle_memorized(
    State(ctx): State<AppContext>,
    Path((chapter_id, verse)): Path<(u16, u16)>,
) -> ApiResult<VerseProgressResponse> {
    toggle(&ctx, chapter_id, verse, ProgressKind::Memorized).await
}

/// POST /progress/:chapter_id/:verse/recited - Toggle the recited flag
pub async fn toggle_recited(
    State(ctx): State<AppContext>,
    Path((chapter_id, verse)): Path<(u16, u16)>,
) -> ApiResult<VerseProgressResponse> {
    toggle(&ctx, chapter_id, verse, ProgressKind::Recited).await
}

async fn toggle(
    ctx: &AppContext,
    chapter_id: u16,
    verse: u16,
    kind: ProgressKind,
) -> ApiResult<VerseProgressResponse> {
    let flags = ctx
        .progress
        .toggle(chapter_id, verse, kind)
        .await
        .map_err(api_error)?;

    ctx.events.emit_lossy(HifzEvent::ProgressChanged {
        chapter_id,
        verse,
        memorized: flags.memorized,
        recited: flags.recited,
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(VerseProgressResponse {
        chapter_id,
        verse,
        memorized: flags.memorized,
        recited: flags.recited,
    }))
}

// ============================================================================
// Enrichment Endpoints
// ============================================================================

/// POST /enrich/words - Word-by-word gloss of a verse
pub async fn enrich_words(
    State(ctx): State<AppContext>,
    Json(request): Json<VerseTextRequest>,
) -> ApiResult<Vec<Word>> {
    let oracle = enrichment(&ctx)?;
    Ok(Json(oracle.word_by_word(&request.text).await))
}

/// POST /enrich/tajweed - Tajweed rules applying to a verse
pub async fn enrich_tajweed(
    State(ctx): State<AppContext>,
    Json(request): Json<VerseTextRequest>,
) -> ApiResult<Vec<TajweedRule>> {
    let oracle = enrichment(&ctx)?;
    Ok(Json(oracle.tajweed_rules(&request.text).await))
}

/// POST /enrich/feedback - Feedback on a recorded recitation
///
/// Successful feedback is appended to the review history together with the
/// recording. A failed history write is logged; the feedback is still returned.
pub async fn enrich_feedback(
    State(ctx): State<AppContext>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<FeedbackResponse> {
    let oracle = enrichment(&ctx)?;
    let feedback = oracle
        .recitation_feedback(&request.audio_base64, &request.verse_text, &request.chapter_name)
        .await
        .map_err(api_error)?;

    let review = PastReview::new(
        request.chapter_name,
        request.verse,
        feedback.clone(),
        request.audio_base64,
    );
    if let Err(e) = ctx.reviews.record(review).await {
        warn!("Failed to save review history: {}", e);
    }
    Ok(Json(FeedbackResponse { feedback }))
}

/// POST /enrich/transcribe - Transcribe a spoken search query
pub async fn enrich_transcribe(
    State(ctx): State<AppContext>,
    Json(request): Json<AudioRequest>,
) -> ApiResult<TranscriptionResponse> {
    let oracle = enrichment(&ctx)?;
    let text = oracle.transcribe(&request.audio_base64).await;
    Ok(Json(TranscriptionResponse { text }))
}

/// GET /enrich/tips/:chapter_id - Memorization tips for a chapter
pub async fn enrich_tips(
    State(ctx): State<AppContext>,
    Path(chapter_id): Path<u16>,
) -> ApiResult<TipsResponse> {
    let chapter = chapter_info(chapter_id)?;
    let oracle = enrichment(&ctx)?;
    let tips = oracle.hifz_tips(&chapter.name).await.map_err(api_error)?;
    Ok(Json(TipsResponse { chapter_id, tips }))
}

// ============================================================================
// Review History Endpoints
// ============================================================================

/// GET /reviews - Past recitation reviews, newest first
pub async fn list_reviews(State(ctx): State<AppContext>) -> Json<Vec<PastReview>> {
    Json(ctx.reviews.list().await)
}

/// GET /reviews/:review_id - One past review with its recording
pub async fn get_review(
    State(ctx): State<AppContext>,
    Path(review_id): Path<Uuid>,
) -> ApiResult<PastReview> {
    ctx.reviews.get(review_id).await.map(Json).ok_or_else(|| {
        api_error(Error::Common(hifz_common::Error::NotFound(format!(
            "review {}",
            review_id
        ))))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifz_common::AudioLocator;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            status_code(&Error::InvalidConfig("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_code(&Error::Common(hifz_common::Error::NotFound("x".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_code(&Error::ServiceUnavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_code(&Error::PlaybackFailed {
                locator: AudioLocator::new("x"),
                reason: "y".into()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_code(&Error::AudioOutput("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
