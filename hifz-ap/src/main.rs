//! Hifz Audio Practice (hifz-ap) - Main entry point
//!
//! Starts the practice service, the cpal audio backend and the HTTP/SSE
//! control API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use hifz_ap::api::{self, AppContext};
use hifz_ap::audio::CpalBackend;
use hifz_ap::config::Config;
use hifz_ap::playback::{AudioResourceController, PlaybackOrchestrator, PracticeService};
use hifz_ap::services::{AlQuranCloudClient, Enrichment, GeminiClient};
use hifz_ap::state::{ProgressStore, ReviewStore};
use hifz_common::config::{resolve_config_path, TomlConfig};
use hifz_common::events::EventBus;
use hifz_common::RecitationSource;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Event bus buffer per subscriber
const EVENT_BUS_CAPACITY: usize = 256;

/// Command-line arguments for hifz-ap
#[derive(Parser, Debug)]
#[command(name = "hifz-ap")]
#[command(about = "Audio practice service for Quran memorization")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "HIFZ_PORT")]
    port: Option<u16>,

    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG wins; otherwise the config file's level is applied once loaded
    let env_filter = EnvFilter::try_from_default_env().ok();
    let has_env_filter = env_filter.is_some();
    let (filter, filter_handle) = reload::Layer::new(
        env_filter.unwrap_or_else(|| EnvFilter::new("hifz_ap=debug,hifz_common=info,tower_http=info")),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let config = Config::from_toml(TomlConfig::load_or_default(config_path.as_deref()), args.port);
    if !has_env_filter {
        match EnvFilter::try_new(&config.log_filter) {
            Ok(filter) => {
                if let Err(e) = filter_handle.reload(filter) {
                    warn!("Failed to apply log level '{}': {}", config.log_filter, e);
                }
            }
            Err(e) => warn!("Invalid log level '{}': {}", config.log_filter, e),
        }
    }

    info!("Starting Hifz audio practice service on port {}", config.port);
    info!("Recitation audio: {}", config.audio.recitation_base_url);

    let http = reqwest::Client::builder()
        .user_agent(concat!("hifz-ap/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;

    let events = EventBus::new(EVENT_BUS_CAPACITY);

    // Practice engine
    let backend = CpalBackend::new(http.clone(), config.audio.device.clone());
    let (controller, controller_events) =
        AudioResourceController::new(backend, config.audio.acquire_timeout());
    let orchestrator = PlaybackOrchestrator::new(
        Arc::new(controller),
        RecitationSource::new(config.audio.recitation_base_url.clone()),
        events.clone(),
    );
    let store = config
        .initial_store()
        .context("Invalid practice defaults")?;
    let (practice, practice_task) =
        PracticeService::spawn(store, orchestrator, events.clone(), controller_events);
    info!("Practice service initialized");

    // Collaborators
    let provider = Arc::new(AlQuranCloudClient::new(
        http.clone(),
        config.provider.api_base.clone(),
        config.provider_timeout(),
    ));
    let enrichment = GeminiClient::from_config(http, &config.enrichment)
        .map(|client| Arc::new(client) as Arc<dyn Enrichment>);
    if enrichment.is_none() {
        info!("Enrichment disabled: no API key configured");
    }
    let progress = Arc::new(ProgressStore::open(config.progress_path.clone()));
    let reviews = Arc::new(ReviewStore::open(config.reviews_path.clone()));

    let ctx = AppContext {
        practice,
        events,
        provider,
        enrichment,
        progress,
        reviews,
        port: config.port,
    };

    api::run(ctx, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // Dropping the last handle (owned by the router) lets the service stop
    // its session and exit
    if let Err(e) = practice_task.await {
        warn!("Practice service task ended abnormally: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
