//! hifz-ap specific configuration
//!
//! Resolved from the shared TOML configuration plus command-line overrides.

use crate::error::{Error, Result};
use crate::practice::config_store::SessionConfigStore;
use hifz_common::catalog;
use hifz_common::config::{AudioConfig, EnrichmentConfig, PracticeDefaults, ProviderConfig, TomlConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Practice service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// tracing `EnvFilter` directive
    pub log_filter: String,
    pub audio: AudioConfig,
    pub provider: ProviderConfig,
    pub enrichment: EnrichmentConfig,
    pub progress_path: PathBuf,
    pub reviews_path: PathBuf,
    pub practice: PracticeDefaults,
}

impl Config {
    /// Apply command-line overrides to the loaded file
    pub fn from_toml(toml: TomlConfig, port_override: Option<u16>) -> Self {
        Self {
            port: port_override.unwrap_or(toml.server.port),
            log_filter: toml.logging.level,
            progress_path: toml.progress.resolve_path(),
            reviews_path: toml.progress.resolve_reviews_path(),
            audio: toml.audio,
            provider: toml.provider,
            enrichment: toml.enrichment,
            practice: toml.practice,
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider.timeout_ms)
    }

    /// Session parameters at startup: the default chapter, whole range
    pub fn initial_store(&self) -> Result<SessionConfigStore> {
        let chapter = catalog::chapter(self.practice.chapter)
            .map_err(|e| Error::Config(e.to_string()))?;
        SessionConfigStore::for_chapter(
            chapter,
            self.practice.method,
            self.practice.repeats,
            self.practice.speed,
        )
    }
}
