//! Configuration loading
//!
//! Bootstrap configuration lives in a single TOML file. The file is located
//! using this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`~/.config/hifz/config.toml` on Linux)
//! 4. None: compiled defaults are used
//!
//! A missing or unreadable file never prevents startup; every field has a
//! built-in default.

use crate::locator::DEFAULT_RECITATION_BASE_URL;
use crate::session::{validate_repeats, validate_speed, PracticeMethod};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default HTTP port for hifz-ap
pub const DEFAULT_PORT: u16 = 5750;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "HIFZ_CONFIG";

/// Complete bootstrap configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub audio: AudioConfig,
    pub provider: ProviderConfig,
    pub enrichment: EnrichmentConfig,
    pub progress: ProgressConfig,
    pub practice: PracticeDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (trace, debug, info, warn, error, or a full EnvFilter string)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "hifz_ap=debug,tower_http=info".to_string(),
        }
    }
}

/// Audio playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Base URL of the per-verse recitation archive
    pub recitation_base_url: String,
    /// Upper bound on downloading and starting one verse
    pub acquire_timeout_ms: u64,
    /// Output device name (None = system default)
    pub device: Option<String>,
}

impl AudioConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            recitation_base_url: DEFAULT_RECITATION_BASE_URL.to_string(),
            acquire_timeout_ms: 15_000,
            device: None,
        }
    }
}

/// Verse text provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_base: String,
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.alquran.cloud/v1".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// LLM enrichment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// API key; enrichment endpoints are disabled when absent
    pub api_key: Option<String>,
    pub api_base: String,
    /// Model for text prompts
    pub model: String,
    /// Model for prompts carrying recorded audio
    pub audio_model: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            audio_model: "gemini-2.5-flash-native-audio-preview-12-2025".to_string(),
        }
    }
}

/// Progress book and review log locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// JSON file (None = platform data directory)
    pub path: Option<PathBuf>,
    /// Recitation review history (None = platform data directory)
    pub reviews_path: Option<PathBuf>,
}

impl ProgressConfig {
    /// Configured path, or `<data dir>/hifz/progress.json`
    pub fn resolve_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| data_dir().join("progress.json"))
    }

    /// Configured path, or `<data dir>/hifz/reviews.json`
    pub fn resolve_reviews_path(&self) -> PathBuf {
        self.reviews_path
            .clone()
            .unwrap_or_else(|| data_dir().join("reviews.json"))
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hifz"))
        .unwrap_or_else(|| PathBuf::from("./hifz_data"))
}

/// Initial session parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeDefaults {
    pub chapter: u16,
    pub method: PracticeMethod,
    pub repeats: u32,
    pub speed: f64,
}

impl Default for PracticeDefaults {
    fn default() -> Self {
        Self {
            chapter: 1,
            method: PracticeMethod::Chain,
            repeats: 3,
            speed: 1.0,
        }
    }
}

impl TomlConfig {
    /// Parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given and readable, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("No config file found, using built-in defaults");
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to load config {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Check values that TOML types alone cannot constrain
    pub fn validate(&self) -> Result<()> {
        if self.audio.acquire_timeout_ms == 0 {
            return Err(Error::Config("audio.acquire_timeout_ms must be positive".to_string()));
        }
        if crate::catalog::chapter(self.practice.chapter).is_err() {
            return Err(Error::Config(format!(
                "practice.chapter {} is not a chapter",
                self.practice.chapter
            )));
        }
        validate_repeats(self.practice.repeats).map_err(|e| Error::Config(e.to_string()))?;
        validate_speed(self.practice.speed).map_err(|e| Error::Config(e.to_string()))?;
        Ok(())
    }
}

/// Locate the config file: CLI argument, then environment, then platform default
///
/// Returns None when no candidate exists on disk.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|d| d.join("hifz").join("config.toml"))
        .filter(|p| p.exists())
}
