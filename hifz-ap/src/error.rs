//! Error types for hifz-ap
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use hifz_common::AudioLocator;
use thiserror::Error;

/// Main error type for hifz-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected session parameter (range, method, repeats, speed)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Audio for a verse could not be acquired or started
    #[error("Playback failed for {locator}: {reason}")]
    PlaybackFailed {
        locator: AudioLocator,
        reason: String,
    },

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Verse provider (HTTP API) errors
    #[error("Verse provider error: {0}")]
    Provider(String),

    /// Enrichment oracle (LLM) errors
    #[error("Enrichment error: {0}")]
    Enrichment(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// A required collaborator is not configured or has shut down
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Errors from the shared library
    #[error(transparent)]
    Common(#[from] hifz_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map a shared-library validation error onto `InvalidConfig`
    pub fn invalid_config(err: hifz_common::Error) -> Self {
        match err {
            hifz_common::Error::InvalidInput(msg) => Error::InvalidConfig(msg),
            other => Error::Common(other),
        }
    }
}

/// Convenience Result type using hifz-ap Error
pub type Result<T> = std::result::Result<T, Error>;
