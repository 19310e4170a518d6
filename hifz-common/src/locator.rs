//! Audio locator resolution
//!
//! Maps (chapter, verse) to the URI of a per-verse recitation file. Pure; no I/O.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default per-verse recitation archive (Mishary Alafasy, 128 kbps)
pub const DEFAULT_RECITATION_BASE_URL: &str = "https://everyayah.com/data/Alafasy_128kbps";

/// URI of one playable recitation file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioLocator(String);

impl AudioLocator {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recitation archive laid out as `{base}/{chapter:03}{verse:03}.mp3`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecitationSource {
    base_url: String,
}

impl RecitationSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Locator for one verse of one chapter
    pub fn locate(&self, chapter_id: u16, verse: u16) -> AudioLocator {
        AudioLocator(format!("{}/{:03}{:03}.mp3", self.base_url, chapter_id, verse))
    }
}

impl Default for RecitationSource {
    fn default() -> Self {
        Self::new(DEFAULT_RECITATION_BASE_URL)
    }
}
