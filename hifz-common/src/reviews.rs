//! Recitation review history
//!
//! Each successful recitation check is kept with the recording it judged so
//! the student can replay it later. Only the newest `MAX_REVIEWS` are kept;
//! recordings are large.

use crate::persist;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Reviews retained, newest first
pub const MAX_REVIEWS: usize = 10;

/// One judged recitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastReview {
    pub id: Uuid,
    pub chapter_name: String,
    pub verse: u16,
    pub feedback: String,
    pub timestamp: DateTime<Utc>,
    /// The recording that was reviewed (base64 audio/webm)
    pub audio_base64: String,
}

impl PastReview {
    pub fn new(
        chapter_name: impl Into<String>,
        verse: u16,
        feedback: impl Into<String>,
        audio_base64: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            chapter_name: chapter_name.into(),
            verse,
            feedback: feedback.into(),
            timestamp: Utc::now(),
            audio_base64: audio_base64.into(),
        }
    }
}

/// Capped, newest-first review list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewLog {
    reviews: Vec<PastReview>,
}

impl ReviewLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing file yields an empty log
    pub fn load(path: &Path) -> Result<Self> {
        let mut log: Self = persist::load_json(path)?;
        log.reviews.truncate(MAX_REVIEWS);
        Ok(log)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        persist::save_json(self, path)
    }

    /// Add `review` at the front, dropping the oldest beyond the cap
    pub fn record(&mut self, review: PastReview) {
        self.reviews.insert(0, review);
        self.reviews.truncate(MAX_REVIEWS);
    }

    pub fn reviews(&self) -> &[PastReview] {
        &self.reviews
    }

    pub fn get(&self, id: Uuid) -> Option<&PastReview> {
        self.reviews.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}
