//! Memorization progress book
//!
//! Tracks which verses of each chapter are memorized and which have been
//! recited for review. Persisted as a JSON file, written atomically
//! (temp file + rename).

use crate::catalog::{self, TOTAL_VERSES};
use crate::persist;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Which flag a toggle affects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    Memorized,
    Recited,
}

/// Progress within one chapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterProgress {
    pub memorized: BTreeSet<u16>,
    pub recited: BTreeSet<u16>,
}

impl ChapterProgress {
    fn is_empty(&self) -> bool {
        self.memorized.is_empty() && self.recited.is_empty()
    }
}

/// Summary row for one chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub chapter_id: u16,
    pub name: String,
    pub memorized: usize,
    pub recited: usize,
    pub verse_count: u16,
    pub is_complete: bool,
}

/// Per-chapter memorized/recited verse sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressBook {
    chapters: BTreeMap<u16, ChapterProgress>,
}

impl ProgressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing file yields an empty book
    pub fn load(path: &Path) -> Result<Self> {
        persist::load_json(path)
    }

    /// Write to `path` via a temporary sibling file
    pub fn save(&self, path: &Path) -> Result<()> {
        persist::save_json(self, path)
    }

    /// Flip one flag for one verse; returns the new value
    pub fn toggle(&mut self, chapter_id: u16, verse: u16, kind: ProgressKind) -> Result<bool> {
        let chapter = catalog::chapter(chapter_id)?;
        if !chapter.contains(verse) {
            return Err(Error::InvalidInput(format!(
                "{} has no verse {}",
                chapter.name, verse
            )));
        }

        let entry = self.chapters.entry(chapter_id).or_default();
        let set = match kind {
            ProgressKind::Memorized => &mut entry.memorized,
            ProgressKind::Recited => &mut entry.recited,
        };
        let now_set = if set.remove(&verse) {
            false
        } else {
            set.insert(verse);
            true
        };

        if entry.is_empty() {
            self.chapters.remove(&chapter_id);
        }
        Ok(now_set)
    }

    /// Flags recorded for one chapter (empty if none)
    pub fn chapter(&self, chapter_id: u16) -> ChapterProgress {
        self.chapters.get(&chapter_id).cloned().unwrap_or_default()
    }

    pub fn is_memorized(&self, chapter_id: u16, verse: u16) -> bool {
        self.chapters
            .get(&chapter_id)
            .is_some_and(|c| c.memorized.contains(&verse))
    }

    pub fn is_recited(&self, chapter_id: u16, verse: u16) -> bool {
        self.chapters
            .get(&chapter_id)
            .is_some_and(|c| c.recited.contains(&verse))
    }

    /// Total memorized verses across all chapters
    pub fn memorized_total(&self) -> usize {
        self.chapters.values().map(|c| c.memorized.len()).sum()
    }

    /// Memorized share of the whole Quran, in percent
    pub fn percent_memorized(&self) -> f64 {
        self.memorized_total() as f64 * 100.0 / f64::from(TOTAL_VERSES)
    }

    /// One row per chapter with any recorded progress, in chapter order
    pub fn summaries(&self) -> Vec<ChapterSummary> {
        self.chapters
            .iter()
            .filter_map(|(&id, progress)| {
                let info = catalog::chapter(id).ok()?;
                Some(ChapterSummary {
                    chapter_id: id,
                    memorized: progress.memorized.len(),
                    recited: progress.recited.len(),
                    is_complete: progress.memorized.len() == usize::from(info.verse_count),
                    verse_count: info.verse_count,
                    name: info.name,
                })
            })
            .collect()
    }
}
