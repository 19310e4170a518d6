//! Shared progress state
//!
//! The progress book and review log are small and touched only by HTTP
//! handlers, so each lives behind an async `RwLock` and is written back to
//! disk after every change.

use crate::error::Result;
use hifz_common::progress::{ChapterProgress, ChapterSummary, ProgressBook, ProgressKind};
use hifz_common::reviews::{PastReview, ReviewLog};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Memorized / recited flags after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseFlags {
    pub memorized: bool,
    pub recited: bool,
}

/// Progress book with optional file persistence
pub struct ProgressStore {
    book: RwLock<ProgressBook>,
    /// None keeps progress in memory only
    path: Option<PathBuf>,
}

impl ProgressStore {
    /// Load the book from `path`
    ///
    /// A corrupt file is logged and replaced by an empty book on the next save.
    pub fn open(path: PathBuf) -> Self {
        let book = match ProgressBook::load(&path) {
            Ok(book) => {
                info!(
                    "Loaded progress from {} ({} verses memorized)",
                    path.display(),
                    book.memorized_total()
                );
                book
            }
            Err(e) => {
                warn!("Failed to load progress {}: {}; starting empty", path.display(), e);
                ProgressBook::new()
            }
        };
        Self {
            book: RwLock::new(book),
            path: Some(path),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            book: RwLock::new(ProgressBook::new()),
            path: None,
        }
    }

    /// Flip one flag and persist the book
    pub async fn toggle(&self, chapter_id: u16, verse: u16, kind: ProgressKind) -> Result<VerseFlags> {
        let mut book = self.book.write().await;
        book.toggle(chapter_id, verse, kind)?;
        if let Some(path) = &self.path {
            book.save(path)?;
        }
        Ok(VerseFlags {
            memorized: book.is_memorized(chapter_id, verse),
            recited: book.is_recited(chapter_id, verse),
        })
    }

    pub async fn chapter(&self, chapter_id: u16) -> ChapterProgress {
        self.book.read().await.chapter(chapter_id)
    }

    /// (memorized total, percent of the Quran, per-chapter rows)
    pub async fn overview(&self) -> (usize, f64, Vec<ChapterSummary>) {
        let book = self.book.read().await;
        (book.memorized_total(), book.percent_memorized(), book.summaries())
    }
}

/// Recitation review history with optional file persistence
pub struct ReviewStore {
    log: RwLock<ReviewLog>,
    path: Option<PathBuf>,
}

impl ReviewStore {
    pub fn open(path: PathBuf) -> Self {
        let log = match ReviewLog::load(&path) {
            Ok(log) => {
                info!("Loaded {} past reviews from {}", log.len(), path.display());
                log
            }
            Err(e) => {
                warn!("Failed to load reviews {}: {}; starting empty", path.display(), e);
                ReviewLog::new()
            }
        };
        Self {
            log: RwLock::new(log),
            path: Some(path),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            log: RwLock::new(ReviewLog::new()),
            path: None,
        }
    }

    pub async fn record(&self, review: PastReview) -> Result<()> {
        let mut log = self.log.write().await;
        log.record(review);
        if let Some(path) = &self.path {
            log.save(path)?;
        }
        Ok(())
    }

    /// Newest first
    pub async fn list(&self) -> Vec<PastReview> {
        self.log.read().await.reviews().to_vec()
    }

    pub async fn get(&self, id: Uuid) -> Option<PastReview> {
        self.log.read().await.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_toggle_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");

        let store = ProgressStore::open(path.clone());
        let flags = store.toggle(1, 2, ProgressKind::Memorized).await.unwrap();
        assert_eq!(
            flags,
            VerseFlags {
                memorized: true,
                recited: false
            }
        );

        let reopened = ProgressStore::open(path);
        assert!(reopened.chapter(1).await.memorized.contains(&2));
    }

    #[tokio::test]
    async fn test_invalid_toggle_leaves_book_unchanged() {
        let store = ProgressStore::in_memory();
        assert!(store.toggle(1, 99, ProgressKind::Recited).await.is_err());
        let (total, _, rows) = store.overview().await;
        assert_eq!(total, 0);
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_reviews_persist_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.json");

        let store = ReviewStore::open(path.clone());
        store.record(PastReview::new("Ya-Sin", 1, "Good ghunnah", "AAAA")).await.unwrap();
        store.record(PastReview::new("Ya-Sin", 2, "Lengthen the madd", "BBBB")).await.unwrap();

        let reopened = ReviewStore::open(path);
        let reviews = reopened.list().await;
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].verse, 2);
        assert_eq!(reopened.get(reviews[1].id).await.map(|r| r.feedback), Some("Good ghunnah".to_string()));
    }

    #[tokio::test]
    async fn test_corrupt_review_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.json");
        std::fs::write(&path, "not json").unwrap();

        let store = ReviewStore::open(path);
        assert!(store.list().await.is_empty());
    }
}
