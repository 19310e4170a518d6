//! Progress book and review log persistence tests

use hifz_common::progress::{ProgressBook, ProgressKind};
use hifz_common::reviews::{PastReview, ReviewLog, MAX_REVIEWS};
use tempfile::TempDir;

#[test]
fn test_save_then_load_preserves_flags() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("progress.json");

    let mut book = ProgressBook::new();
    book.toggle(36, 1, ProgressKind::Memorized).unwrap();
    book.toggle(36, 2, ProgressKind::Recited).unwrap();
    book.save(&path).unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());

    let loaded = ProgressBook::load(&path).unwrap();
    assert_eq!(loaded, book);
    assert!(loaded.is_memorized(36, 1));
    assert!(loaded.is_recited(36, 2));
}

#[test]
fn test_load_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let book = ProgressBook::load(&dir.path().join("none.json")).unwrap();
    assert_eq!(book.memorized_total(), 0);
}

#[test]
fn test_load_corrupt_file_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(ProgressBook::load(&path).is_err());
}

#[test]
fn test_review_log_round_trips_through_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reviews.json");

    let mut log = ReviewLog::new();
    log.record(PastReview::new("Al-Mulk", 1, "Good madd", "UklGRg=="));
    log.record(PastReview::new("Al-Mulk", 2, "Watch the qalqalah", "UklGRh=="));
    log.save(&path).unwrap();

    let loaded = ReviewLog::load(&path).unwrap();
    assert_eq!(loaded, log);
    assert_eq!(loaded.reviews()[0].verse, 2);
    assert_eq!(loaded.reviews()[1].audio_base64, "UklGRg==");
}

#[test]
fn test_review_log_load_caps_oversized_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reviews.json");

    let reviews: Vec<PastReview> = (1..=15)
        .map(|verse| PastReview::new("Al-Baqarah", verse, "ok", "AAAA"))
        .collect();
    std::fs::write(&path, serde_json::to_string(&reviews).unwrap()).unwrap();

    let log = ReviewLog::load(&path).unwrap();
    assert_eq!(log.len(), MAX_REVIEWS);
    assert_eq!(log.reviews()[0].verse, 1);
}

#[test]
fn test_review_log_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let log = ReviewLog::load(&dir.path().join("none.json")).unwrap();
    assert!(log.is_empty());
}
