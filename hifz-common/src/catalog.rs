//! Static chapter catalog
//!
//! Chapter names and verse counts for all 114 chapters, plus the starting
//! point of each of the 30 juz. Verse counts let the practice service
//! validate ranges without a network round-trip.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Number of chapters in the Quran
pub const CHAPTER_COUNT: u16 = 114;

/// Number of verses in the Quran
pub const TOTAL_VERSES: u32 = 6236;

/// (transliterated name, verse count), indexed by chapter id - 1
const CHAPTERS: [(&str, u16); CHAPTER_COUNT as usize] = [
    ("Al-Fatihah", 7), ("Al-Baqarah", 286), ("Ali 'Imran", 200), ("An-Nisa", 176),
    ("Al-Ma'idah", 120), ("Al-An'am", 165), ("Al-A'raf", 206), ("Al-Anfal", 75),
    ("At-Tawbah", 129), ("Yunus", 109), ("Hud", 123), ("Yusuf", 111),
    ("Ar-Ra'd", 43), ("Ibrahim", 52), ("Al-Hijr", 99), ("An-Nahl", 128),
    ("Al-Isra", 111), ("Al-Kahf", 110), ("Maryam", 98), ("Ta-Ha", 135),
    ("Al-Anbiya", 112), ("Al-Hajj", 78), ("Al-Mu'minun", 118), ("An-Nur", 64),
    ("Al-Furqan", 77), ("Ash-Shu'ara", 227), ("An-Naml", 93), ("Al-Qasas", 88),
    ("Al-Ankabut", 69), ("Ar-Rum", 60), ("Luqman", 34), ("As-Sajdah", 30),
    ("Al-Ahzab", 73), ("Saba", 54), ("Fatir", 45), ("Ya-Sin", 83),
    ("As-Saffat", 182), ("Sad", 88), ("Az-Zumar", 75), ("Ghafir", 85),
    ("Fussilat", 54), ("Ash-Shura", 53), ("Az-Zukhruf", 89), ("Ad-Dukhan", 59),
    ("Al-Jathiyah", 37), ("Al-Ahqaf", 35), ("Muhammad", 38), ("Al-Fath", 29),
    ("Al-Hujurat", 18), ("Qaf", 45), ("Adh-Dhariyat", 60), ("At-Tur", 49),
    ("An-Najm", 62), ("Al-Qamar", 55), ("Ar-Rahman", 78), ("Al-Waqi'ah", 96),
    ("Al-Hadid", 29), ("Al-Mujadila", 22), ("Al-Hashr", 24), ("Al-Mumtahanah", 13),
    ("As-Saff", 14), ("Al-Jumu'ah", 11), ("Al-Munafiqun", 11), ("At-Taghabun", 18),
    ("At-Talaq", 12), ("At-Tahrim", 12), ("Al-Mulk", 30), ("Al-Qalam", 52),
    ("Al-Haqqah", 52), ("Al-Ma'arij", 44), ("Nuh", 28), ("Al-Jinn", 28),
    ("Al-Muzzammil", 20), ("Al-Muddaththir", 56), ("Al-Qiyamah", 40), ("Al-Insan", 31),
    ("Al-Mursalat", 50), ("An-Naba", 40), ("An-Nazi'at", 46), ("Abasa", 42),
    ("At-Takwir", 29), ("Al-Infitar", 19), ("Al-Mutaffifin", 36), ("Al-Inshiqaq", 25),
    ("Al-Buruj", 22), ("At-Tariq", 17), ("Al-A'la", 19), ("Al-Ghashiyah", 26),
    ("Al-Fajr", 30), ("Al-Balad", 20), ("Ash-Shams", 15), ("Al-Layl", 21),
    ("Ad-Duha", 11), ("Ash-Sharh", 8), ("At-Tin", 8), ("Al-Alaq", 19),
    ("Al-Qadr", 5), ("Al-Bayyinah", 8), ("Az-Zalzalah", 8), ("Al-Adiyat", 11),
    ("Al-Qari'ah", 11), ("At-Takathur", 8), ("Al-Asr", 3), ("Al-Humazah", 9),
    ("Al-Fil", 5), ("Quraysh", 4), ("Al-Ma'un", 7), ("Al-Kawthar", 3),
    ("Al-Kafirun", 6), ("An-Nasr", 3), ("Al-Masad", 5), ("Al-Ikhlas", 4),
    ("Al-Falaq", 5), ("An-Nas", 6),
];

/// (chapter, verse) at which each juz begins, indexed by juz id - 1
const JUZ_STARTS: [(u16, u16); 30] = [
    (1, 1), (2, 142), (2, 253), (3, 93), (4, 24), (4, 148), (5, 82), (6, 111),
    (7, 88), (8, 41), (9, 93), (11, 6), (12, 53), (14, 1), (16, 1), (18, 75),
    (21, 1), (23, 1), (25, 21), (27, 56), (29, 46), (33, 31), (36, 28), (39, 32),
    (41, 47), (46, 1), (51, 31), (58, 1), (67, 1), (78, 1),
];

/// Catalog entry for one chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterInfo {
    /// Chapter number (1-114)
    pub id: u16,
    /// Transliterated chapter name
    pub name: String,
    /// Number of verses in the chapter
    pub verse_count: u16,
}

impl ChapterInfo {
    /// Whether `verse` is a valid verse number for this chapter
    pub fn contains(&self, verse: u16) -> bool {
        (1..=self.verse_count).contains(&verse)
    }
}

/// Juz starting point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JuzInfo {
    pub id: u8,
    pub start_chapter: u16,
    pub start_verse: u16,
}

/// Look up a chapter by id
///
/// # Errors
/// `Error::NotFound` if `id` is outside 1..=114
pub fn chapter(id: u16) -> Result<ChapterInfo> {
    if id == 0 || id > CHAPTER_COUNT {
        return Err(Error::NotFound(format!("chapter {}", id)));
    }
    let (name, verse_count) = CHAPTERS[usize::from(id - 1)];
    Ok(ChapterInfo {
        id,
        name: name.to_string(),
        verse_count,
    })
}

/// All chapters in order
pub fn chapters() -> impl Iterator<Item = ChapterInfo> {
    CHAPTERS
        .iter()
        .zip(1u16..)
        .map(|(&(name, verse_count), id)| ChapterInfo {
            id,
            name: name.to_string(),
            verse_count,
        })
}

/// All 30 juz starting points
pub fn juz() -> impl Iterator<Item = JuzInfo> {
    JUZ_STARTS
        .iter()
        .zip(1u8..)
        .map(|(&(start_chapter, start_verse), id)| JuzInfo {
            id,
            start_chapter,
            start_verse,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_totals() {
        assert_eq!(chapters().count(), 114);
        let total: u32 = chapters().map(|c| u32::from(c.verse_count)).sum();
        assert_eq!(total, TOTAL_VERSES);
    }

    #[test]
    fn test_chapter_lookup() {
        let fatihah = chapter(1).unwrap();
        assert_eq!(fatihah.name, "Al-Fatihah");
        assert_eq!(fatihah.verse_count, 7);

        let nas = chapter(114).unwrap();
        assert_eq!(nas.name, "An-Nas");
        assert_eq!(nas.verse_count, 6);
    }

    #[test]
    fn test_chapter_out_of_range() {
        assert!(matches!(chapter(0), Err(Error::NotFound(_))));
        assert!(matches!(chapter(115), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_contains() {
        let kawthar = chapter(108).unwrap();
        assert!(!kawthar.contains(0));
        assert!(kawthar.contains(1));
        assert!(kawthar.contains(3));
        assert!(!kawthar.contains(4));
    }

    #[test]
    fn test_juz_starts_reference_valid_verses() {
        assert_eq!(juz().count(), 30);
        for j in juz() {
            let c = chapter(j.start_chapter).unwrap();
            assert!(c.contains(j.start_verse), "juz {} starts outside chapter", j.id);
        }
    }
}
