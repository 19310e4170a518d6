//! Verse records returned by the verse provider and enrichment oracle

use serde::{Deserialize, Serialize};

/// One chapter with its verses and translations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u16,
    /// English transliterated name
    pub name: String,
    /// Arabic name
    pub name_ar: String,
    /// "Meccan" or "Medinan"
    pub revelation_type: String,
    pub verse_count: u16,
    pub verses: Vec<Verse>,
}

/// A single verse in Arabic with English and Tamil translations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    /// Verse number within the chapter (1-based)
    pub number: u16,
    pub text: String,
    pub translation_en: String,
    pub translation_ta: String,
}

/// Word-by-word gloss entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub arabic: String,
    pub english: String,
    pub tamil: String,
}

/// Tajweed rule that applies to part of a verse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TajweedRule {
    pub rule: String,
    pub explanation_en: String,
    pub explanation_ta: String,
    /// The part of the Arabic text this applies to
    pub location: String,
}
