//! Practice session types
//!
//! Configuration and progress state shared between the practice engine and
//! its clients. Transition logic lives in `hifz-ap`; these are the values it
//! operates on and the snapshots clients receive.

use crate::catalog::ChapterInfo;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Fastest accepted reciter speed multiplier
pub const MAX_PLAYBACK_SPEED: f64 = 4.0;

/// Inclusive verse-number bounds within one chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRange {
    pub start: u16,
    pub end: u16,
}

impl VerseRange {
    /// Create a range, checking `1 <= start <= end`
    pub fn new(start: u16, end: u16) -> Result<Self> {
        if start == 0 {
            return Err(Error::InvalidInput("range start must be at least 1".to_string()));
        }
        if start > end {
            return Err(Error::InvalidInput(format!(
                "range start {} is after range end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of verses in the range; zero when inverted
    pub fn len(&self) -> u16 {
        if self.is_empty() {
            return 0;
        }
        self.end - self.start + 1
    }

    /// True for an inverted range (`start > end`)
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, verse: u16) -> bool {
        (self.start..=self.end).contains(&verse)
    }

    /// Check ordering, then both bounds against a chapter's verse count
    pub fn check_within(&self, chapter: &ChapterInfo) -> Result<()> {
        Self::new(self.start, self.end)?;
        if !chapter.contains(self.start) || !chapter.contains(self.end) {
            return Err(Error::InvalidInput(format!(
                "range {}-{} is outside {} (1-{})",
                self.start, self.end, chapter.name, chapter.verse_count
            )));
        }
        Ok(())
    }

    /// Shrink the range to fit a chapter with `verse_count` verses
    pub fn clamped_to(&self, verse_count: u16) -> Self {
        let end = self.end.min(verse_count).max(1);
        let start = self.start.min(end).max(1);
        Self { start, end }
    }
}

/// Repetition algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeMethod {
    /// Each verse repeated in turn
    Standard,
    /// Focus on the newest verse, then recite the growing chain from the start
    Chain,
}

impl std::fmt::Display for PracticeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PracticeMethod::Standard => write!(f, "standard"),
            PracticeMethod::Chain => write!(f, "chain"),
        }
    }
}

impl std::str::FromStr for PracticeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(PracticeMethod::Standard),
            "chain" => Ok(PracticeMethod::Chain),
            other => Err(Error::InvalidInput(format!("unknown practice method: {}", other))),
        }
    }
}

/// Chain-method phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Drilling the newest verse alone
    Focus,
    /// Reciting the whole accumulated run
    Chain,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Focus => write!(f, "focus"),
            Phase::Chain => write!(f, "chain"),
        }
    }
}

/// Session parameters, snapshotted when a session starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub range: VerseRange,
    pub method: PracticeMethod,
    pub repeats_per_unit: u32,
    pub playback_speed: f64,
}

impl SessionConfig {
    /// Check every field; range bounds are checked against `chapter`
    pub fn validate(&self, chapter: &ChapterInfo) -> Result<()> {
        self.range.check_within(chapter)?;
        validate_repeats(self.repeats_per_unit)?;
        validate_speed(self.playback_speed)?;
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            range: VerseRange { start: 1, end: 7 },
            method: PracticeMethod::Chain,
            repeats_per_unit: 3,
            playback_speed: 1.0,
        }
    }
}

/// Repeat count must be at least one
pub fn validate_repeats(repeats: u32) -> Result<()> {
    if repeats == 0 {
        return Err(Error::InvalidInput("repeats per unit must be at least 1".to_string()));
    }
    Ok(())
}

/// Speed must be finite, positive, and at most `MAX_PLAYBACK_SPEED`
pub fn validate_speed(speed: f64) -> Result<()> {
    if !speed.is_finite() || speed <= 0.0 || speed > MAX_PLAYBACK_SPEED {
        return Err(Error::InvalidInput(format!(
            "playback speed {} outside (0, {}]",
            speed, MAX_PLAYBACK_SPEED
        )));
    }
    Ok(())
}

/// Mutable core of a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Only meaningful for the chain method
    pub phase: Phase,
    /// Highest verse currently drilled into the chain
    pub chain_end: u16,
    /// Zero-based count of repeats completed for the current unit
    pub current_loop: u32,
    /// Verse playing or about to play
    pub current_verse: u16,
}

impl PlaybackState {
    /// State at session start: focus on the first verse of the range
    pub fn initial(config: &SessionConfig) -> Self {
        Self {
            phase: Phase::Focus,
            chain_end: config.range.start,
            current_loop: 0,
            current_verse: config.range.start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn test_range_rejects_inverted_and_zero() {
        assert!(VerseRange::new(3, 2).is_err());
        assert!(VerseRange::new(0, 2).is_err());
        let r = VerseRange::new(4, 4).unwrap();
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_range_check_within_chapter() {
        let ikhlas = catalog::chapter(112).unwrap();
        assert!(VerseRange::new(1, 4).unwrap().check_within(&ikhlas).is_ok());
        assert!(VerseRange::new(2, 5).unwrap().check_within(&ikhlas).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_literal_range() {
        let fatiha = catalog::chapter(1).unwrap();
        let inverted = VerseRange { start: 5, end: 3 };
        assert!(inverted.is_empty());
        assert_eq!(inverted.len(), 0);

        let config = SessionConfig {
            range: inverted,
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(&fatiha), Err(Error::InvalidInput(_))));

        let zero_start = SessionConfig {
            range: VerseRange { start: 0, end: 3 },
            ..SessionConfig::default()
        };
        assert!(zero_start.validate(&fatiha).is_err());
    }

    #[test]
    fn test_range_clamped_to_shorter_chapter() {
        let r = VerseRange { start: 3, end: 10 };
        assert_eq!(r.clamped_to(7), VerseRange { start: 3, end: 7 });
        assert_eq!(r.clamped_to(2), VerseRange { start: 2, end: 2 });
        assert_eq!(r.clamped_to(286), r);
    }

    #[test]
    fn test_speed_validation() {
        assert!(validate_speed(0.75).is_ok());
        assert!(validate_speed(MAX_PLAYBACK_SPEED).is_ok());
        assert!(validate_speed(0.0).is_err());
        assert!(validate_speed(-1.0).is_err());
        assert!(validate_speed(f64::NAN).is_err());
        assert!(validate_speed(4.5).is_err());
    }

    #[test]
    fn test_method_parse_and_serde() {
        assert_eq!("Chain".parse::<PracticeMethod>().unwrap(), PracticeMethod::Chain);
        assert!("shuffle".parse::<PracticeMethod>().is_err());
        let json = serde_json::to_string(&PracticeMethod::Standard).unwrap();
        assert_eq!(json, "\"standard\"");
    }

    #[test]
    fn test_initial_state() {
        let config = SessionConfig {
            range: VerseRange { start: 5, end: 9 },
            ..SessionConfig::default()
        };
        let state = PlaybackState::initial(&config);
        assert_eq!(state.phase, Phase::Focus);
        assert_eq!(state.chain_end, 5);
        assert_eq!(state.current_loop, 0);
        assert_eq!(state.current_verse, 5);
    }
}
