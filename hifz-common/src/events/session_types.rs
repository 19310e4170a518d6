//! Session-related event payloads

use crate::session::{PlaybackState, SessionConfig};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a practice session ended
///
/// Clients render these differently: completion is celebrated, a stop is
/// silent, a failure shows a dismissible notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum SessionOutcome {
    /// Every scheduled play finished naturally
    Completed,
    /// Stopped by the user, a new session, or a configuration change
    Stopped,
    /// Audio could not be acquired or played
    Failed {
        reason: String,
    },
}

impl std::fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionOutcome::Completed => write!(f, "completed"),
            SessionOutcome::Stopped => write!(f, "stopped"),
            SessionOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Read-only view of a running session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub chapter_id: u16,
    pub config: SessionConfig,
    pub state: PlaybackState,
    /// Verse whose audio is currently playing (None while acquiring)
    pub playing_verse: Option<u16>,
    /// Plays started so far, including the current one
    pub plays_started: u32,
    /// Plays the whole session will perform
    pub total_plays: u32,
    /// Display label for the current unit, e.g. "Chaining: 1 → 3"
    pub unit_label: String,
}

impl SessionSnapshot {
    /// Progress through the session as a fraction in 0.0..=1.0
    pub fn fraction_complete(&self) -> f64 {
        if self.total_plays == 0 {
            return 0.0;
        }
        f64::from(self.plays_started) / f64::from(self.total_plays)
    }
}
