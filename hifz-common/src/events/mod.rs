//! Event types for the Hifz event system
//!
//! Provides the shared event enum and the EventBus the practice service
//! publishes on. Clients observe these over SSE.

mod session_types;

pub use session_types::{SessionOutcome, SessionSnapshot};

use crate::catalog::ChapterInfo;
use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Hifz event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HifzEvent {
    /// Practice session started
    ///
    /// Triggers:
    /// - SSE: switch UI to the active-session view
    SessionStarted {
        session_id: Uuid,
        chapter_id: u16,
        config: SessionConfig,
        /// Plays the session will perform if it runs to completion
        total_plays: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A verse began playing
    ///
    /// Emitted after every state-machine transition that plays audio.
    ///
    /// Triggers:
    /// - SSE: highlight verse, update phase label and progress bar
    VerseStarted {
        snapshot: SessionSnapshot,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Practice session ended
    ///
    /// Triggers:
    /// - SSE: return UI to idle; show notice on failure
    SessionEnded {
        session_id: Uuid,
        outcome: SessionOutcome,
        /// Plays started before the session ended
        plays_started: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Reciter speed changed (applies to the playing verse immediately)
    SpeedChanged {
        speed: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session configuration or chapter changed
    ConfigChanged {
        chapter: ChapterInfo,
        config: SessionConfig,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A verse's memorized/recited flags changed
    ProgressChanged {
        chapter_id: u16,
        verse: u16,
        memorized: bool,
        recited: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl HifzEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            HifzEvent::SessionStarted { .. } => "SessionStarted",
            HifzEvent::VerseStarted { .. } => "VerseStarted",
            HifzEvent::SessionEnded { .. } => "SessionEnded",
            HifzEvent::SpeedChanged { .. } => "SpeedChanged",
            HifzEvent::ConfigChanged { .. } => "ConfigChanged",
            HifzEvent::ProgressChanged { .. } => "ProgressChanged",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block the practice task)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use hifz_common::events::{EventBus, HifzEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(HifzEvent::SpeedChanged {
///     speed: 1.25,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(HifzEvent::SpeedChanged { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HifzEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before lagging subscribers
    ///   start losing the oldest ones
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<HifzEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: HifzEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<HifzEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: HifzEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
