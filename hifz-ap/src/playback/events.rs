//! Internal controller events (not exposed via SSE)
//!
//! Raised by the audio resource controller's end-of-playback watchers and
//! consumed by the practice service. The orchestrator turns them into
//! `HifzEvent`s before anything reaches a client.

use hifz_common::AudioLocator;

/// Identifies one accepted `play()` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayHandle {
    pub request_id: u64,
    pub locator: AudioLocator,
}

/// Controller → orchestrator notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Audio of `request_id` reached its natural end
    Finished {
        request_id: u64,
        locator: AudioLocator,
    },

    /// Audio of `request_id` failed after playback began
    PlaybackFailed {
        request_id: u64,
        locator: AudioLocator,
        reason: String,
    },
}

impl ControllerEvent {
    pub fn request_id(&self) -> u64 {
        match self {
            ControllerEvent::Finished { request_id, .. }
            | ControllerEvent::PlaybackFailed { request_id, .. } => *request_id,
        }
    }

    pub fn locator(&self) -> &AudioLocator {
        match self {
            ControllerEvent::Finished { locator, .. }
            | ControllerEvent::PlaybackFailed { locator, .. } => locator,
        }
    }

    /// True if this event belongs to the request identified by `handle`
    pub fn matches(&self, handle: &PlayHandle) -> bool {
        self.request_id() == handle.request_id && *self.locator() == handle.locator
    }
}
