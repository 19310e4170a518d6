//! Playback control
//!
//! - `controller`: single-resource audio controller
//! - `orchestrator`: session runner bridging controller events and the
//!   practice state machine
//! - `service`: the actor that owns both and serves UI commands

pub mod controller;
pub mod events;
pub mod orchestrator;
pub mod service;

pub use controller::AudioResourceController;
pub use events::{ControllerEvent, PlayHandle};
pub use orchestrator::PlaybackOrchestrator;
pub use service::{PracticeCommand, PracticeHandle, PracticeService, PracticeStatus};
