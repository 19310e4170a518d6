//! Audio subsystem
//!
//! - `backend`: the seam the controller plays through
//! - `decoder`: symphonia decode of whole clips
//! - `output`: cpal output thread with live speed
//! - `cpal_backend`: the production backend tying them together

pub mod backend;
pub mod cpal_backend;
pub mod decoder;
pub mod output;

pub use backend::{AudioBackend, AudioResource, EndNotifier, EndSignal};
pub use cpal_backend::{CpalBackend, CpalResource};
pub use decoder::DecodedAudio;
