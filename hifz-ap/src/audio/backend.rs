//! Audio backend seam
//!
//! The controller never touches devices or the network directly. It asks an
//! `AudioBackend` for a resource, starts it, and waits on its `EndSignal`.
//! Production uses the cpal backend; tests substitute a scripted one.

use crate::error::Result;
use hifz_common::AudioLocator;
use std::future::Future;
use tokio::sync::oneshot;

/// Resolves once when playback of a resource ends by itself
///
/// - `Ok(Ok(()))`: natural end of the audio
/// - `Ok(Err(reason))`: failure after playback began
/// - `Err(RecvError)`: the resource was halted or dropped; not an event
pub type EndSignal = oneshot::Receiver<std::result::Result<(), String>>;

/// Sender half kept by a resource to report how playback ended
pub type EndNotifier = oneshot::Sender<std::result::Result<(), String>>;

/// One playable audio handle
///
/// Dropping a resource must release it (stop output) just like `halt`.
pub trait AudioResource: Send + 'static {
    /// Begin playback at `speed`; resolves once audio is actually running
    fn start(&mut self, speed: f64) -> impl Future<Output = Result<EndSignal>> + Send;

    /// Change the playback-rate multiplier of running audio
    fn set_speed(&self, speed: f64);

    /// Stop output and release the device; idempotent
    fn halt(&mut self);
}

/// Factory for playable resources
pub trait AudioBackend: Send + Sync + 'static {
    type Resource: AudioResource;

    /// Fetch and prepare the audio at `locator`
    fn acquire(&self, locator: &AudioLocator) -> impl Future<Output = Result<Self::Resource>> + Send;
}
