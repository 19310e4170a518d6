//! Audio resource controller
//!
//! Owns at most one playable resource at a time and serializes every
//! transition on it:
//!
//! - The slot is a `tokio::sync::Mutex` held across the whole
//!   teardown → acquire → start sequence, so a `play` or `stop` that arrives
//!   while a request is in flight waits for that request to settle first.
//! - Every accepted `play` gets a fresh request id. The end-of-playback
//!   watcher for a resource only reports if its id is still current, and it
//!   is aborted when the resource is torn down.
//! - Acquisition and start are bounded by a timeout; timing out is a
//!   playback failure like any other.

use crate::audio::backend::{AudioBackend, AudioResource, EndSignal};
use crate::error::{Error, Result};
use crate::playback::events::{ControllerEvent, PlayHandle};
use hifz_common::AudioLocator;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Request id meaning "nothing playing"
const IDLE: u64 = 0;

struct Active<R> {
    request_id: u64,
    locator: AudioLocator,
    resource: R,
    watcher: JoinHandle<()>,
}

/// Single-resource playback controller
pub struct AudioResourceController<B: AudioBackend> {
    backend: B,
    slot: Mutex<Option<Active<B::Resource>>>,
    next_request_id: AtomicU64,
    /// Id of the resource currently playing, `IDLE` otherwise
    current_request: Arc<AtomicU64>,
    /// Playback speed stored as `f64` bits
    speed_bits: AtomicU64,
    acquire_timeout: Duration,
    events: mpsc::UnboundedSender<ControllerEvent>,
}

impl<B: AudioBackend> AudioResourceController<B> {
    /// Create a controller and the receiver for its events
    pub fn new(
        backend: B,
        acquire_timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let controller = Self {
            backend,
            slot: Mutex::new(None),
            next_request_id: AtomicU64::new(IDLE + 1),
            current_request: Arc::new(AtomicU64::new(IDLE)),
            speed_bits: AtomicU64::new(1.0f64.to_bits()),
            acquire_timeout,
            events,
        };
        (controller, rx)
    }

    /// Stop whatever is playing and start `locator`
    ///
    /// # Errors
    /// `Error::PlaybackFailed` if the resource cannot be acquired or started
    /// within the acquisition timeout. The controller is idle afterwards and
    /// no event is raised for the failed request.
    pub async fn play(&self, locator: AudioLocator) -> Result<PlayHandle> {
        let mut slot = self.slot.lock().await;
        self.teardown(&mut slot);

        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let speed = self.speed();
        debug!("Play request {} for {} at {}x", request_id, locator, speed);

        let started = tokio::time::timeout(self.acquire_timeout, async {
            let mut resource = self.backend.acquire(&locator).await?;
            let end = resource.start(speed).await?;
            Ok::<_, Error>((resource, end))
        })
        .await;

        let (resource, end) = match started {
            Ok(Ok(started)) => started,
            Ok(Err(e)) => {
                warn!("Play request {} failed: {}", request_id, e);
                return Err(Error::PlaybackFailed {
                    locator,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!(
                    "Play request {} timed out after {:?}",
                    request_id, self.acquire_timeout
                );
                return Err(Error::PlaybackFailed {
                    locator,
                    reason: format!("timed out after {:?}", self.acquire_timeout),
                });
            }
        };

        // Speed may have changed while the resource was loading
        let current_speed = self.speed();
        if current_speed != speed {
            resource.set_speed(current_speed);
        }

        self.current_request.store(request_id, Ordering::SeqCst);
        let watcher = tokio::spawn(watch_end(
            end,
            request_id,
            locator.clone(),
            Arc::clone(&self.current_request),
            self.events.clone(),
        ));

        *slot = Some(Active {
            request_id,
            locator: locator.clone(),
            resource,
            watcher,
        });

        Ok(PlayHandle {
            request_id,
            locator,
        })
    }

    /// Halt and release the current resource; no-op when idle
    pub async fn stop(&self) {
        let mut slot = self.slot.lock().await;
        self.teardown(&mut slot);
    }

    /// Set the playback-rate multiplier for current and future resources
    pub async fn set_speed(&self, speed: f64) {
        self.speed_bits.store(speed.to_bits(), Ordering::SeqCst);
        let slot = self.slot.lock().await;
        if let Some(active) = slot.as_ref() {
            active.resource.set_speed(speed);
        }
    }

    pub fn speed(&self) -> f64 {
        f64::from_bits(self.speed_bits.load(Ordering::SeqCst))
    }

    /// True while a started resource has not yet ended or been stopped
    pub fn is_playing(&self) -> bool {
        self.current_request().is_some()
    }

    /// Id of the request currently playing
    pub fn current_request(&self) -> Option<u64> {
        match self.current_request.load(Ordering::SeqCst) {
            IDLE => None,
            id => Some(id),
        }
    }

    fn teardown(&self, slot: &mut Option<Active<B::Resource>>) {
        self.current_request.store(IDLE, Ordering::SeqCst);
        if let Some(mut active) = slot.take() {
            active.watcher.abort();
            active.resource.halt();
            debug!("Released request {} ({})", active.request_id, active.locator);
        }
    }
}

/// Report the natural end (or runtime failure) of one resource
async fn watch_end(
    end: EndSignal,
    request_id: u64,
    locator: AudioLocator,
    current_request: Arc<AtomicU64>,
    events: mpsc::UnboundedSender<ControllerEvent>,
) {
    let Ok(outcome) = end.await else {
        // Halted or dropped
        return;
    };

    if current_request
        .compare_exchange(request_id, IDLE, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        debug!("Request {} ended after being superseded", request_id);
        return;
    }

    let event = match outcome {
        Ok(()) => ControllerEvent::Finished {
            request_id,
            locator,
        },
        Err(reason) => {
            warn!("Request {} failed during playback: {}", request_id, reason);
            ControllerEvent::PlaybackFailed {
                request_id,
                locator,
                reason,
            }
        }
    };
    let _ = events.send(event);
}
