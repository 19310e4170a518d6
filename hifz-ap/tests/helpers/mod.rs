//! Test helpers for hifz-ap integration tests
//!
//! `MockBackend` stands in for the cpal backend. Tests script acquisition
//! delays and failures per locator, then end the playing resource by hand
//! with `finish_current` / `fail_current`.

#![allow(dead_code)]

use hifz_ap::audio::backend::{AudioBackend, AudioResource, EndNotifier, EndSignal};
use hifz_ap::{Error, Result};
use hifz_common::AudioLocator;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

struct Live {
    locator: AudioLocator,
    end: EndNotifier,
}

#[derive(Default)]
struct MockState {
    next_id: AtomicU64,
    /// Started and not yet halted, dropped or ended
    live: Mutex<HashMap<u64, Live>>,
    max_live: AtomicUsize,
    acquired: AtomicUsize,
    started: Mutex<Vec<AudioLocator>>,
    delays: Mutex<HashMap<AudioLocator, Duration>>,
    failing: Mutex<HashSet<AudioLocator>>,
    last_speed: Mutex<Option<f64>>,
}

/// Scripted audio backend
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay acquisition of `locator`
    pub fn delay(&self, locator: &AudioLocator, delay: Duration) {
        self.state.delays.lock().unwrap().insert(locator.clone(), delay);
    }

    /// Make acquisition of `locator` fail
    pub fn fail_on(&self, locator: &AudioLocator) {
        self.state.failing.lock().unwrap().insert(locator.clone());
    }

    /// Resources currently producing audio
    pub fn playing(&self) -> usize {
        self.state.live.lock().unwrap().len()
    }

    /// Most resources ever playing at once
    pub fn max_playing(&self) -> usize {
        self.state.max_live.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> usize {
        self.state.acquired.load(Ordering::SeqCst)
    }

    /// Every locator started so far, in order
    pub fn started(&self) -> Vec<AudioLocator> {
        self.state.started.lock().unwrap().clone()
    }

    pub fn last_speed(&self) -> Option<f64> {
        *self.state.last_speed.lock().unwrap()
    }

    /// End the playing resource naturally; returns its locator
    pub fn finish_current(&self) -> Option<AudioLocator> {
        self.end_current(Ok(()))
    }

    /// Report a runtime failure from the playing resource
    pub fn fail_current(&self, reason: &str) -> Option<AudioLocator> {
        self.end_current(Err(reason.to_string()))
    }

    fn end_current(&self, outcome: std::result::Result<(), String>) -> Option<AudioLocator> {
        let mut live = self.state.live.lock().unwrap();
        let id = *live.keys().next()?;
        let entry = live.remove(&id)?;
        let _ = entry.end.send(outcome);
        Some(entry.locator)
    }
}

impl AudioBackend for MockBackend {
    type Resource = MockResource;

    async fn acquire(&self, locator: &AudioLocator) -> Result<MockResource> {
        let delay = self.state.delays.lock().unwrap().get(locator).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.failing.lock().unwrap().contains(locator) {
            return Err(Error::AudioOutput(format!("scripted failure for {}", locator)));
        }
        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(MockResource {
            id: self.state.next_id.fetch_add(1, Ordering::SeqCst),
            locator: locator.clone(),
            state: Arc::clone(&self.state),
        })
    }
}

/// Resource handed out by `MockBackend`
pub struct MockResource {
    id: u64,
    locator: AudioLocator,
    state: Arc<MockState>,
}

impl AudioResource for MockResource {
    async fn start(&mut self, speed: f64) -> Result<EndSignal> {
        let (end, signal) = oneshot::channel();
        let mut live = self.state.live.lock().unwrap();
        live.insert(
            self.id,
            Live {
                locator: self.locator.clone(),
                end,
            },
        );
        self.state.max_live.fetch_max(live.len(), Ordering::SeqCst);
        drop(live);
        self.state.started.lock().unwrap().push(self.locator.clone());
        *self.state.last_speed.lock().unwrap() = Some(speed);
        Ok(signal)
    }

    fn set_speed(&self, speed: f64) {
        *self.state.last_speed.lock().unwrap() = Some(speed);
    }

    fn halt(&mut self) {
        // Dropping the notifier closes the end signal without an outcome
        self.state.live.lock().unwrap().remove(&self.id);
    }
}

impl Drop for MockResource {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Poll `condition` every few milliseconds until it holds or `timeout` passes
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
