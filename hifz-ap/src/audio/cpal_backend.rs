//! Production audio backend
//!
//! Fetches a verse clip (HTTP(S) via reqwest, or a local file path), decodes
//! it on the blocking pool, and plays it through a cpal output thread.

use crate::audio::backend::{AudioBackend, AudioResource, EndSignal};
use crate::audio::decoder::{decode_bytes, DecodedAudio};
use crate::audio::output::{spawn_output, OutputHandle};
use crate::error::{Error, Result};
use hifz_common::AudioLocator;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// Downloads, decodes and plays recitation clips
#[derive(Debug, Clone)]
pub struct CpalBackend {
    client: reqwest::Client,
    device: Option<String>,
}

impl CpalBackend {
    /// * `device` - output device name (None = system default)
    pub fn new(client: reqwest::Client, device: Option<String>) -> Self {
        Self { client, device }
    }

    async fn fetch(&self, locator: &AudioLocator) -> Result<Vec<u8>> {
        let uri = locator.as_str();
        if uri.starts_with("http://") || uri.starts_with("https://") {
            let response = self
                .client
                .get(uri)
                .send()
                .await
                .map_err(|e| Error::AudioOutput(format!("Failed to fetch audio: {}", e)))?
                .error_for_status()
                .map_err(|e| Error::AudioOutput(format!("Audio request rejected: {}", e)))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::AudioOutput(format!("Failed to read audio body: {}", e)))?;
            return Ok(bytes.to_vec());
        }

        let path = uri.strip_prefix("file://").unwrap_or(uri);
        Ok(tokio::fs::read(path).await?)
    }
}

impl AudioBackend for CpalBackend {
    type Resource = CpalResource;

    async fn acquire(&self, locator: &AudioLocator) -> Result<CpalResource> {
        let bytes = self.fetch(locator).await?;
        debug!("Fetched {} bytes for {}", bytes.len(), locator);

        let extension = locator
            .as_str()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        let audio = tokio::task::spawn_blocking(move || decode_bytes(bytes, extension.as_deref()))
            .await
            .map_err(|e| Error::Decode(format!("Decode task failed: {}", e)))??;

        Ok(CpalResource {
            audio: Some(audio),
            device: self.device.clone(),
            speed: Arc::new(AtomicU64::new(1.0f64.to_bits())),
            output: None,
        })
    }
}

/// One decoded clip, playable once
pub struct CpalResource {
    audio: Option<DecodedAudio>,
    device: Option<String>,
    speed: Arc<AtomicU64>,
    output: Option<OutputHandle>,
}

impl AudioResource for CpalResource {
    async fn start(&mut self, speed: f64) -> Result<EndSignal> {
        let audio = self
            .audio
            .take()
            .ok_or_else(|| Error::AudioOutput("Clip already started".to_string()))?;
        self.speed.store(speed.to_bits(), Ordering::SeqCst);

        let (done_tx, done_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        self.output = Some(spawn_output(
            self.device.clone(),
            audio,
            Arc::clone(&self.speed),
            done_tx,
            ready_tx,
        )?);

        ready_rx
            .await
            .map_err(|_| Error::AudioOutput("Output thread exited during startup".to_string()))??;
        Ok(done_rx)
    }

    fn set_speed(&self, speed: f64) {
        self.speed.store(speed.to_bits(), Ordering::SeqCst);
    }

    fn halt(&mut self) {
        if let Some(mut output) = self.output.take() {
            output.halt();
        }
    }
}
