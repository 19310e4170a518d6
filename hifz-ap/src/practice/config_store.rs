//! Session configuration store
//!
//! Holds the selected chapter and the `SessionConfig` the next session will
//! snapshot. Every setter validates first; a rejected value leaves both the
//! store and any running session untouched. A valid change to a
//! session-shaping parameter (chapter, range, method, repeats) stops the
//! running session before it is committed.
//!
//! Playback speed is not stored here as a session-shaping parameter: it is
//! applied live by the orchestrator and only mirrored into the stored config.

use crate::error::{Error, Result};
use hifz_common::catalog::ChapterInfo;
use hifz_common::session::{validate_repeats, validate_speed, PracticeMethod, SessionConfig, VerseRange};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info};

/// Something that owns a practice session and can end it
pub trait SessionControl {
    fn is_active(&self) -> bool;

    /// End the active session; no-op when idle
    fn stop(&mut self) -> impl Future<Output = ()> + Send;
}

/// Partial update applied atomically by [`SessionConfigStore::apply`]
///
/// Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub start: Option<u16>,
    pub end: Option<u16>,
    pub method: Option<PracticeMethod>,
    pub repeats_per_unit: Option<u32>,
    pub playback_speed: Option<f64>,
}

impl ConfigUpdate {
    fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.method.is_none()
            && self.repeats_per_unit.is_none()
            && self.playback_speed.is_none()
    }
}

/// Validated holder of the chapter and session parameters
#[derive(Debug, Clone)]
pub struct SessionConfigStore {
    chapter: ChapterInfo,
    config: SessionConfig,
}

impl SessionConfigStore {
    /// Create a store; `config` must fit `chapter`
    pub fn new(chapter: ChapterInfo, config: SessionConfig) -> Result<Self> {
        config.validate(&chapter).map_err(Error::invalid_config)?;
        Ok(Self { chapter, config })
    }

    /// Store for `chapter` with its whole verse range selected
    pub fn for_chapter(
        chapter: ChapterInfo,
        method: PracticeMethod,
        repeats_per_unit: u32,
        playback_speed: f64,
    ) -> Result<Self> {
        let config = SessionConfig {
            range: VerseRange {
                start: 1,
                end: chapter.verse_count,
            },
            method,
            repeats_per_unit,
            playback_speed,
        };
        Self::new(chapter, config)
    }

    pub fn chapter(&self) -> &ChapterInfo {
        &self.chapter
    }

    /// Snapshot of the current parameters
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub async fn set_range<S: SessionControl>(
        &mut self,
        session: &mut S,
        start: u16,
        end: u16,
    ) -> Result<()> {
        self.apply(
            session,
            ConfigUpdate {
                start: Some(start),
                end: Some(end),
                ..ConfigUpdate::default()
            },
        )
        .await
    }

    pub async fn set_start<S: SessionControl>(&mut self, session: &mut S, start: u16) -> Result<()> {
        self.apply(
            session,
            ConfigUpdate {
                start: Some(start),
                ..ConfigUpdate::default()
            },
        )
        .await
    }

    pub async fn set_end<S: SessionControl>(&mut self, session: &mut S, end: u16) -> Result<()> {
        self.apply(
            session,
            ConfigUpdate {
                end: Some(end),
                ..ConfigUpdate::default()
            },
        )
        .await
    }

    pub async fn set_method<S: SessionControl>(
        &mut self,
        session: &mut S,
        method: PracticeMethod,
    ) -> Result<()> {
        self.apply(
            session,
            ConfigUpdate {
                method: Some(method),
                ..ConfigUpdate::default()
            },
        )
        .await
    }

    pub async fn set_repeats<S: SessionControl>(
        &mut self,
        session: &mut S,
        repeats_per_unit: u32,
    ) -> Result<()> {
        self.apply(
            session,
            ConfigUpdate {
                repeats_per_unit: Some(repeats_per_unit),
                ..ConfigUpdate::default()
            },
        )
        .await
    }

    /// Record a speed change; never stops the session
    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        validate_speed(speed).map_err(Error::invalid_config)?;
        self.config.playback_speed = speed;
        Ok(())
    }

    /// Switch chapters, clamping the range into the new chapter
    pub async fn set_chapter<S: SessionControl>(
        &mut self,
        session: &mut S,
        chapter: ChapterInfo,
    ) -> Result<()> {
        if chapter == self.chapter {
            return Ok(());
        }
        let range = self.config.range.clamped_to(chapter.verse_count);
        if range != self.config.range {
            debug!(
                "Range {}-{} clamped to {}-{} for {}",
                self.config.range.start, self.config.range.end, range.start, range.end, chapter.name
            );
        }

        stop_if_active(session).await;
        info!("Selected chapter {} ({})", chapter.id, chapter.name);
        self.chapter = chapter;
        self.config.range = range;
        Ok(())
    }

    /// Validate and commit a partial update as one change
    ///
    /// A change to range, method or repeats stops the active session first.
    pub async fn apply<S: SessionControl>(
        &mut self,
        session: &mut S,
        update: ConfigUpdate,
    ) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let start = update.start.unwrap_or(self.config.range.start);
        let end = update.end.unwrap_or(self.config.range.end);
        let range = VerseRange::new(start, end).map_err(Error::invalid_config)?;
        range.check_within(&self.chapter).map_err(Error::invalid_config)?;

        let method = update.method.unwrap_or(self.config.method);
        let repeats_per_unit = update.repeats_per_unit.unwrap_or(self.config.repeats_per_unit);
        validate_repeats(repeats_per_unit).map_err(Error::invalid_config)?;

        let playback_speed = update.playback_speed.unwrap_or(self.config.playback_speed);
        validate_speed(playback_speed).map_err(Error::invalid_config)?;

        let next = SessionConfig {
            range,
            method,
            repeats_per_unit,
            playback_speed,
        };
        let shaping_changed = next.range != self.config.range
            || next.method != self.config.method
            || next.repeats_per_unit != self.config.repeats_per_unit;

        if shaping_changed {
            stop_if_active(session).await;
        }
        self.config = next;
        debug!(
            "Config: {}-{} {} x{} @{}",
            range.start, range.end, method, repeats_per_unit, playback_speed
        );
        Ok(())
    }
}

async fn stop_if_active<S: SessionControl>(session: &mut S) {
    if session.is_active() {
        info!("Stopping active session for configuration change");
        session.stop().await;
    }
}
