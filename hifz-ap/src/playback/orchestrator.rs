//! Playback orchestrator
//!
//! Drives one practice session at a time: plays the first verse, feeds each
//! natural end of audio into the state machine, plays whatever it asks for
//! next, and publishes a `HifzEvent` after every transition.
//!
//! **Stale events:** a controller event only counts if it carries the request
//! id and locator of the play this orchestrator is waiting on. Anything else
//! (a late `Finished` from a superseded verse or an earlier session) is
//! dropped.
//!
//! **Failures:** a verse that cannot be played ends the session with
//! `SessionOutcome::Failed`. Nothing is retried.

use crate::audio::backend::AudioBackend;
use crate::error::{Error, Result};
use crate::playback::controller::AudioResourceController;
use crate::playback::events::{ControllerEvent, PlayHandle};
use crate::practice::config_store::SessionControl;
use crate::practice::schedule::{advance, total_plays, unit_label, NextAction};
use hifz_common::catalog;
use hifz_common::events::{EventBus, HifzEvent, SessionOutcome, SessionSnapshot};
use hifz_common::session::{validate_speed, PlaybackState, SessionConfig};
use hifz_common::RecitationSource;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct ActiveSession {
    id: Uuid,
    chapter_id: u16,
    config: SessionConfig,
    state: PlaybackState,
    /// Play whose end advances the session; None while acquiring
    expected: Option<PlayHandle>,
    plays_started: u32,
    total_plays: u32,
}

impl ActiveSession {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            chapter_id: self.chapter_id,
            config: self.config,
            state: self.state,
            playing_verse: self.expected.as_ref().map(|_| self.state.current_verse),
            plays_started: self.plays_started,
            total_plays: self.total_plays,
            unit_label: unit_label(&self.state, &self.config),
        }
    }
}

/// Event-driven session runner
pub struct PlaybackOrchestrator<B: AudioBackend> {
    controller: Arc<AudioResourceController<B>>,
    source: RecitationSource,
    events: EventBus,
    session: Option<ActiveSession>,
}

impl<B: AudioBackend> PlaybackOrchestrator<B> {
    pub fn new(
        controller: Arc<AudioResourceController<B>>,
        source: RecitationSource,
        events: EventBus,
    ) -> Self {
        Self {
            controller,
            source,
            events,
            session: None,
        }
    }

    /// Start a new session on `chapter_id` with `config`
    ///
    /// Any running session is stopped first. If the first verse cannot be
    /// played the new session ends as failed and the error is returned.
    pub async fn start(&mut self, chapter_id: u16, config: SessionConfig) -> Result<SessionSnapshot> {
        let chapter = catalog::chapter(chapter_id)?;
        config.validate(&chapter).map_err(Error::invalid_config)?;

        self.stop().await;
        self.controller.set_speed(config.playback_speed).await;

        let session = ActiveSession {
            id: Uuid::new_v4(),
            chapter_id,
            config,
            state: PlaybackState::initial(&config),
            expected: None,
            plays_started: 0,
            total_plays: total_plays(&config),
        };
        info!(
            "Session {} started: {} verses {}-{}, {} x{} ({} plays)",
            session.id,
            chapter.name,
            config.range.start,
            config.range.end,
            config.method,
            config.repeats_per_unit,
            session.total_plays
        );
        self.events.emit_lossy(HifzEvent::SessionStarted {
            session_id: session.id,
            chapter_id,
            config,
            total_plays: session.total_plays,
            timestamp: chrono::Utc::now(),
        });
        self.session = Some(session);

        self.play_current().await?;
        self.snapshot()
            .ok_or_else(|| Error::ServiceUnavailable("session ended during start".to_string()))
    }

    /// End the running session as stopped; no-op when idle
    pub async fn stop(&mut self) {
        if self.session.is_some() {
            self.finish(SessionOutcome::Stopped).await;
        } else {
            self.controller.stop().await;
        }
    }

    /// Change the reciter speed without interrupting the session
    pub async fn set_speed(&mut self, speed: f64) -> Result<()> {
        validate_speed(speed).map_err(Error::invalid_config)?;
        self.controller.set_speed(speed).await;
        if let Some(session) = self.session.as_mut() {
            session.config.playback_speed = speed;
        }
        debug!("Playback speed set to {}x", speed);
        self.events.emit_lossy(HifzEvent::SpeedChanged {
            speed,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Process one controller event
    pub async fn handle_event(&mut self, event: ControllerEvent) {
        let Some(session) = self.session.as_mut() else {
            debug!("Dropping {:?}: no active session", event);
            return;
        };
        let is_expected = session
            .expected
            .as_ref()
            .is_some_and(|handle| event.matches(handle));
        if !is_expected {
            debug!("Dropping stale event for request {}", event.request_id());
            return;
        }

        match event {
            ControllerEvent::Finished { .. } => match advance(&session.state, &session.config) {
                NextAction::PlayVerse { verse, state } => {
                    debug!(
                        "Session {}: {} loop {} -> verse {}",
                        session.id, state.phase, state.current_loop, verse
                    );
                    session.state = state;
                    // A failure here already ended the session
                    let _ = self.play_current().await;
                }
                NextAction::SessionComplete => {
                    self.finish(SessionOutcome::Completed).await;
                }
            },
            ControllerEvent::PlaybackFailed { reason, .. } => {
                self.finish(SessionOutcome::Failed { reason }).await;
            }
        }
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(ActiveSession::snapshot)
    }

    /// Verse whose audio is playing right now
    pub fn playing_verse(&self) -> Option<u16> {
        self.session
            .as_ref()
            .and_then(|s| s.expected.as_ref().map(|_| s.state.current_verse))
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Play `state.current_verse` of the running session
    async fn play_current(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.expected = None;
        let locator = self.source.locate(session.chapter_id, session.state.current_verse);

        match self.controller.play(locator).await {
            Ok(handle) => {
                session.expected = Some(handle);
                session.plays_started += 1;
                self.events.emit_lossy(HifzEvent::VerseStarted {
                    snapshot: session.snapshot(),
                    timestamp: chrono::Utc::now(),
                });
                Ok(())
            }
            Err(e) => {
                let reason = match &e {
                    Error::PlaybackFailed { reason, .. } => reason.clone(),
                    other => other.to_string(),
                };
                self.finish(SessionOutcome::Failed { reason }).await;
                Err(e)
            }
        }
    }

    async fn finish(&mut self, outcome: SessionOutcome) {
        self.controller.stop().await;
        let Some(session) = self.session.take() else {
            return;
        };

        match &outcome {
            SessionOutcome::Failed { reason } => {
                warn!("Session {} failed: {}", session.id, reason)
            }
            _ => info!(
                "Session {} {} after {} of {} plays",
                session.id, outcome, session.plays_started, session.total_plays
            ),
        }
        self.events.emit_lossy(HifzEvent::SessionEnded {
            session_id: session.id,
            outcome,
            plays_started: session.plays_started,
            timestamp: chrono::Utc::now(),
        });
    }
}

impl<B: AudioBackend> SessionControl for PlaybackOrchestrator<B> {
    fn is_active(&self) -> bool {
        PlaybackOrchestrator::is_active(self)
    }

    async fn stop(&mut self) {
        PlaybackOrchestrator::stop(self).await
    }
}
