//! Practice service actor
//!
//! A single tokio task owns the `SessionConfigStore` and the
//! `PlaybackOrchestrator`. UI commands (from HTTP handlers) and controller
//! events are processed one at a time, so the state machine never runs
//! concurrently with itself or with a configuration change.
//!
//! Handlers talk to the task through a cloneable `PracticeHandle`.

use crate::audio::backend::AudioBackend;
use crate::error::{Error, Result};
use crate::playback::events::ControllerEvent;
use crate::playback::orchestrator::PlaybackOrchestrator;
use crate::practice::config_store::{ConfigUpdate, SessionConfigStore};
use crate::practice::schedule::total_plays;
use hifz_common::catalog::{self, ChapterInfo};
use hifz_common::events::{EventBus, HifzEvent, SessionSnapshot};
use hifz_common::session::SessionConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Command queue depth
const COMMAND_CAPACITY: usize = 32;

/// Current parameters plus the running session, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeStatus {
    pub chapter: ChapterInfo,
    pub config: SessionConfig,
    /// Plays a session started now would perform
    pub total_plays: u32,
    pub session: Option<SessionSnapshot>,
}

/// Requests accepted by the practice service
#[derive(Debug)]
pub enum PracticeCommand {
    /// Start a session from the stored configuration
    Start {
        reply: oneshot::Sender<Result<SessionSnapshot>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    SetSpeed {
        speed: f64,
        reply: oneshot::Sender<Result<()>>,
    },
    UpdateConfig {
        update: ConfigUpdate,
        reply: oneshot::Sender<Result<PracticeStatus>>,
    },
    SelectChapter {
        chapter_id: u16,
        reply: oneshot::Sender<Result<PracticeStatus>>,
    },
    Status {
        reply: oneshot::Sender<PracticeStatus>,
    },
}

/// Cloneable client for the practice service
#[derive(Debug, Clone)]
pub struct PracticeHandle {
    tx: mpsc::Sender<PracticeCommand>,
}

impl PracticeHandle {
    pub async fn start(&self) -> Result<SessionSnapshot> {
        self.request(|reply| PracticeCommand::Start { reply }).await?
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| PracticeCommand::Stop { reply }).await
    }

    pub async fn set_speed(&self, speed: f64) -> Result<()> {
        self.request(|reply| PracticeCommand::SetSpeed { speed, reply })
            .await?
    }

    pub async fn update_config(&self, update: ConfigUpdate) -> Result<PracticeStatus> {
        self.request(|reply| PracticeCommand::UpdateConfig { update, reply })
            .await?
    }

    pub async fn select_chapter(&self, chapter_id: u16) -> Result<PracticeStatus> {
        self.request(|reply| PracticeCommand::SelectChapter { chapter_id, reply })
            .await?
    }

    pub async fn status(&self) -> Result<PracticeStatus> {
        self.request(|reply| PracticeCommand::Status { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> PracticeCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| service_gone())?;
        rx.await.map_err(|_| service_gone())
    }
}

fn service_gone() -> Error {
    Error::ServiceUnavailable("practice service has stopped".to_string())
}

/// Actor owning the store and the orchestrator
pub struct PracticeService<B: AudioBackend> {
    store: SessionConfigStore,
    orchestrator: PlaybackOrchestrator<B>,
    events: EventBus,
    commands: mpsc::Receiver<PracticeCommand>,
    controller_events: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl<B: AudioBackend> PracticeService<B> {
    /// Spawn the service task
    ///
    /// The task runs until every `PracticeHandle` is dropped, then stops any
    /// running session and exits.
    pub fn spawn(
        store: SessionConfigStore,
        orchestrator: PlaybackOrchestrator<B>,
        events: EventBus,
        controller_events: mpsc::UnboundedReceiver<ControllerEvent>,
    ) -> (PracticeHandle, JoinHandle<()>) {
        let (tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let service = Self {
            store,
            orchestrator,
            events,
            commands,
            controller_events,
        };
        let task = tokio::spawn(service.run());
        (PracticeHandle { tx }, task)
    }

    async fn run(mut self) {
        info!("Practice service started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(event) = self.controller_events.recv() => {
                    self.orchestrator.handle_event(event).await;
                }
            }
        }
        self.orchestrator.stop().await;
        info!("Practice service stopped");
    }

    async fn handle_command(&mut self, command: PracticeCommand) {
        match command {
            PracticeCommand::Start { reply } => {
                let result = self
                    .orchestrator
                    .start(self.store.chapter().id, self.store.config())
                    .await;
                let _ = reply.send(result);
            }
            PracticeCommand::Stop { reply } => {
                self.orchestrator.stop().await;
                let _ = reply.send(());
            }
            PracticeCommand::SetSpeed { speed, reply } => {
                let _ = reply.send(self.set_speed(speed).await);
            }
            PracticeCommand::UpdateConfig { update, reply } => {
                let _ = reply.send(self.update_config(update).await);
            }
            PracticeCommand::SelectChapter { chapter_id, reply } => {
                let _ = reply.send(self.select_chapter(chapter_id).await);
            }
            PracticeCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
        }
    }

    async fn set_speed(&mut self, speed: f64) -> Result<()> {
        self.orchestrator.set_speed(speed).await?;
        self.store.set_speed(speed)
    }

    async fn update_config(&mut self, update: ConfigUpdate) -> Result<PracticeStatus> {
        let previous_speed = self.store.config().playback_speed;
        self.store.apply(&mut self.orchestrator, update).await?;

        let speed = self.store.config().playback_speed;
        if speed != previous_speed {
            self.orchestrator.set_speed(speed).await?;
        }
        self.publish_config();
        Ok(self.status())
    }

    async fn select_chapter(&mut self, chapter_id: u16) -> Result<PracticeStatus> {
        let chapter = catalog::chapter(chapter_id)?;
        self.store.set_chapter(&mut self.orchestrator, chapter).await?;
        self.publish_config();
        Ok(self.status())
    }

    fn publish_config(&self) {
        debug!("Publishing configuration change");
        self.events.emit_lossy(HifzEvent::ConfigChanged {
            chapter: self.store.chapter().clone(),
            config: self.store.config(),
            timestamp: chrono::Utc::now(),
        });
    }

    fn status(&self) -> PracticeStatus {
        let config = self.store.config();
        PracticeStatus {
            chapter: self.store.chapter().clone(),
            config,
            total_plays: total_plays(&config),
            session: self.orchestrator.snapshot(),
        }
    }
}
