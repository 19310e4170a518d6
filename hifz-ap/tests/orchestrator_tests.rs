//! Playback orchestrator tests
//!
//! Whole sessions driven through the scripted backend: each test ends the
//! playing verse by hand and feeds the resulting controller event back into
//! the orchestrator, the way the practice service does.

mod helpers;

use helpers::MockBackend;
use hifz_ap::playback::{AudioResourceController, ControllerEvent, PlaybackOrchestrator};
use hifz_ap::practice::{schedule, SessionConfigStore};
use hifz_ap::Error;
use hifz_common::catalog;
use hifz_common::events::{EventBus, HifzEvent, SessionOutcome};
use hifz_common::session::{PracticeMethod, SessionConfig, VerseRange};
use hifz_common::{AudioLocator, RecitationSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedReceiver;

const TIMEOUT: Duration = Duration::from_secs(2);
const BASE: &str = "mock://recitations";

struct Harness {
    backend: MockBackend,
    orchestrator: PlaybackOrchestrator<MockBackend>,
    controller_events: UnboundedReceiver<ControllerEvent>,
    bus: broadcast::Receiver<HifzEvent>,
}

impl Harness {
    fn new() -> Self {
        let backend = MockBackend::new();
        let (controller, controller_events) = AudioResourceController::new(backend.clone(), TIMEOUT);
        let events = EventBus::new(256);
        let bus = events.subscribe();
        let orchestrator = PlaybackOrchestrator::new(
            Arc::new(controller),
            RecitationSource::new(BASE),
            events,
        );
        Self {
            backend,
            orchestrator,
            controller_events,
            bus,
        }
    }

    /// End the playing verse and hand its event to the orchestrator
    async fn finish_verse(&mut self) {
        assert!(self.backend.finish_current().is_some(), "nothing playing");
        let event = self.next_controller_event().await;
        self.orchestrator.handle_event(event).await;
    }

    async fn next_controller_event(&mut self) -> ControllerEvent {
        tokio::time::timeout(TIMEOUT, self.controller_events.recv())
            .await
            .expect("controller event")
            .expect("controller channel open")
    }

    /// Run the session to its end, one verse at a time
    async fn run_to_end(&mut self) {
        while self.orchestrator.is_active() {
            self.finish_verse().await;
        }
    }

    fn published(&mut self) -> Vec<HifzEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.bus.try_recv() {
            events.push(event);
        }
        events
    }

    /// Verses started so far, from the locators handed to the backend
    fn started_verses(&self) -> Vec<u16> {
        self.backend
            .started()
            .iter()
            .map(|locator| verse_of(locator))
            .collect()
    }
}

fn verse_of(locator: &AudioLocator) -> u16 {
    // .../CCCVVV.mp3
    let name = locator.as_str().rsplit('/').next().unwrap();
    name[3..6].parse().unwrap()
}

fn locator(chapter: u16, verse: u16) -> AudioLocator {
    RecitationSource::new(BASE).locate(chapter, verse)
}

fn config(method: PracticeMethod, start: u16, end: u16, repeats: u32) -> SessionConfig {
    SessionConfig {
        range: VerseRange { start, end },
        method,
        repeats_per_unit: repeats,
        playback_speed: 1.0,
    }
}

fn outcomes(events: &[HifzEvent]) -> Vec<SessionOutcome> {
    events
        .iter()
        .filter_map(|event| match event {
            HifzEvent::SessionEnded { outcome, .. } => Some(outcome.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_standard_session_completes() {
    let mut h = Harness::new();

    let snapshot = h
        .orchestrator
        .start(1, config(PracticeMethod::Standard, 1, 2, 2))
        .await
        .unwrap();
    assert_eq!(snapshot.playing_verse, Some(1));
    assert_eq!(snapshot.plays_started, 1);
    assert_eq!(snapshot.total_plays, 4);
    assert_eq!(snapshot.unit_label, "Ayah 1 of 2");

    h.run_to_end().await;

    assert_eq!(h.started_verses(), vec![1, 1, 2, 2]);
    assert!(!h.orchestrator.is_active());
    assert_eq!(h.backend.playing(), 0);

    let events = h.published();
    assert!(matches!(events.first(), Some(HifzEvent::SessionStarted { total_plays: 4, .. })));
    let verse_events = events
        .iter()
        .filter(|e| matches!(e, HifzEvent::VerseStarted { .. }))
        .count();
    assert_eq!(verse_events, 4);
    match events.last() {
        Some(HifzEvent::SessionEnded {
            outcome,
            plays_started,
            ..
        }) => {
            assert_eq!(*outcome, SessionOutcome::Completed);
            assert_eq!(*plays_started, 4);
        }
        other => panic!("expected SessionEnded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chain_session_plays_full_schedule() {
    let mut h = Harness::new();
    let config = config(PracticeMethod::Chain, 1, 4, 2);

    h.orchestrator.start(1, config).await.unwrap();
    h.run_to_end().await;

    let expected: Vec<u16> = schedule(&config).map(|s| s.current_verse).collect();
    assert_eq!(expected.len(), 26);
    assert_eq!(h.started_verses(), expected);
    assert_eq!(outcomes(&h.published()), vec![SessionOutcome::Completed]);
}

#[tokio::test]
async fn test_verse_started_tracks_chain_labels() {
    let mut h = Harness::new();
    h.orchestrator
        .start(1, config(PracticeMethod::Chain, 1, 2, 1))
        .await
        .unwrap();
    h.run_to_end().await;

    let labels: Vec<String> = h
        .published()
        .into_iter()
        .filter_map(|event| match event {
            HifzEvent::VerseStarted { snapshot, .. } => Some(snapshot.unit_label),
            _ => None,
        })
        .collect();
    assert_eq!(
        labels,
        vec![
            "Focusing: Ayah 1",
            "Focusing: Ayah 2",
            "Chaining: 1 → 2",
            "Chaining: 1 → 2"
        ]
    );
}

#[tokio::test]
async fn test_stale_finished_does_not_advance_new_session() {
    let mut h = Harness::new();
    let standard = config(PracticeMethod::Standard, 1, 3, 1);

    h.orchestrator.start(1, standard).await.unwrap();
    // Verse 1 of the first session ends, but its event is not handled yet
    h.backend.finish_current();
    let stale = h.next_controller_event().await;

    h.orchestrator.start(1, standard).await.unwrap();
    h.orchestrator.handle_event(stale).await;

    let snapshot = h.orchestrator.snapshot().unwrap();
    assert_eq!(snapshot.plays_started, 1);
    assert_eq!(snapshot.playing_verse, Some(1));
    assert_eq!(h.started_verses(), vec![1, 1]);

    // The replaced session ended as stopped
    assert_eq!(outcomes(&h.published()), vec![SessionOutcome::Stopped]);
}

#[tokio::test]
async fn test_event_for_unknown_request_is_dropped() {
    let mut h = Harness::new();
    h.orchestrator
        .start(1, config(PracticeMethod::Standard, 1, 3, 1))
        .await
        .unwrap();

    h.orchestrator
        .handle_event(ControllerEvent::Finished {
            request_id: 999,
            locator: locator(1, 1),
        })
        .await;
    h.orchestrator
        .handle_event(ControllerEvent::PlaybackFailed {
            request_id: 999,
            locator: locator(1, 1),
            reason: "not ours".to_string(),
        })
        .await;

    assert!(h.orchestrator.is_active());
    assert_eq!(h.started_verses(), vec![1]);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let mut h = Harness::new();

    h.orchestrator.stop().await;
    assert!(h.published().is_empty());

    h.orchestrator
        .start(1, config(PracticeMethod::Standard, 1, 3, 1))
        .await
        .unwrap();
    h.orchestrator.stop().await;
    h.orchestrator.stop().await;

    assert!(!h.orchestrator.is_active());
    assert!(h.orchestrator.snapshot().is_none());
    assert_eq!(h.backend.playing(), 0);
    assert_eq!(outcomes(&h.published()), vec![SessionOutcome::Stopped]);
}

#[tokio::test]
async fn test_acquire_failure_mid_session_fails_session() {
    let mut h = Harness::new();
    h.backend.fail_on(&locator(1, 2));

    h.orchestrator
        .start(1, config(PracticeMethod::Standard, 1, 2, 1))
        .await
        .unwrap();
    h.finish_verse().await;

    assert!(!h.orchestrator.is_active());
    assert_eq!(h.backend.playing(), 0);
    match outcomes(&h.published()).as_slice() {
        [SessionOutcome::Failed { reason }] => {
            assert!(reason.contains("scripted failure"), "reason: {}", reason)
        }
        other => panic!("expected one failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_first_verse_failure_fails_start() {
    let mut h = Harness::new();
    h.backend.fail_on(&locator(1, 1));

    let err = h
        .orchestrator
        .start(1, config(PracticeMethod::Chain, 1, 3, 2))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PlaybackFailed { .. }));
    assert!(!h.orchestrator.is_active());

    let events = h.published();
    assert!(matches!(events.first(), Some(HifzEvent::SessionStarted { .. })));
    assert!(matches!(
        outcomes(&events).as_slice(),
        [SessionOutcome::Failed { .. }]
    ));
}

#[tokio::test]
async fn test_runtime_failure_fails_session() {
    let mut h = Harness::new();
    h.orchestrator
        .start(1, config(PracticeMethod::Standard, 1, 3, 1))
        .await
        .unwrap();

    h.backend.fail_current("decoder crashed");
    let event = h.next_controller_event().await;
    h.orchestrator.handle_event(event).await;

    assert!(!h.orchestrator.is_active());
    assert_eq!(
        outcomes(&h.published()),
        vec![SessionOutcome::Failed {
            reason: "decoder crashed".to_string()
        }]
    );
}

#[tokio::test]
async fn test_invalid_start_is_rejected_without_events() {
    let mut h = Harness::new();

    // Al-Fatihah has seven verses
    let err = h
        .orchestrator
        .start(1, config(PracticeMethod::Standard, 1, 9, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));

    let err = h
        .orchestrator
        .start(1, config(PracticeMethod::Standard, 5, 3, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));

    let err = h
        .orchestrator
        .start(1, config(PracticeMethod::Chain, 4, 2, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));

    let err = h
        .orchestrator
        .start(1, config(PracticeMethod::Standard, 1, 3, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));

    assert!(h.orchestrator.start(115, config(PracticeMethod::Standard, 1, 1, 1)).await.is_err());

    assert!(!h.orchestrator.is_active());
    assert!(h.backend.started().is_empty());
    assert!(h.published().is_empty());
}

#[tokio::test]
async fn test_speed_change_keeps_session_running() {
    let mut h = Harness::new();
    h.orchestrator
        .start(1, config(PracticeMethod::Standard, 1, 3, 2))
        .await
        .unwrap();

    h.orchestrator.set_speed(1.5).await.unwrap();
    assert!(h.orchestrator.is_active());
    assert_eq!(h.backend.last_speed(), Some(1.5));
    assert_eq!(h.orchestrator.snapshot().unwrap().config.playback_speed, 1.5);

    let err = h.orchestrator.set_speed(0.0).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert_eq!(h.backend.last_speed(), Some(1.5));

    // The next verse starts at the new speed
    h.finish_verse().await;
    assert_eq!(h.backend.last_speed(), Some(1.5));
    assert!(outcomes(&h.published()).is_empty());
}

#[tokio::test]
async fn test_config_change_stops_session_before_commit() {
    let mut h = Harness::new();
    let chapter = catalog::chapter(1).unwrap();
    let mut store = SessionConfigStore::for_chapter(chapter, PracticeMethod::Chain, 2, 1.0).unwrap();

    h.orchestrator.start(1, store.config()).await.unwrap();

    // Rejected change leaves the session alone
    assert!(store.set_range(&mut h.orchestrator, 4, 2).await.is_err());
    assert!(h.orchestrator.is_active());

    store.set_range(&mut h.orchestrator, 2, 3).await.unwrap();
    assert!(!h.orchestrator.is_active());
    assert_eq!(store.config().range, VerseRange { start: 2, end: 3 });
    assert_eq!(outcomes(&h.published()), vec![SessionOutcome::Stopped]);

    // Next session picks up the committed range
    let snapshot = h.orchestrator.start(1, store.config()).await.unwrap();
    assert_eq!(snapshot.playing_verse, Some(2));
}

#[tokio::test]
async fn test_chapter_switch_stops_session_and_clamps() {
    let mut h = Harness::new();
    let mut store = SessionConfigStore::for_chapter(
        catalog::chapter(2).unwrap(),
        PracticeMethod::Standard,
        1,
        1.0,
    )
    .unwrap();
    store.set_range(&mut h.orchestrator, 10, 20).await.unwrap();

    h.orchestrator.start(2, store.config()).await.unwrap();
    store
        .set_chapter(&mut h.orchestrator, catalog::chapter(108).unwrap())
        .await
        .unwrap();

    assert!(!h.orchestrator.is_active());
    assert_eq!(store.chapter().id, 108);
    assert_eq!(store.config().range, VerseRange { start: 3, end: 3 });
}
