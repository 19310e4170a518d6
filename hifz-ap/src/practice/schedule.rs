//! Practice session state machine
//!
//! Pure transition logic for the two repetition methods. Given the current
//! `PlaybackState` and the session's `SessionConfig`, `advance` decides what
//! plays after the current verse finishes. No I/O, fully deterministic.
//!
//! **Standard:** each verse is repeated `repeats_per_unit` times, then the
//! next verse starts.
//!
//! **Chain:** the newest verse (`chain_end`) is drilled alone (focus phase),
//! then the whole run `start..=chain_end` is recited `repeats_per_unit` times
//! (chain phase), then the next verse becomes the focus. The first focus verse
//! has nothing before it to chain with and skips the chain phase.

use hifz_common::session::{Phase, PlaybackState, PracticeMethod, SessionConfig};

/// Outcome of one "verse finished" transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// Play `verse`; `state` replaces the session state
    PlayVerse { verse: u16, state: PlaybackState },
    /// Every unit has been played the configured number of times
    SessionComplete,
}

/// Compute the transition after the verse described by `state` finished playing
pub fn advance(state: &PlaybackState, config: &SessionConfig) -> NextAction {
    match config.method {
        PracticeMethod::Standard => advance_standard(state, config),
        PracticeMethod::Chain => match state.phase {
            Phase::Focus => advance_focus_phase(state, config),
            Phase::Chain => advance_chain_phase(state, config),
        },
    }
}

fn play(state: PlaybackState) -> NextAction {
    NextAction::PlayVerse {
        verse: state.current_verse,
        state,
    }
}

fn advance_standard(state: &PlaybackState, config: &SessionConfig) -> NextAction {
    if state.current_loop + 1 < config.repeats_per_unit {
        return play(PlaybackState {
            current_loop: state.current_loop + 1,
            ..*state
        });
    }
    if state.current_verse < config.range.end {
        return play(PlaybackState {
            current_loop: 0,
            current_verse: state.current_verse + 1,
            ..*state
        });
    }
    NextAction::SessionComplete
}

fn advance_focus_phase(state: &PlaybackState, config: &SessionConfig) -> NextAction {
    if state.current_loop + 1 < config.repeats_per_unit {
        return play(PlaybackState {
            current_loop: state.current_loop + 1,
            current_verse: state.chain_end,
            ..*state
        });
    }
    if state.chain_end == config.range.start {
        return advance_focus(state, config);
    }
    play(PlaybackState {
        phase: Phase::Chain,
        current_loop: 0,
        current_verse: config.range.start,
        ..*state
    })
}

fn advance_chain_phase(state: &PlaybackState, config: &SessionConfig) -> NextAction {
    if state.current_verse < state.chain_end {
        return play(PlaybackState {
            current_verse: state.current_verse + 1,
            ..*state
        });
    }
    if state.current_loop + 1 < config.repeats_per_unit {
        return play(PlaybackState {
            current_loop: state.current_loop + 1,
            current_verse: config.range.start,
            ..*state
        });
    }
    advance_focus(state, config)
}

/// Introduce the next verse as the focus, or finish at the end of the range
fn advance_focus(state: &PlaybackState, config: &SessionConfig) -> NextAction {
    if state.chain_end < config.range.end {
        let chain_end = state.chain_end + 1;
        return play(PlaybackState {
            phase: Phase::Focus,
            chain_end,
            current_loop: 0,
            current_verse: chain_end,
        });
    }
    NextAction::SessionComplete
}

/// Number of plays a session performs from start to completion
///
/// Standard: `n * r`. Chain: every verse is focused `r` times, and each verse
/// after the first adds a chain of length `k` recited `r` times, giving
/// `r * n + r * (n(n+1)/2 - 1)`.
pub fn total_plays(config: &SessionConfig) -> u32 {
    let n = u64::from(config.range.len());
    let r = u64::from(config.repeats_per_unit);
    let total = match config.method {
        PracticeMethod::Standard => n * r,
        PracticeMethod::Chain => r * n + r * (n * (n + 1) / 2).saturating_sub(1),
    };
    u32::try_from(total).unwrap_or(u32::MAX)
}

/// Display label for the unit being drilled
pub fn unit_label(state: &PlaybackState, config: &SessionConfig) -> String {
    match (config.method, state.phase) {
        (PracticeMethod::Standard, _) => {
            format!("Ayah {} of {}", state.current_verse, config.range.end)
        }
        (PracticeMethod::Chain, Phase::Focus) => format!("Focusing: Ayah {}", state.chain_end),
        (PracticeMethod::Chain, Phase::Chain) => {
            format!("Chaining: {} → {}", config.range.start, state.chain_end)
        }
    }
}

/// Every play of a session, in order, as the state at which it plays
///
/// The verse of each play is `state.current_verse`.
pub fn schedule(config: &SessionConfig) -> Schedule {
    Schedule {
        config: *config,
        next: Some(PlaybackState::initial(config)),
    }
}

/// Iterator returned by [`schedule`]
#[derive(Debug, Clone)]
pub struct Schedule {
    config: SessionConfig,
    next: Option<PlaybackState>,
}

impl Iterator for Schedule {
    type Item = PlaybackState;

    fn next(&mut self) -> Option<PlaybackState> {
        let current = self.next.take()?;
        self.next = match advance(&current, &self.config) {
            NextAction::PlayVerse { state, .. } => Some(state),
            NextAction::SessionComplete => None,
        };
        Some(current)
    }
}
