//! Practice schedule tests
//!
//! Whole-session play sequences for both methods, plus randomized checks
//! that every configuration terminates with the advertised number of plays.

use hifz_ap::practice::{advance, schedule, total_plays, NextAction};
use hifz_common::session::{Phase, PlaybackState, PracticeMethod, SessionConfig, VerseRange};
use proptest::prelude::*;

fn config(method: PracticeMethod, start: u16, end: u16, repeats: u32) -> SessionConfig {
    SessionConfig {
        range: VerseRange { start, end },
        method,
        repeats_per_unit: repeats,
        playback_speed: 1.0,
    }
}

fn plays(config: &SessionConfig) -> Vec<(Phase, u16)> {
    schedule(config)
        .map(|state| (state.phase, state.current_verse))
        .collect()
}

#[test]
fn test_chain_session_full_sequence() {
    use Phase::{Chain as C, Focus as F};

    let config = config(PracticeMethod::Chain, 1, 4, 2);
    let expected = vec![
        (F, 1), (F, 1),
        (F, 2), (F, 2),
        (C, 1), (C, 2), (C, 1), (C, 2),
        (F, 3), (F, 3),
        (C, 1), (C, 2), (C, 3), (C, 1), (C, 2), (C, 3),
        (F, 4), (F, 4),
        (C, 1), (C, 2), (C, 3), (C, 4), (C, 1), (C, 2), (C, 3), (C, 4),
    ];

    assert_eq!(plays(&config), expected);
    assert_eq!(total_plays(&config), 26);
}

#[test]
fn test_chain_session_not_starting_at_first_verse() {
    use Phase::{Chain as C, Focus as F};

    let config = config(PracticeMethod::Chain, 5, 6, 1);
    assert_eq!(plays(&config), vec![(F, 5), (F, 6), (C, 5), (C, 6)]);
}

#[test]
fn test_standard_session_full_sequence() {
    let config = config(PracticeMethod::Standard, 5, 7, 3);
    let verses: Vec<u16> = schedule(&config).map(|s| s.current_verse).collect();

    assert_eq!(verses, vec![5, 5, 5, 6, 6, 6, 7, 7, 7]);
    assert_eq!(total_plays(&config), 9);
}

#[test]
fn test_completion_is_terminal() {
    let config = config(PracticeMethod::Chain, 1, 2, 1);
    let last = schedule(&config).last().unwrap();

    assert_eq!(last.chain_end, 2);
    assert_eq!(advance(&last, &config), NextAction::SessionComplete);
}

#[test]
fn test_long_chain_total_fits() {
    // Al-Baqarah, every verse, many repeats
    let config = config(PracticeMethod::Chain, 1, 286, 10);
    assert_eq!(total_plays(&config), 10 * 286 + 10 * (286 * 287 / 2 - 1));
}

fn method() -> impl Strategy<Value = PracticeMethod> {
    prop_oneof![Just(PracticeMethod::Standard), Just(PracticeMethod::Chain)]
}

proptest! {
    #[test]
    fn prop_schedule_length_matches_total(
        method in method(),
        start in 1u16..20,
        len in 1u16..12,
        repeats in 1u32..5,
    ) {
        let config = config(method, start, start + len - 1, repeats);
        prop_assert_eq!(schedule(&config).count(), total_plays(&config) as usize);
    }

    #[test]
    fn prop_plays_stay_inside_range_and_chain(
        method in method(),
        start in 1u16..20,
        len in 1u16..12,
        repeats in 1u32..5,
    ) {
        let config = config(method, start, start + len - 1, repeats);
        for state in schedule(&config) {
            prop_assert!(config.range.contains(state.current_verse));
            prop_assert!(state.current_loop < repeats);
            if method == PracticeMethod::Chain {
                prop_assert!(state.current_verse <= state.chain_end);
                if state.phase == Phase::Focus {
                    prop_assert_eq!(state.current_verse, state.chain_end);
                }
            }
        }
    }

    #[test]
    fn prop_every_verse_focused_repeats_times(
        start in 1u16..20,
        len in 1u16..12,
        repeats in 1u32..5,
    ) {
        let config = config(PracticeMethod::Chain, start, start + len - 1, repeats);
        let focus: Vec<PlaybackState> = schedule(&config)
            .filter(|s| s.phase == Phase::Focus)
            .collect();
        prop_assert_eq!(focus.len(), len as usize * repeats as usize);
        for verse in config.range.start..=config.range.end {
            let count = focus.iter().filter(|s| s.current_verse == verse).count();
            prop_assert_eq!(count, repeats as usize);
        }
    }
}
