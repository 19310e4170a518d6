//! Practice session logic
//!
//! - `schedule`: the Standard / Chain repetition state machine
//! - `config_store`: validated, user-adjustable session parameters

pub mod config_store;
pub mod schedule;

pub use config_store::{ConfigUpdate, SessionConfigStore, SessionControl};
pub use schedule::{advance, schedule, total_plays, unit_label, NextAction, Schedule};
