//! # Hifz Audio Practice Library (hifz-ap)
//!
//! Automated, gapless repetition of recited verses for memorization.
//!
//! **Purpose:** Run practice sessions (Standard repetition or the Chain
//! method) over a verse range, play each verse through a single audio
//! resource, and expose control and live progress over HTTP/SSE.
//!
//! **Architecture:**
//! - `practice`: pure session state machine and validated config store
//! - `playback`: single-resource controller, session orchestrator, actor
//! - `audio`: reqwest + symphonia + cpal production backend
//! - `services`: verse text provider and LLM enrichment clients
//! - `api`: axum REST + SSE

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod practice;
pub mod services;
pub mod state;

pub use error::{Error, Result};
