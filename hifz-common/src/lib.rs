//! # Hifz Common Library
//!
//! Shared code for the Hifz practice service and its clients:
//! - Chapter catalog (names, verse counts, juz boundaries)
//! - Verse records and enrichment types
//! - Practice session types and the event bus
//! - Audio locator resolution
//! - Progress book (memorized / recited verses)
//! - Recitation review history
//! - Configuration loading

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod locator;
mod persist;
pub mod progress;
pub mod quran;
pub mod reviews;
pub mod session;

pub use error::{Error, Result};
pub use locator::{AudioLocator, RecitationSource};
