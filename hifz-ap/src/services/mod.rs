//! External collaborators
//!
//! Thin clients behind traits so the API layer can be tested with fakes.

pub mod enrichment;
pub mod verse_provider;

pub use enrichment::{Enrichment, GeminiClient};
pub use verse_provider::{AlQuranCloudClient, VerseProvider};
