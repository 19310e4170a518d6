//! Verse text provider
//!
//! Fetches a chapter's Arabic text with English and Tamil translations from
//! the alquran.cloud API in a single request (three editions) and zips the
//! editions verse by verse.

use crate::error::{Error, Result};
use futures::future::{BoxFuture, FutureExt};
use hifz_common::quran::{Chapter, Verse};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Editions requested, in response order: Arabic, English, Tamil
const EDITIONS: &str = "quran-uthmani,en.sahih,ta.tamil";

/// Source of chapter text and translations
pub trait VerseProvider: Send + Sync {
    fn get_chapter(&self, chapter_id: u16) -> BoxFuture<'_, Result<Chapter>>;
}

/// alquran.cloud HTTP client
#[derive(Debug, Clone)]
pub struct AlQuranCloudClient {
    client: reqwest::Client,
    api_base: String,
    timeout: Duration,
}

impl AlQuranCloudClient {
    pub fn new(client: reqwest::Client, api_base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn chapter_url(&self, chapter_id: u16) -> String {
        format!("{}/surah/{}/editions/{}", self.api_base, chapter_id, EDITIONS)
    }

    async fn fetch(&self, chapter_id: u16) -> Result<Chapter> {
        let url = self.chapter_url(chapter_id);
        debug!("Fetching chapter {} from {}", chapter_id, url);

        let response: EditionsResponse = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Invalid response: {}", e)))?;

        parse_editions(chapter_id, response)
    }
}

impl VerseProvider for AlQuranCloudClient {
    fn get_chapter(&self, chapter_id: u16) -> BoxFuture<'_, Result<Chapter>> {
        self.fetch(chapter_id).boxed()
    }
}

#[derive(Debug, Deserialize)]
pub struct EditionsResponse {
    code: u16,
    #[serde(default)]
    status: String,
    /// Edition list on success, an error message otherwise
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Edition {
    name: String,
    english_name: String,
    revelation_type: String,
    number_of_ayahs: u16,
    ayahs: Vec<Ayah>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ayah {
    number_in_surah: u16,
    text: String,
}

/// Zip the Arabic, English and Tamil editions into one `Chapter`
pub fn parse_editions(chapter_id: u16, response: EditionsResponse) -> Result<Chapter> {
    if response.code != 200 {
        return Err(Error::Provider(format!(
            "Chapter {} request returned {} {}",
            chapter_id, response.code, response.status
        )));
    }

    let editions: Vec<Edition> = serde_json::from_value(response.data)
        .map_err(|e| Error::Provider(format!("Invalid chapter {} data: {}", chapter_id, e)))?;
    let mut editions = editions.into_iter();
    let (Some(arabic), Some(english), Some(tamil)) =
        (editions.next(), editions.next(), editions.next())
    else {
        return Err(Error::Provider(format!(
            "Chapter {} response is missing editions",
            chapter_id
        )));
    };

    if english.ayahs.len() != arabic.ayahs.len() || tamil.ayahs.len() != arabic.ayahs.len() {
        return Err(Error::Provider(format!(
            "Chapter {} editions disagree on verse count",
            chapter_id
        )));
    }

    let verses = arabic
        .ayahs
        .into_iter()
        .zip(english.ayahs)
        .zip(tamil.ayahs)
        .map(|((ar, en), ta)| Verse {
            number: ar.number_in_surah,
            text: ar.text,
            translation_en: en.text,
            translation_ta: ta.text,
        })
        .collect();

    Ok(Chapter {
        id: chapter_id,
        name: english.english_name,
        name_ar: arabic.name,
        revelation_type: arabic.revelation_type,
        verse_count: arabic.number_of_ayahs,
        verses,
    })
}
