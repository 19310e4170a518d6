//! LLM enrichment oracle
//!
//! Word-by-word glosses, tajweed annotations, recitation feedback, voice
//! transcription and memorization tips from the Gemini `generateContent`
//! REST endpoint. Responses are treated as opaque text (or JSON for the
//! structured prompts); nothing here grades recitation itself.
//!
//! Failure policy:
//! - `word_by_word`, `tajweed_rules`: empty list, logged
//! - `transcribe`: empty string, logged
//! - `recitation_feedback`, `hifz_tips`: `Error::Enrichment`

use crate::error::{Error, Result};
use futures::future::{BoxFuture, FutureExt};
use hifz_common::config::EnrichmentConfig;
use hifz_common::quran::{TajweedRule, Word};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// MIME type of audio recorded by clients
const RECORDING_MIME_TYPE: &str = "audio/webm";

const FEEDBACK_FALLBACK: &str = "Could not analyze recitation. Please try again.";
const TIPS_FALLBACK: &str = "Tips unavailable at the moment.";

/// Opaque language-model helper
pub trait Enrichment: Send + Sync {
    fn word_by_word<'a>(&'a self, verse_text: &'a str) -> BoxFuture<'a, Vec<Word>>;

    fn tajweed_rules<'a>(&'a self, verse_text: &'a str) -> BoxFuture<'a, Vec<TajweedRule>>;

    fn recitation_feedback<'a>(
        &'a self,
        audio_base64: &'a str,
        verse_text: &'a str,
        chapter_name: &'a str,
    ) -> BoxFuture<'a, Result<String>>;

    fn transcribe<'a>(&'a self, audio_base64: &'a str) -> BoxFuture<'a, String>;

    fn hifz_tips<'a>(&'a self, chapter_name: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Gemini REST client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    audio_model: String,
}

impl GeminiClient {
    /// Build a client, or None when no API key is configured
    pub fn from_config(client: reqwest::Client, config: &EnrichmentConfig) -> Option<Self> {
        let api_key = config.api_key.as_ref().filter(|k| !k.trim().is_empty())?;
        Some(Self {
            client,
            api_key: api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            audio_model: config.audio_model.clone(),
        })
    }

    async fn generate(&self, model: &str, request: GenerateRequest) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.api_base, model);
        debug!("Enrichment request to {}", model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Enrichment(format!("Request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::Enrichment(format!("Request rejected: {}", e)))?
            .json::<GenerateResponse>()
            .await
            .map_err(|e| Error::Enrichment(format!("Invalid response: {}", e)))?;

        Ok(response.text())
    }

    async fn generate_json<T: DeserializeOwned>(&self, prompt: String, schema: Value) -> Result<T> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            }),
        };
        let text = self.generate(&self.model, request).await?;
        serde_json::from_str(&text).map_err(|e| Error::Enrichment(format!("Malformed JSON: {}", e)))
    }

    async fn generate_with_audio(&self, audio_base64: &str, prompt: String) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::audio(audio_base64), Part::text(prompt)],
            }],
            generation_config: None,
        };
        self.generate(&self.audio_model, request).await
    }
}

impl Enrichment for GeminiClient {
    fn word_by_word<'a>(&'a self, verse_text: &'a str) -> BoxFuture<'a, Vec<Word>> {
        async move {
            let prompt = format!(
                "Break down the following Arabic Ayah into individual words and provide their \
                 English and Tamil translations. Format your response as a JSON array of objects \
                 with properties: \"arabic\", \"english\", \"tamil\".\nAyah: \"{}\"",
                verse_text
            );
            self.generate_json(prompt, word_schema())
                .await
                .unwrap_or_else(|e| {
                    warn!("Word-by-word enrichment failed: {}", e);
                    Vec::new()
                })
        }
        .boxed()
    }

    fn tajweed_rules<'a>(&'a self, verse_text: &'a str) -> BoxFuture<'a, Vec<TajweedRule>> {
        async move {
            let prompt = format!(
                "List the Tajweed rules that apply when reciting the following Arabic Ayah. For \
                 each rule give its name, a short explanation in English and in Tamil, and the \
                 exact Arabic words it applies to. Format your response as a JSON array of \
                 objects with properties: \"rule\", \"explanation_en\", \"explanation_ta\", \
                 \"location\".\nAyah: \"{}\"",
                verse_text
            );
            self.generate_json(prompt, tajweed_schema())
                .await
                .unwrap_or_else(|e| {
                    warn!("Tajweed enrichment failed: {}", e);
                    Vec::new()
                })
        }
        .boxed()
    }

    fn recitation_feedback<'a>(
        &'a self,
        audio_base64: &'a str,
        verse_text: &'a str,
        chapter_name: &'a str,
    ) -> BoxFuture<'a, Result<String>> {
        async move {
            let prompt = format!(
                "You are a certified Tajweed and Quran teacher. The user is reciting: \"{}\" from \
                 Surah {}.\nAnalyze the audio for:\n1. Correctness of words (Tartil).\n2. Tajweed \
                 rules (Makhraj, Sifat, Noon/Meem Sakinah).\n3. Fluency.\nProvide detailed \
                 feedback in English and Tamil. If they made a mistake, point it out gently.",
                verse_text, chapter_name
            );
            let text = self.generate_with_audio(audio_base64, prompt).await?;
            Ok(non_empty_or(text, FEEDBACK_FALLBACK))
        }
        .boxed()
    }

    fn transcribe<'a>(&'a self, audio_base64: &'a str) -> BoxFuture<'a, String> {
        async move {
            let prompt = "Transcribe the following audio which contains a search query for the \
                          Quran. It might be a topic, a verse snippet, or a surah name in English, \
                          Arabic, or Tamil. Return ONLY the transcribed text in English or Arabic \
                          script as appropriate. Do not include any other text."
                .to_string();
            match self.generate_with_audio(audio_base64, prompt).await {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    warn!("Transcription failed: {}", e);
                    String::new()
                }
            }
        }
        .boxed()
    }

    fn hifz_tips<'a>(&'a self, chapter_name: &'a str) -> BoxFuture<'a, Result<String>> {
        async move {
            let prompt = format!(
                "Provide practical Hifz (memorization) tips specifically for Surah {}. Include \
                 psychological techniques, repetition patterns, and spiritual advice. Provide the \
                 output in both English and Tamil clearly separated.",
                chapter_name
            );
            let request = GenerateRequest {
                contents: vec![Content {
                    parts: vec![Part::text(prompt)],
                }],
                generation_config: None,
            };
            let text = self.generate(&self.model, request).await?;
            Ok(non_empty_or(text, TIPS_FALLBACK))
        }
        .boxed()
    }
}

fn non_empty_or(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

fn word_schema() -> Value {
    string_object_array(&["arabic", "english", "tamil"])
}

fn tajweed_schema() -> Value {
    string_object_array(&["rule", "explanation_en", "explanation_ta", "location"])
}

/// Response schema: array of objects whose listed properties are all strings
fn string_object_array(fields: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|f| (f.to_string(), json!({ "type": "STRING" })))
        .collect();
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": properties,
            "required": fields,
        }
    })
}

// ========================================
// Wire types
// ========================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            ..Self::default()
        }
    }

    fn audio(data_base64: &str) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: RECORDING_MIME_TYPE.to_string(),
                data: data_base64.to_string(),
            }),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
