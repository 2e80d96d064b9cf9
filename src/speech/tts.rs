//! Text-to-speech over the `translate_tts` protocol
//!
//! The endpoint speaks at most about 100 characters per request, so replies
//! are split on whitespace and the MP3 pieces concatenated.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Longest text sent in one synthesis request
pub const MAX_CHUNK_CHARS: usize = 100;

/// Languages offered for spoken replies
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
];

/// Display name for a supported language code
pub fn language_name(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Reply text could not be converted to audio
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("speech synthesis failed: {0}")]
pub struct SynthesisError(pub String);

/// Converts reply text into audio bytes
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// Configuration for spoken replies
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TTSConfig {
    /// Synthesize every reply
    pub enabled: bool,

    /// Base URL of the synthesis server
    pub base_url: String,

    /// Language code for synthesized speech
    pub language: String,

    /// Directory receiving reply audio files
    pub output_dir: PathBuf,

    /// Seconds to wait for each synthesis request
    pub timeout_secs: u64,
}

impl Default for TTSConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://translate.google.com".to_string(),
            language: "en".to_string(),
            output_dir: PathBuf::from("speech"),
            timeout_secs: 30,
        }
    }
}

impl TTSConfig {
    pub fn validate(&self) -> Result<(), String> {
        if language_name(&self.language).is_none() {
            return Err(format!("unsupported speech language: {}", self.language));
        }
        Ok(())
    }
}

/// Split `text` into pieces of at most `max_chars` characters, breaking on
/// whitespace where possible
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len > 0 && current_len + 1 + word_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if word_len > max_chars {
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(max_chars).peekable();
            while let Some(piece) = pieces.next() {
                let piece: String = piece.iter().collect();
                if pieces.peek().is_some() {
                    chunks.push(piece);
                } else {
                    current_len = piece.chars().count();
                    current = piece;
                }
            }
            continue;
        }

        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Synthesizer speaking the `translate_tts` protocol, returning MP3 bytes
#[derive(Clone, Debug)]
pub struct HttpSynthesizer {
    client: Client,
    config: TTSConfig,
}

impl HttpSynthesizer {
    pub fn new(config: TTSConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                crate::MurmurError::ConfigError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/translate_tts", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextToSpeech for HttpSynthesizer {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError> {
        if language_name(language).is_none() {
            return Err(SynthesisError(format!("unsupported language: {}", language)));
        }

        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SynthesisError("nothing to speak".to_string()));
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();

            let response = self
                .client
                .get(self.endpoint())
                .timeout(Duration::from_secs(self.config.timeout_secs.max(1)))
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", language),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await
                .map_err(|e| SynthesisError(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                warn!("Synthesis request {} of {} failed with {}", idx, total, status);
                return Err(SynthesisError(format!("service answered {}", status)));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| SynthesisError(e.to_string()))?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(SynthesisError("service returned no audio".to_string()));
        }

        debug!("Synthesized {} bytes of audio in {} requests", audio.len(), total);
        Ok(audio)
    }
}
