//! Speech-to-text
//!
//! [`HttpTranscriber`] posts WAV audio to any server exposing the
//! OpenAI-compatible `/v1/audio/transcriptions` endpoint (faster-whisper,
//! whisper.cpp server, LocalAI and friends). Utterances are decoded locally
//! first and uploaded as 16 kHz mono.

use crate::audio::{encode_wav, prepare_for_speech, AudioData, SPEECH_SAMPLE_RATE};
use crate::{MurmurError, Result as MurmurResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Why an utterance produced no text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// Audio was present but no speech could be made out
    #[error("speech was not understood")]
    Unrecognized,

    /// Transport or service failure
    #[error("speech recognition service error: {0}")]
    Service(String),
}

/// Converts recorded audio into text
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe a WAV-encoded utterance
    async fn transcribe(&self, audio: &[u8]) -> Result<String, RecognitionError>;
}

/// Which recognizer handles spoken input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SttBackend {
    #[default]
    Http,
    /// In-process Whisper, available with the `whisper` feature
    Whisper,
}

/// Configuration for the HTTP transcriber
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct STTConfig {
    pub backend: SttBackend,

    /// Base URL of the transcription server
    pub base_url: String,

    /// Model name sent with each request
    pub model: String,

    /// Language hint (None for auto-detection)
    pub language: Option<String>,

    /// Seconds to wait for a transcription
    pub timeout_secs: u64,
}

impl Default for STTConfig {
    fn default() -> Self {
        Self {
            backend: SttBackend::Http,
            base_url: "http://localhost:8000".to_string(),
            model: "whisper-1".to_string(),
            language: Some("en".to_string()),
            timeout_secs: 60,
        }
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

fn service_error(e: reqwest::Error) -> RecognitionError {
    RecognitionError::Service(e.to_string())
}

/// Transcriber for OpenAI-compatible transcription endpoints
#[derive(Clone, Debug)]
pub struct HttpTranscriber {
    client: Client,
    config: STTConfig,
}

impl HttpTranscriber {
    pub fn new(config: STTConfig) -> MurmurResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MurmurError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl SpeechToText for HttpTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, RecognitionError> {
        if audio.is_empty() {
            return Err(RecognitionError::Unrecognized);
        }

        let samples = prepare_for_speech(audio).map_err(|e| {
            warn!("Could not decode utterance: {}", e);
            RecognitionError::Unrecognized
        })?;
        if samples.is_empty() {
            return Err(RecognitionError::Unrecognized);
        }
        let upload = encode_wav(&AudioData::new(samples, SPEECH_SAMPLE_RATE, 1))
            .map_err(|e| RecognitionError::Service(e.to_string()))?;
        let upload_len = upload.len();

        let file = Part::bytes(upload)
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(service_error)?;
        let mut form = Form::new()
            .part("file", file)
            .text("model", self.config.model.clone())
            .text("response_format", "json");
        if let Some(language) = &self.config.language {
            form = form.text("language", language.clone());
        }

        debug!("Sending {} bytes of 16 kHz mono audio for transcription", upload_len);

        let response = self
            .client
            .post(self.endpoint())
            .timeout(Duration::from_secs(self.config.timeout_secs.max(1)))
            .multipart(form)
            .send()
            .await
            .map_err(service_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Transcription request failed with {}", status);
            return Err(RecognitionError::Service(format!("{}: {}", status, body.trim())));
        }

        let parsed: TranscriptionResponse = response.json().await.map_err(service_error)?;
        let text = parsed.text.trim();
        if text.is_empty() {
            return Err(RecognitionError::Unrecognized);
        }

        debug!("Transcribed: '{}'", text);
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stt_config_default() {
        let config = STTConfig::default();
        assert_eq!(config.backend, SttBackend::Http);
        assert_eq!(config.language, Some("en".to_string()));
        assert_eq!(config.model, "whisper-1");
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let transcriber = HttpTranscriber::new(STTConfig {
            base_url: "http://host:9000/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            transcriber.endpoint(),
            "http://host:9000/v1/audio/transcriptions"
        );
    }

    #[tokio::test]
    async fn test_empty_audio_is_unrecognized() {
        let transcriber = HttpTranscriber::new(STTConfig::default()).unwrap();
        assert_eq!(
            transcriber.transcribe(&[]).await,
            Err(RecognitionError::Unrecognized)
        );
    }

    #[tokio::test]
    async fn test_undecodable_audio_fails_before_upload() {
        // Nothing listens on the discard port; a request would be a Service error
        let transcriber = HttpTranscriber::new(STTConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            transcriber.transcribe(b"definitely not a wav file").await,
            Err(RecognitionError::Unrecognized)
        );
    }

    #[tokio::test]
    async fn test_silent_wav_is_unrecognized() {
        let transcriber = HttpTranscriber::new(STTConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        })
        .unwrap();
        let empty = encode_wav(&AudioData::new(Vec::new(), 44100, 2)).unwrap();
        assert_eq!(
            transcriber.transcribe(&empty).await,
            Err(RecognitionError::Unrecognized)
        );
    }
}
