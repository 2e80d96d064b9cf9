//! In-process speech-to-text with whisper.cpp

use crate::audio::prepare_for_speech;
use crate::speech::stt::{RecognitionError, SpeechToText};
use crate::{MurmurError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Configuration for the Whisper engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    /// Path to the ggml model file
    pub model_path: PathBuf,

    /// Language to transcribe (None for auto-detection)
    pub language: Option<String>,

    /// Number of threads to use for transcription
    pub n_threads: i32,

    /// Translate to English while transcribing
    pub translate: bool,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.en.bin"),
            language: Some("en".to_string()),
            n_threads: 4,
            translate: false,
        }
    }
}

/// Whisper transcriber; inference runs on the blocking thread pool
pub struct WhisperTranscriber {
    config: WhisperConfig,
    context: Arc<WhisperContext>,
}

impl WhisperTranscriber {
    pub fn new(config: WhisperConfig) -> Result<Self> {
        info!("Loading Whisper model from: {:?}", config.model_path);

        if !config.model_path.exists() {
            return Err(MurmurError::ModelLoadError(format!(
                "Model file not found: {:?}",
                config.model_path
            )));
        }

        let path = config
            .model_path
            .to_str()
            .ok_or_else(|| MurmurError::ModelLoadError("Invalid model path".to_string()))?;
        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| {
                MurmurError::ModelLoadError(format!("Failed to load Whisper model: {:?}", e))
            })?;

        info!("Whisper model loaded successfully");

        Ok(Self {
            config,
            context: Arc::new(context),
        })
    }
}

fn run_whisper(
    context: &WhisperContext,
    config: &WhisperConfig,
    samples: &[f32],
) -> std::result::Result<String, RecognitionError> {
    let failed = |stage: &str, e: whisper_rs::WhisperError| {
        RecognitionError::Service(format!("{}: {:?}", stage, e))
    };

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_n_threads(config.n_threads);
    params.set_translate(config.translate);
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
    if let Some(ref lang) = config.language {
        params.set_language(Some(lang.as_str()));
    }

    let mut state = context
        .create_state()
        .map_err(|e| failed("Failed to create state", e))?;
    state
        .full(params, samples)
        .map_err(|e| failed("Transcription failed", e))?;

    let segments = state
        .full_n_segments()
        .map_err(|e| failed("Failed to get segments", e))?;

    let mut text = String::new();
    for i in 0..segments {
        let segment = state
            .full_get_segment_text(i)
            .map_err(|e| failed("Failed to get segment text", e))?;
        text.push_str(&segment);
    }

    Ok(text.trim().to_string())
}

#[async_trait]
impl SpeechToText for WhisperTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> std::result::Result<String, RecognitionError> {
        if audio.is_empty() {
            return Err(RecognitionError::Unrecognized);
        }

        let samples = prepare_for_speech(audio).map_err(|e| {
            warn!("Could not decode utterance: {}", e);
            RecognitionError::Unrecognized
        })?;

        debug!("Transcribing {} samples", samples.len());

        let context = Arc::clone(&self.context);
        let config = self.config.clone();
        let text = tokio::task::spawn_blocking(move || run_whisper(&context, &config, &samples))
            .await
            .map_err(|e| RecognitionError::Service(format!("Whisper task failed: {}", e)))??;

        // whisper.cpp marks silence with bracketed tags such as [BLANK_AUDIO]
        if text.is_empty() || (text.starts_with('[') && text.ends_with(']')) {
            return Err(RecognitionError::Unrecognized);
        }

        Ok(text)
    }
}
