//! Routes one utterance through recognition, completion and synthesis
//!
//! Each stage reports its own failure:
//! - recognition failure: nothing is asked, the transcript is untouched
//! - completion failure: the question is not recorded
//! - synthesis failure: the exchange stays recorded and the text reply is
//!   still returned, with the error in [`Reply::speech`]

use crate::integration::session::{ChatSession, Exchange};
use crate::llm::TokenCallback;
use crate::speech::{language_name, SpeechToText, SynthesisError, TextToSpeech};
use crate::utils::Stopwatch;
use crate::{MurmurError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the user said
#[derive(Debug, Clone)]
pub enum Utterance {
    Typed(String),
    /// WAV-encoded recording
    Spoken(Vec<u8>),
}

/// The assistant's answer to one utterance
#[derive(Debug)]
pub struct Reply {
    pub exchange: Exchange,
    /// Synthesized answer audio, when speech output is enabled
    pub speech: Option<std::result::Result<Vec<u8>, SynthesisError>>,
}

pub struct Assistant {
    session: ChatSession,
    stt: Option<Arc<dyn SpeechToText>>,
    tts: Option<Arc<dyn TextToSpeech>>,
    language: String,
}

impl Assistant {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session,
            stt: None,
            tts: None,
            language: "en".to_string(),
        }
    }

    /// Accept spoken utterances
    pub fn with_speech_input(mut self, stt: Arc<dyn SpeechToText>) -> Self {
        self.stt = Some(stt);
        self
    }

    /// Synthesize every answer in `language`
    pub fn with_speech_output(mut self, tts: Arc<dyn TextToSpeech>, language: &str) -> Self {
        self.tts = Some(tts);
        self.language = language.to_string();
        self
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ChatSession {
        &mut self.session
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn listens(&self) -> bool {
        self.stt.is_some()
    }

    pub fn speaks(&self) -> bool {
        self.tts.is_some()
    }

    /// Switch the language of spoken answers
    pub fn set_language(&mut self, code: &str) -> Result<&'static str> {
        let name = language_name(code).ok_or_else(|| {
            MurmurError::ConfigError(format!("Unsupported speech language: {}", code))
        })?;
        self.language = code.to_string();
        info!("Speech language set to {} ({})", name, code);
        Ok(name)
    }

    /// Answer `utterance`, streaming fragments to `on_token` when given
    pub async fn handle(
        &mut self,
        utterance: Utterance,
        on_token: Option<TokenCallback<'_>>,
    ) -> Result<Reply> {
        let (question, stt_ms) = match utterance {
            Utterance::Typed(text) => (text, None),
            Utterance::Spoken(audio) => {
                let (text, ms) = self.recognize(&audio).await?;
                (text, Some(ms))
            }
        };

        let mut exchange = match on_token {
            Some(on_token) => self.session.ask_streaming(&question, on_token).await?,
            None => self.session.ask(&question).await?,
        };
        exchange.timings.stt_ms = stt_ms;

        let speech = match &self.tts {
            Some(tts) => {
                let stopwatch = Stopwatch::start();
                let result = tts.synthesize(&exchange.answer, &self.language).await;
                exchange.timings.tts_ms = Some(stopwatch.elapsed_ms());
                if let Err(e) = &result {
                    warn!("Answer recorded but not spoken: {}", e);
                }
                Some(result)
            }
            None => None,
        };

        debug!("Exchange timings: {}", exchange.timings.summary());
        Ok(Reply { exchange, speech })
    }

    async fn recognize(&self, audio: &[u8]) -> Result<(String, u64)> {
        let stt = self.stt.as_ref().ok_or_else(|| {
            MurmurError::ConfigError("Speech input is not configured".to_string())
        })?;

        let stopwatch = Stopwatch::start();
        match stt.transcribe(audio).await {
            Ok(text) => {
                info!("Heard: '{}'", text);
                Ok((text, stopwatch.elapsed_ms()))
            }
            Err(e) => {
                warn!("Utterance discarded: {}", e);
                Err(e.into())
            }
        }
    }
}
