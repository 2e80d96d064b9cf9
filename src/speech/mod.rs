pub mod stt;
pub mod tts;
#[cfg(feature = "whisper")]
pub mod whisper;

pub use stt::{HttpTranscriber, RecognitionError, STTConfig, SpeechToText, SttBackend};
pub use tts::{
    language_name, HttpSynthesizer, SynthesisError, TTSConfig, TextToSpeech, SUPPORTED_LANGUAGES,
};
#[cfg(feature = "whisper")]
pub use whisper::{WhisperConfig, WhisperTranscriber};
