pub mod audio;
pub mod conversation;
pub mod integration;
pub mod llm;
pub mod speech;
pub mod ui;
pub mod utils;

use llm::CompletionError;
use speech::{RecognitionError, SynthesisError};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MurmurError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("Model load error: {0}")]
    ModelLoadError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),
}

impl From<std::io::Error> for MurmurError {
    fn from(e: std::io::Error) -> Self {
        MurmurError::IOError(e.to_string())
    }
}

impl MurmurError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The conversation is untouched, the user can simply retry
            MurmurError::Completion(_) => true,
            MurmurError::Recognition(_) => true,
            MurmurError::Synthesis(_) => true,
            MurmurError::AudioProcessingError(_) => true,
            MurmurError::ModelLoadError(_) => false,
            MurmurError::ConfigError(_) => false,
            MurmurError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            MurmurError::Completion(CompletionError::Timeout(_)) => {
                "The model took too long to answer. Please try again.".to_string()
            }
            MurmurError::Completion(CompletionError::Unavailable(_)) => {
                "Could not reach the model runtime. Is Ollama running?".to_string()
            }
            MurmurError::Completion(CompletionError::EmptyAnswer) => {
                "The model returned an empty answer. Please try again.".to_string()
            }
            MurmurError::Recognition(RecognitionError::Unrecognized) => {
                "Sorry, I couldn't understand the audio. Please try again with clearer speech."
                    .to_string()
            }
            MurmurError::Recognition(RecognitionError::Service(_)) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            MurmurError::Synthesis(_) => {
                "Text-to-speech failed. Response will be shown as text.".to_string()
            }
            MurmurError::ModelLoadError(_) => {
                "Failed to load speech model. Please verify model files are present.".to_string()
            }
            MurmurError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            MurmurError::IOError(_) => "File system error occurred.".to_string(),
            MurmurError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MurmurError>;
