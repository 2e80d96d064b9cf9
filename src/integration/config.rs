//! Configuration for the integration layer
//!
//! Every table is optional in the TOML file; missing values fall back to
//! their defaults.
//!
//! ```toml
//! [llm]
//! model = "llama3"
//! timeout_secs = 60
//!
//! [context]
//! template = "concise"
//! window = { policy = "turns", limit = 10 }
//!
//! [speech.tts]
//! enabled = true
//! language = "de"
//! ```

use crate::conversation::{ContextWindow, ConversationContextBuilder};
use crate::llm::{LLMConfig, PromptTemplate};
use crate::speech::{STTConfig, SttBackend, TTSConfig};
#[cfg(feature = "whisper")]
use crate::speech::WhisperConfig;
use crate::{MurmurError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How history is bounded and framed
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub window: ContextWindow,
    pub template: PromptTemplate,
}

impl ContextConfig {
    pub fn builder(&self) -> ConversationContextBuilder {
        ConversationContextBuilder::new(self.window, self.template.clone())
    }
}

/// Speech input and output
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub stt: STTConfig,
    pub tts: TTSConfig,
    #[cfg(feature = "whisper")]
    pub whisper: WhisperConfig,
}

/// Configuration for the complete assistant
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LLMConfig,
    pub context: ContextConfig,
    pub speech: SpeechConfig,
}

impl AppConfig {
    /// `<config dir>/murmur/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("murmur").join("config.toml"))
    }

    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MurmurError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::from_toml(&content).map_err(|e| match e {
            MurmurError::ConfigError(msg) => {
                MurmurError::ConfigError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| MurmurError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default file if it exists, else
    /// defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.llm.validate().map_err(MurmurError::ConfigError)?;
        self.context
            .template
            .validate()
            .map_err(MurmurError::ConfigError)?;
        self.speech.tts.validate().map_err(MurmurError::ConfigError)?;

        if self.speech.stt.backend == SttBackend::Whisper && !cfg!(feature = "whisper") {
            return Err(MurmurError::ConfigError(
                "speech.stt.backend = \"whisper\" requires building with the whisper feature"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.context.window, ContextWindow::Turns(10));
        assert_eq!(config.context.template, PromptTemplate::Memory);
        assert!(!config.speech.tts.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml(
            r#"
            [llm]
            model = "llama3"

            [context]
            template = "concise"
            window = { policy = "chars", limit = 4000 }

            [speech.tts]
            enabled = true
            language = "fr"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.context.template, PromptTemplate::Concise);
        assert_eq!(config.context.window, ContextWindow::Chars(4000));
        assert!(config.speech.tts.enabled);
        assert_eq!(config.speech.tts.language, "fr");
    }

    #[test]
    fn test_custom_template_toml() {
        let config = AppConfig::from_toml(
            "[context]\ntemplate = { custom = \"H: {chat_history}\\nQ: {question}\" }\n",
        )
        .unwrap();
        let prompt = config.context.builder().build_prompt("none", "hi");
        assert_eq!(prompt, "H: none\nQ: hi");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_toml("[speech.tts]\nlanguage = \"xx\"\n").is_err());
        assert!(AppConfig::from_toml("[llm]\nmodel = \"\"\n").is_err());
        assert!(AppConfig::from_toml("[context]\ntemplate = { custom = \"no slots\" }\n").is_err());
        assert!(AppConfig::from_toml("[llm\n").is_err());
    }

    #[cfg(not(feature = "whisper"))]
    #[test]
    fn test_whisper_backend_needs_feature() {
        let err = AppConfig::from_toml("[speech.stt]\nbackend = \"whisper\"\n").unwrap_err();
        assert!(matches!(err, MurmurError::ConfigError(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/murmur.toml").unwrap_err();
        assert!(matches!(err, MurmurError::ConfigError(_)));
    }
}
