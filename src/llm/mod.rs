//! Language-model integration
//!
//! - **config**: server, model and sampling settings
//! - **prompts**: prompt templates and slot substitution
//! - **service**: the [`TextCompletionService`] seam and its errors
//! - **ollama**: the Ollama HTTP implementation
//!
//! # Usage
//!
//! ```rust,ignore
//! use murmur::llm::{LLMConfig, OllamaClient, TextCompletionService};
//!
//! let client = OllamaClient::new(LLMConfig::new("llama3"))?;
//! let answer = client.complete("User: hello\nAI:").await?;
//! ```

pub mod config;
pub mod ollama;
pub mod prompts;
pub mod service;

pub use config::{LLMConfig, KNOWN_MODELS};
pub use ollama::{matches_model, OllamaClient};
pub use prompts::{PromptTemplate, HISTORY_SLOT, QUESTION_SLOT};
pub use service::{CompletionError, TextCompletionService, TokenCallback};
