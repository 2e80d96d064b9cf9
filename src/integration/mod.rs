//! Integration layer
//!
//! Wires the conversation memory, the completion service and the optional
//! speech collaborators into one assistant.

pub mod assistant;
pub mod config;
pub mod session;

pub use assistant::{Assistant, Reply, Utterance};
pub use config::{AppConfig, ContextConfig, SpeechConfig};
pub use session::{ChatSession, Exchange};
