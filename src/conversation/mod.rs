//! Conversation memory
//!
//! - **turn**: roles, turns and the append-only transcript
//! - **context**: window policies and bounded rendering
//! - **builder**: prompt assembly and the transcript mutators

pub mod builder;
pub mod context;
pub mod turn;

pub use builder::{record_exchange, reset_conversation, ConversationContextBuilder};
pub use context::{parse_role_labels, render_context, ContextWindow, EMPTY_HISTORY};
pub use turn::{Role, Transcript, Turn, CONTINUATION_INDENT};
