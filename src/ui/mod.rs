//! Terminal surface for the assistant

pub mod repl;

pub use repl::{parse_command, Command, Repl, DEFAULT_DEBUG_QUESTION};
