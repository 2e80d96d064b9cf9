use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of every rendered line after the first within one turn
pub const CONTINUATION_INDENT: &str = "  ";

/// Who produced a turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when the turn is rendered into a prompt
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "AI",
        }
    }

    /// Parse a rendered label back into a role
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "User" => Some(Role::User),
            "AI" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A single utterance in the conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub(crate) fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `"<RoleLabel>: <text>"`, with continuation lines indented so they
    /// can never be read as a new turn
    pub fn render(&self) -> String {
        format!(
            "{}: {}",
            self.role.label(),
            self.text.replace('\n', &format!("\n{}", CONTINUATION_INDENT))
        )
    }
}

/// Ordered history of turns for one session.
///
/// Only [`record_exchange`](super::record_exchange) appends to a transcript
/// and only [`reset_conversation`](super::reset_conversation) empties it.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }
}
