//! Prompt templates for the assistant
//!
//! A template carries two slots, [`HISTORY_SLOT`] and [`QUESTION_SLOT`],
//! filled in a single pass by [`PromptTemplate::render`].

use serde::{Deserialize, Serialize};

/// Slot replaced by the rendered conversation history
pub const HISTORY_SLOT: &str = "{chat_history}";

/// Slot replaced by the current question
pub const QUESTION_SLOT: &str = "{question}";

/// Template with explicit instructions to use the conversation history
pub const MEMORY_TEMPLATE: &str = r#"You are an AI assistant with memory of our conversation.

CONVERSATION HISTORY:
{chat_history}

CURRENT QUESTION: {question}

INSTRUCTIONS:
- Remember and reference previous parts of our conversation when relevant
- Be consistent with information you've shared before
- If this is the first message, introduce yourself briefly

RESPONSE:"#;

/// Minimal completion-style template
pub const SIMPLE_TEMPLATE: &str = "Previous conversation: {chat_history}\nUser: {question}\nAI:";

/// Completion-style template that asks for short answers, suited to speech
pub const CONCISE_TEMPLATE: &str = "Previous conversation: {chat_history}\nUser: {question}\nAI: Please provide a helpful and concise response.";

/// Instructional template wrapped around history and question
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    #[default]
    Memory,
    Simple,
    Concise,
    /// User-supplied template text containing the slots
    Custom(String),
}

impl PromptTemplate {
    /// Template text with unfilled slots
    pub fn text(&self) -> &str {
        match self {
            PromptTemplate::Memory => MEMORY_TEMPLATE,
            PromptTemplate::Simple => SIMPLE_TEMPLATE,
            PromptTemplate::Concise => CONCISE_TEMPLATE,
            PromptTemplate::Custom(text) => text,
        }
    }

    /// Look up a built-in template by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "memory" => Some(PromptTemplate::Memory),
            "simple" => Some(PromptTemplate::Simple),
            "concise" => Some(PromptTemplate::Concise),
            _ => None,
        }
    }

    /// Check that the question slot is present
    pub fn validate(&self) -> Result<(), String> {
        if !self.text().contains(QUESTION_SLOT) {
            return Err(format!("prompt template must contain {}", QUESTION_SLOT));
        }
        Ok(())
    }

    /// Fill the slots with `history` and `question`.
    ///
    /// Only the template text is scanned for slots; inserted text is copied
    /// verbatim, so slot-like sequences inside it stay literal.
    pub fn render(&self, history: &str, question: &str) -> String {
        let template = self.text();
        let mut out = String::with_capacity(template.len() + history.len() + question.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];

            if let Some(after) = tail.strip_prefix(HISTORY_SLOT) {
                out.push_str(history);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(QUESTION_SLOT) {
                out.push_str(question);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }

        out.push_str(rest);
        out
    }
}
