use super::context::{render_context, ContextWindow};
use super::turn::{Role, Transcript, Turn};
use crate::llm::prompts::PromptTemplate;

/// Turns a transcript plus a new question into a prompt, and folds the
/// answered exchange back into the transcript.
#[derive(Clone, Debug, Default)]
pub struct ConversationContextBuilder {
    window: ContextWindow,
    template: PromptTemplate,
}

impl ConversationContextBuilder {
    pub fn new(window: ContextWindow, template: PromptTemplate) -> Self {
        Self { window, template }
    }

    pub fn with_window(mut self, window: ContextWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn window(&self) -> ContextWindow {
        self.window
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Render the windowed history of `transcript`
    pub fn render_context(&self, transcript: &Transcript) -> String {
        render_context(transcript.turns(), self.window)
    }

    /// Substitute context and question into the template
    pub fn build_prompt(&self, context: &str, question: &str) -> String {
        self.template.render(context, question)
    }

    /// Render the context of `transcript` and build the prompt for `question`
    pub fn prompt_for(&self, transcript: &Transcript, question: &str) -> String {
        self.build_prompt(&self.render_context(transcript), question)
    }
}

/// Append the user question and the assistant answer, in that order
pub fn record_exchange(transcript: &mut Transcript, question: &str, answer: &str) {
    transcript.push(Turn::new(Role::User, question));
    transcript.push(Turn::new(Role::Assistant, answer));
}

/// Discard every turn
pub fn reset_conversation(transcript: &mut Transcript) {
    transcript.clear();
}
