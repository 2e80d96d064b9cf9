//! One conversation: a transcript plus the service that answers into it

use crate::conversation::{
    record_exchange, reset_conversation, ConversationContextBuilder, Transcript, Turn,
};
use crate::llm::{CompletionError, TextCompletionService, TokenCallback};
use crate::utils::{ExchangeTimings, Stopwatch};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A question and the answer recorded for it
#[derive(Debug, Clone)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    pub timings: ExchangeTimings,
}

async fn within<F>(limit: Option<Duration>, call: F) -> Result<String, CompletionError>
where
    F: Future<Output = Result<String, CompletionError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| CompletionError::Timeout(limit))?,
        None => call.await,
    }
}

/// Session-scoped handle owning exactly one transcript.
///
/// Sessions may share a completion service but never a transcript.
pub struct ChatSession {
    id: Uuid,
    builder: ConversationContextBuilder,
    transcript: Transcript,
    completion: Arc<dyn TextCompletionService>,
    timeout: Option<Duration>,
}

impl ChatSession {
    pub fn new(
        completion: Arc<dyn TextCompletionService>,
        builder: ConversationContextBuilder,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, window = ?builder.window(), "Starting conversation session");

        Self {
            id,
            builder,
            transcript: Transcript::new(),
            completion,
            timeout: None,
        }
    }

    /// Give up on a completion after `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn builder(&self) -> &ConversationContextBuilder {
        &self.builder
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn history(&self) -> &[Turn] {
        self.transcript.turns()
    }

    /// Model answering this session, when the service names one
    pub fn model(&self) -> Option<&str> {
        self.completion.model_name()
    }

    /// Models the completion service could switch to
    pub async fn available_models(&self) -> Result<Vec<String>, CompletionError> {
        self.completion.installed_models().await
    }

    /// Answer with `model` from now on. The conversation carries over.
    ///
    /// Returns `false` when the service cannot change models.
    pub fn switch_model(&mut self, model: &str) -> bool {
        match self.completion.with_model(model) {
            Some(completion) => {
                self.completion = completion;
                info!(session = %self.id, model, "Switched model");
                true
            }
            None => false,
        }
    }

    /// The exact prompt `question` would be sent as
    pub fn preview_prompt(&self, question: &str) -> String {
        self.builder.prompt_for(&self.transcript, question)
    }

    /// Ask `question`; the exchange is recorded only if an answer arrives
    pub async fn ask(&mut self, question: &str) -> Result<Exchange, CompletionError> {
        let prompt = self.preview_prompt(question);
        debug!(session = %self.id, "Prompt:\n{}", prompt);

        let stopwatch = Stopwatch::start();
        let result = within(self.timeout, self.completion.complete(&prompt)).await;

        self.finish(question, result, &stopwatch, None)
    }

    /// Like [`ask`](Self::ask), forwarding answer fragments to `on_token`
    pub async fn ask_streaming(
        &mut self,
        question: &str,
        on_token: TokenCallback<'_>,
    ) -> Result<Exchange, CompletionError> {
        let prompt = self.preview_prompt(question);
        debug!(session = %self.id, "Prompt:\n{}", prompt);

        let stopwatch = Stopwatch::start();
        let mut first_token_ms = None;
        let result = {
            let mut forward = |fragment: &str| {
                if first_token_ms.is_none() {
                    first_token_ms = Some(stopwatch.elapsed_ms());
                }
                on_token(fragment);
            };
            within(
                self.timeout,
                self.completion.complete_streaming(&prompt, &mut forward),
            )
            .await
        };

        self.finish(question, result, &stopwatch, first_token_ms)
    }

    fn finish(
        &mut self,
        question: &str,
        result: Result<String, CompletionError>,
        stopwatch: &Stopwatch,
        first_token_ms: Option<u64>,
    ) -> Result<Exchange, CompletionError> {
        let answer = match result {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(_) => {
                warn!(session = %self.id, "Completion was empty, question not recorded");
                return Err(CompletionError::EmptyAnswer);
            }
            Err(e) => {
                warn!(session = %self.id, "Completion failed, question not recorded: {}", e);
                return Err(e);
            }
        };

        record_exchange(&mut self.transcript, question, &answer);

        let timings = ExchangeTimings {
            first_token_ms,
            completion_ms: Some(stopwatch.elapsed_ms()),
            ..Default::default()
        };
        debug!(
            session = %self.id,
            turns = self.transcript.len(),
            "Exchange recorded ({})",
            timings.summary()
        );

        Ok(Exchange {
            question: question.to_string(),
            answer,
            timings,
        })
    }

    /// Forget the whole conversation
    pub fn reset(&mut self) {
        reset_conversation(&mut self.transcript);
        info!(session = %self.id, "Conversation history cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ContextWindow, Role, EMPTY_HISTORY};
    use crate::llm::PromptTemplate;
    use async_trait::async_trait;

    struct Fixed(Result<String, CompletionError>);

    #[async_trait]
    impl TextCompletionService for Fixed {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            self.0.clone()
        }
    }

    struct Slow;

    #[async_trait]
    impl TextCompletionService for Slow {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    /// Answers with the name of its model
    #[derive(Clone)]
    struct Named(String);

    #[async_trait]
    impl TextCompletionService for Named {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            Ok(format!("this is {}", self.0))
        }

        fn model_name(&self) -> Option<&str> {
            Some(&self.0)
        }

        async fn installed_models(&self) -> Result<Vec<String>, CompletionError> {
            Ok(vec!["alpha".to_string(), "beta".to_string()])
        }

        fn with_model(&self, model: &str) -> Option<Arc<dyn TextCompletionService>> {
            Some(Arc::new(Named(model.to_string())))
        }
    }

    fn session(service: impl TextCompletionService + 'static) -> ChatSession {
        ChatSession::new(
            Arc::new(service),
            ConversationContextBuilder::new(ContextWindow::Turns(10), PromptTemplate::Simple),
        )
    }

    #[tokio::test]
    async fn test_successful_ask_records_pair() {
        let mut session = session(Fixed(Ok("4".to_string())));

        let exchange = session.ask("What is 2+2?").await.unwrap();

        assert_eq!(exchange.answer, "4");
        assert!(exchange.timings.completion_ms.is_some());
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role(), Role::User);
        assert_eq!(history[0].text(), "What is 2+2?");
        assert_eq!(history[1].role(), Role::Assistant);
        assert_eq!(history[1].text(), "4");
    }

    #[tokio::test]
    async fn test_failed_ask_records_nothing() {
        let mut session = session(Fixed(Err(CompletionError::Unavailable("down".into()))));

        let err = session.ask("hello?").await.unwrap_err();

        assert_eq!(err, CompletionError::Unavailable("down".into()));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_blank_answer_is_empty_error() {
        let mut session = session(Fixed(Ok("  \n".to_string())));
        assert_eq!(
            session.ask("hello?").await.unwrap_err(),
            CompletionError::EmptyAnswer
        );
        assert!(session.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_records_nothing() {
        let mut session = session(Slow).with_timeout(Some(Duration::from_secs(1)));

        let err = session.ask("anyone there?").await.unwrap_err();

        assert_eq!(err, CompletionError::Timeout(Duration::from_secs(1)));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_streaming_reports_first_token() {
        let mut session = session(Fixed(Ok("streamed".to_string())));
        let mut seen = String::new();
        let mut on_token = |t: &str| seen.push_str(t);

        let exchange = session.ask_streaming("go", &mut on_token).await.unwrap();

        assert_eq!(seen, "streamed");
        assert!(exchange.timings.first_token_ms.is_some());
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_switch_model_keeps_history() {
        let mut session = session(Named("alpha".to_string()));
        session.ask("who are you?").await.unwrap();

        assert_eq!(session.available_models().await.unwrap(), vec!["alpha", "beta"]);
        assert!(session.switch_model("beta"));
        let exchange = session.ask("and now?").await.unwrap();

        assert_eq!(session.model(), Some("beta"));
        assert_eq!(exchange.answer, "this is beta");
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.history()[1].text(), "this is alpha");
    }

    #[tokio::test]
    async fn test_switch_model_unsupported() {
        let mut session = session(Fixed(Ok("4".to_string())));

        assert!(!session.switch_model("beta"));
        assert_eq!(session.model(), None);
        assert!(session.available_models().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_history() {
        let mut session = session(Fixed(Ok("hi".to_string())));
        session.ask("hello").await.unwrap();

        session.reset();

        assert!(session.history().is_empty());
        assert!(session.preview_prompt("again").contains(EMPTY_HISTORY));
    }
}
