//! The completion seam between the conversation and a model runtime

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Receives streamed fragments of an answer as they arrive
pub type TokenCallback<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Why a completion produced no usable answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion service unavailable: {0}")]
    Unavailable(String),

    #[error("completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("completion service returned an empty answer")]
    EmptyAnswer,
}

/// A stateless prompt-in, text-out model call
#[async_trait]
pub trait TextCompletionService: Send + Sync {
    /// Complete `prompt` and return the whole answer
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Complete `prompt`, handing fragments to `on_token` as they arrive.
    ///
    /// Services without streaming deliver the whole answer as one fragment.
    async fn complete_streaming(
        &self,
        prompt: &str,
        on_token: TokenCallback<'_>,
    ) -> Result<String, CompletionError> {
        let answer = self.complete(prompt).await?;
        on_token(&answer);
        Ok(answer)
    }

    /// Model currently answering, for services that name one
    fn model_name(&self) -> Option<&str> {
        None
    }

    /// Models the runtime could answer with
    async fn installed_models(&self) -> Result<Vec<String>, CompletionError> {
        Ok(Vec::new())
    }

    /// The same service answering with `model`; `None` when it cannot switch
    fn with_model(&self, _model: &str) -> Option<Arc<dyn TextCompletionService>> {
        None
    }
}
