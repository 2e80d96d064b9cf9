//! Ollama client
//!
//! Talks to `/api/generate` in both its single-response and NDJSON
//! streaming forms, and to `/api/tags` for the list of installed models.

use crate::llm::config::LLMConfig;
use crate::llm::service::{CompletionError, TextCompletionService, TokenCallback};
use crate::{MurmurError, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// One generate response, or one line of a streamed response
#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// `mistral` matches the installed tag `mistral:latest`
pub fn matches_model(installed: &str, wanted: &str) -> bool {
    installed == wanted || installed.split(':').next() == Some(wanted)
}

fn unavailable(e: reqwest::Error) -> CompletionError {
    CompletionError::Unavailable(e.to_string())
}

/// Completion service backed by a local Ollama server
#[derive(Clone, Debug)]
pub struct OllamaClient {
    client: Client,
    config: LLMConfig,
}

impl OllamaClient {
    /// Create a client for the server and model in `config`
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MurmurError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        info!("Using Ollama model '{}' at {}", config.model, config.base_url);

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn generate_request(&self, prompt: &str, stream: bool) -> RequestBuilder {
        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        self.client.post(self.endpoint("/api/generate")).json(&body)
    }

    /// Names of the models installed on the server
    pub async fn available_models(&self) -> std::result::Result<Vec<String>, CompletionError> {
        let response = self
            .client
            .get(self.endpoint("/api/tags"))
            .send()
            .await
            .map_err(unavailable)?;
        let tags: TagsResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(unavailable)?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Whether the configured model is installed
    pub async fn has_model(&self) -> std::result::Result<bool, CompletionError> {
        let wanted = self.config.model.as_str();
        Ok(self
            .available_models()
            .await?
            .iter()
            .any(|name| matches_model(name, wanted)))
    }

    /// A client for the same server answering with `model`
    pub fn switched_to(&self, model: &str) -> Self {
        info!("Switching Ollama model '{}' -> '{}'", self.config.model, model);
        Self {
            client: self.client.clone(),
            config: LLMConfig {
                model: model.to_string(),
                ..self.config.clone()
            },
        }
    }

    /// Stream answer fragments for `prompt`
    pub fn stream(
        &self,
        prompt: &str,
    ) -> impl Stream<Item = std::result::Result<String, CompletionError>> + Send + 'static {
        let request = self.generate_request(prompt, true);

        try_stream! {
            let response = request.send().await.map_err(unavailable)?;
            let mut bytes = check_status(response).await?.bytes_stream();
            let mut pending: Vec<u8> = Vec::new();

            while let Some(chunk) = bytes.next().await {
                pending.extend_from_slice(&chunk.map_err(unavailable)?);

                while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    if let Some(fragment) = parse_line(&line)? {
                        yield fragment;
                    }
                }
            }

            if let Some(fragment) = parse_line(&pending)? {
                yield fragment;
            }
        }
    }
}

async fn check_status(response: Response) -> std::result::Result<Response, CompletionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);

    Err(CompletionError::Unavailable(format!("{}: {}", status, detail.trim())))
}

fn parse_line(line: &[u8]) -> std::result::Result<Option<String>, CompletionError> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let chunk: GenerateChunk = serde_json::from_str(line)
        .map_err(|e| CompletionError::Unavailable(format!("Malformed stream chunk: {}", e)))?;
    if let Some(error) = chunk.error {
        return Err(CompletionError::Unavailable(error));
    }

    Ok((!chunk.response.is_empty()).then_some(chunk.response))
}

#[async_trait]
impl TextCompletionService for OllamaClient {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, CompletionError> {
        trace!("Ollama request: {} prompt chars", prompt.len());

        let response = self
            .generate_request(prompt, false)
            .send()
            .await
            .map_err(unavailable)?;
        let chunk: GenerateChunk = check_status(response)
            .await?
            .json()
            .await
            .map_err(unavailable)?;

        if let Some(error) = chunk.error {
            return Err(CompletionError::Unavailable(error));
        }

        let answer = chunk.response.trim();
        if answer.is_empty() {
            return Err(CompletionError::EmptyAnswer);
        }

        debug!("Ollama answered with {} chars", answer.len());
        Ok(answer.to_string())
    }

    async fn complete_streaming(
        &self,
        prompt: &str,
        on_token: TokenCallback<'_>,
    ) -> std::result::Result<String, CompletionError> {
        let stream = self.stream(prompt);
        futures::pin_mut!(stream);

        let mut answer = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            on_token(&fragment);
            answer.push_str(&fragment);
        }

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(CompletionError::EmptyAnswer);
        }

        Ok(answer.to_string())
    }

    fn model_name(&self) -> Option<&str> {
        Some(&self.config.model)
    }

    async fn installed_models(&self) -> std::result::Result<Vec<String>, CompletionError> {
        self.available_models().await
    }

    fn with_model(&self, model: &str) -> Option<Arc<dyn TextCompletionService>> {
        Some(Arc::new(self.switched_to(model)))
    }
}
