//! HTTP-backed implementations of the `agent_stages::LlmProvider` and
//! `ingestion::EmbeddingProvider` collaborator traits, pointed at the
//! OpenAI-compatible chat/embeddings endpoints named by
//! [`crate::config::AppConfig`] (`LLM_ENDPOINT`, `EMBEDDING_ENDPOINT`).
//!
//! Both traits are deliberately narrow (§4.8, §1 Non-goals: the model
//! itself is a collaborator, not something this platform implements) so
//! this module is just the wire format plus status-code-to-transient
//! mapping; everything downstream of `complete`/`embed` stays unaware of
//! HTTP.

use agent_stages::prelude::{LlmError, LlmProvider};
use async_trait::async_trait;
use ingestion::collaborators::EmbeddingError;
use ingestion::EmbeddingProvider;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn status_is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Chat-completions client for [`LlmProvider`] (§6 `LLM_ENDPOINT`,
/// `LLM_MODEL`, `LLM_TEMPERATURE`, `LLM_MAX_TOKENS`).
pub struct HttpLlmClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpLlmClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build().unwrap_or_default(),
            endpoint: endpoint.into(),
            model: model.into(),
            temperature,
            max_tokens,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[async_trait]
impl LlmProvider for HttpLlmClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return if status_is_transient(status) {
                Err(LlmError::Transient(format!("{status}: {detail}")))
            } else {
                Err(LlmError::Permanent(format!("{status}: {detail}")))
            };
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| LlmError::Permanent(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Permanent("llm response had no choices".to_string()))
    }
}

/// Embeddings client for [`ingestion::EmbeddingProvider`] (§6
/// `EMBEDDING_ENDPOINT`, `EMBEDDING_MODEL`).
pub struct HttpEmbeddingClient {
    client: Client,
    endpoint: String,
    model: String,
    version: String,
}

impl HttpEmbeddingClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build().unwrap_or_default(),
            endpoint: endpoint.into(),
            model: model.into(),
            version: version.into(),
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = EmbeddingRequest { model: &self.model, input: text };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return if status_is_transient(status) {
                Err(EmbeddingError::Transient(format!("{status}: {detail}")))
            } else {
                Err(EmbeddingError::Permanent(format!("{status}: {detail}")))
            };
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| EmbeddingError::Permanent(e.to_string()))?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::Permanent("embedding response had no data".to_string()))
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn version(&self) -> &str {
        &self.version
    }
}
