//! OpenAI-compatible LLM client implementation
//!
//! Provides an async HTTP client for:
//! - Chat completions (the generation step of the pipeline)
//! - Embeddings (one text per request, as ingestion and retrieval use them)
//!
//! Requests are sent once; failures are reported to the caller, which decides
//! whether to skip (ingestion) or substitute a placeholder (generation).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::types::{
    ChatRequest, ChatResponse, Embedding, EmbeddingRequest, EmbeddingResponse, LlmResponse,
    Message,
};
use super::{ChatModel, Embedder};

/// LLM client
///
/// Cheap to clone; the underlying HTTP connection pool is shared.
#[derive(Clone)]
pub struct LlmClient {
    /// HTTP client for making requests
    http_client: HttpClient,
    /// LLM configuration (models, base URL, timeout)
    config: LlmConfig,
    /// API key for authentication
    api_key: String,
    /// Base URL for the API, without trailing slash
    base_url: String,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.config.chat_model)
            .field("embedding_model", &self.config.embedding_model)
            .finish()
    }
}

/// Builder for creating an LlmClient
#[derive(Default)]
pub struct LlmClientBuilder {
    config: Option<LlmConfig>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl LlmClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the LLM configuration
    pub fn config(mut self, config: LlmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL (defaults to the configured one)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the LlmClient
    pub fn build(self) -> Result<LlmClient> {
        let config = self.config.unwrap_or_default();
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::LlmError("API key is required".to_string()))?;

        let timeout_secs = self.timeout_secs.unwrap_or(config.timeout_secs);

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(Error::NetworkError)?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| config.base_url.clone())
            .trim_end_matches('/')
            .to_string();

        Ok(LlmClient {
            http_client,
            config,
            api_key,
            base_url,
        })
    }
}

impl LlmClient {
    /// Create a new LlmClient with the given configuration and API key
    pub fn new(config: LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        LlmClientBuilder::new().config(config).api_key(api_key).build()
    }

    /// Create a new builder for LlmClient
    pub fn builder() -> LlmClientBuilder {
        LlmClientBuilder::new()
    }

    /// Model used for chat completions
    pub fn chat_model(&self) -> &str {
        &self.config.chat_model
    }

    /// Model used for embeddings
    pub fn embedding_model(&self) -> &str {
        &self.config.embedding_model
    }

    /// Make a chat completion request with the configured chat model
    pub async fn complete(&self, messages: Vec<Message>) -> Result<LlmResponse> {
        let request = ChatRequest::new(&self.config.chat_model, messages);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Error::NetworkError)?;

        let status = response.status();
        if !status.is_success() {
            return handle_error_response(status, response).await;
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::LlmError(format!("Failed to parse response: {}", e)))?;

        LlmResponse::from_chat_response(chat_response)
            .ok_or_else(|| Error::LlmError("Empty response from API".to_string()))
    }

    /// Generate an embedding for a single text with the configured model
    pub async fn embed(&self, text: &str) -> Result<Embedding> {
        let request = EmbeddingRequest::new(&self.config.embedding_model, text);
        let url = format!("{}/embeddings", self.base_url);

        debug!(model = %request.model, chars = text.len(), "Sending embedding request");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Error::NetworkError)?;

        let status = response.status();
        if !status.is_success() {
            return handle_error_response(status, response).await;
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingFailed(format!("Failed to parse response: {}", e)))?;

        let tokens_used = embedding_response
            .usage
            .as_ref()
            .map(|u| u.prompt_tokens)
            .unwrap_or(0);

        let data = embedding_response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingFailed("Empty embedding response".to_string()))?;

        Ok(Embedding {
            vector: data.embedding,
            model: embedding_response.model,
            tokens_used,
        })
    }
}

#[async_trait]
impl Embedder for LlmClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        LlmClient::embed(self, text).await.map(|e| e.vector)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        self.complete(messages).await.map(|r| r.content)
    }
}

/// Map a non-success HTTP response to an error
async fn handle_error_response<T>(
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> Result<T> {
    let header_retry = retry_after_header(response.headers());
    let body = response.text().await.unwrap_or_default();

    match status.as_u16() {
        401 => Err(Error::LlmError(
            "Unauthorized: Invalid API key. Set the OPENAI_API_KEY environment variable."
                .to_string(),
        )),
        429 => Err(Error::RateLimited(
            header_retry
                .or_else(|| extract_retry_after(&body))
                .unwrap_or(60),
        )),
        400 => Err(Error::LlmError(format!("Bad request: {}", body))),
        403 => Err(Error::LlmError(format!("Forbidden: {}", body))),
        404 => Err(Error::LlmError(format!(
            "Model not found or endpoint unavailable: {}",
            body
        ))),
        500..=599 => Err(Error::LlmError(format!("Server error ({}): {}", status, body))),
        _ => Err(Error::LlmError(format!("HTTP error {}: {}", status, body))),
    }
}

/// Whole seconds from a `Retry-After` header; HTTP-date values are ignored
fn retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Extract retry-after value from error response
fn extract_retry_after(body: &str) -> Option<u64> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    json.get("retry_after")
        .or_else(|| json.get("error").and_then(|e| e.get("retry_after")))
        .and_then(|v| v.as_u64())
}
