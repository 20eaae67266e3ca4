//! LLM integration - OpenAI-compatible API
//!
//! This module provides:
//! - HTTP client for chat completions and embeddings
//! - Request/response types matching the OpenAI API
//! - The `Embedder` and `ChatModel` seams the rest of the crate depends on

mod client;
mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::OPENAI_API_KEY_VAR;
use crate::error::{Error, Result};

pub use client::{LlmClient, LlmClientBuilder};
pub use types::{
    ChatRequest, ChatResponse, Choice, ChoiceMessage, Embedding, EmbeddingData, EmbeddingRequest,
    EmbeddingResponse, LlmResponse, Message, MessageRole, Usage,
};

/// Turns text into a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Produces a reply for a conversation
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: Vec<Message>) -> Result<String>;
}

#[async_trait]
impl<T: Embedder + ?Sized> Embedder for Arc<T> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Embedder::embed(&**self, text).await
    }
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for Arc<T> {
    async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        ChatModel::chat(&**self, messages).await
    }
}

/// Stands in for a provider when no API key is set; every call fails with
/// `MissingEnv`
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredEmbedder;

#[async_trait]
impl Embedder for UnconfiguredEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::MissingEnv(OPENAI_API_KEY_VAR.to_string()))
    }
}
