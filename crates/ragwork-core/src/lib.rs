//! Ragwork Core Library
//!
//! This crate provides the core functionality for ragwork:
//! - Storage (SQLite documents and embedded chunks)
//! - LLM integration (OpenAI-compatible chat and embeddings)
//! - Naive RAG (chunking, cosine top-k retrieval, prompt assembly)
//! - Retrieval exposed as agent tools
//! - Knowledge-graph episodes over Neo4j

pub mod agent;
pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod rag;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::llm::{ChatModel, Embedder, LlmClient};
    pub use crate::rag::{Ingestor, RagPipeline, Retriever, WordChunker};
    pub use crate::storage::{Database, DocumentRepository};
}
