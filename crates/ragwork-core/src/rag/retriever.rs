//! Query-time retrieval over stored chunks

use tracing::debug;

use super::similarity::{ScoredChunk, top_k};
use crate::error::Result;
use crate::llm::Embedder;
use crate::storage::{Database, DocumentRepository};

/// Embeds a query and ranks every stored chunk against it
pub struct Retriever<E> {
    db: Database,
    embedder: E,
}

impl<E: Embedder> Retriever<E> {
    pub fn new(db: Database, embedder: E) -> Self {
        Self { db, embedder }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Top `k` chunks by cosine similarity, best first
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_vector = self.embedder.embed(query).await?;
        let candidates = DocumentRepository::new(&self.db).stored_chunks().await?;

        debug!(
            candidates = candidates.len(),
            dimensions = query_vector.len(),
            k = k,
            "Scoring stored chunks"
        );

        Ok(top_k(&query_vector, &candidates, k))
    }
}
