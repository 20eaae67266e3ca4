//! Cosine similarity and linear top-k search

use std::cmp::Ordering;

use serde::Serialize;

use crate::storage::StoredChunk;

/// A chunk of text paired with its score against a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub similarity: f32,
    pub content: String,
}

/// Compute cosine similarity between two vectors
///
/// A zero-length vector is treated as having norm 1, so it scores 0 against
/// anything. Vectors of different lengths score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a = non_zero(a.iter().map(|x| x * x).sum::<f32>().sqrt());
    let magnitude_b = non_zero(b.iter().map(|x| x * x).sum::<f32>().sqrt());

    dot_product / (magnitude_a * magnitude_b)
}

fn non_zero(norm: f32) -> f32 {
    if norm == 0.0 { 1.0 } else { norm }
}

/// Score every candidate against `query` and keep the best `k`
///
/// Ties keep their input order. NaN scores sort last.
pub fn top_k(query: &[f32], candidates: &[StoredChunk], k: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = candidates
        .iter()
        .map(|chunk| ScoredChunk {
            similarity: cosine_similarity(query, &chunk.embedding),
            content: chunk.content.clone(),
        })
        .collect();

    scored.sort_by(|a, b| descending(a.similarity, b.similarity));
    scored.truncate(k);
    scored
}

fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
