//! Prompt assembly

use super::similarity::ScoredChunk;

/// Instructions wrapped around the retrieved passages
pub const RAG_TEMPLATE: &str = "You are a knowledgeable consultant specializing in superheroes from the Marvel Cinematic Universe (MCU, not comics).
Answer the user's question based PRIMARILY on the provided context below.
The context contains the most up-to-date and accurate information available.
Do not speculate about future events or discuss content from unreleased films or series.
If the context provides information that differs from your training data, prioritize the context.
If the context doesn't contain enough information to fully answer the question, you may supplement
with your general knowledge, but clearly indicate what comes from the context vs. general knowledge.

Context:
{context}

Question: {question}

Answer:";

/// One line per passage, each prefixed with its score
pub fn build_context(passages: &[ScoredChunk]) -> String {
    passages
        .iter()
        .map(|p| format!("[Similarity: {:.3}] {}", p.similarity, p.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Context used when retrieval itself failed
pub fn unavailable_context(reason: &impl std::fmt::Display) -> String {
    format!("(No context available: {})", reason)
}

pub fn render_prompt(context: &str, question: &str) -> String {
    // Placeholders are filled from the template only, never from inserted text
    let (head, tail) = RAG_TEMPLATE
        .split_once("{context}")
        .unwrap_or((RAG_TEMPLATE, ""));
    format!("{}{}{}", head, context, tail.replacen("{question}", question, 1))
}
