//! Naive retrieval-augmented generation
//!
//! - `chunker`: fixed word windows with overlap
//! - `similarity`: cosine scoring and linear top-k
//! - `retriever`: query embedding plus a scan over every stored chunk
//! - `prompt`: context block and template rendering
//! - `pipeline`: retrieve, render, generate
//! - `ingest`: markdown files into the `documents` and `chunks` tables
//! - `transcript`: console output for an answer

pub mod chunker;
pub mod ingest;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod similarity;
pub mod transcript;

pub use chunker::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, WordChunker};
pub use ingest::{DocumentReport, IngestReport, Ingestor};
pub use pipeline::{EMPTY_RESPONSE, RagAnswer, RagPipeline, generation_error};
pub use prompt::{RAG_TEMPLATE, build_context, render_prompt};
pub use retriever::Retriever;
pub use similarity::{ScoredChunk, cosine_similarity, top_k};
pub use transcript::{ANSWER_WIDTH, PASSAGE_WIDTH, render_answer, wrap_words};
