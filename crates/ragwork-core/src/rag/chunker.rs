//! Word-window chunking
//!
//! Text is split on whitespace and cut into windows of `size` words. Each
//! window starts `size - overlap` words after the previous one, so adjacent
//! chunks share `overlap` words.

use crate::error::{Error, Result};

/// Default words per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 120;

/// Default words shared between adjacent chunks
pub const DEFAULT_CHUNK_OVERLAP: usize = 20;

/// Fixed-size overlapping word windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordChunker {
    size: usize,
    overlap: usize,
}

impl WordChunker {
    /// Create a chunker. The window must be non-empty and must advance.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidInput(
                "Chunk size must be at least one word".to_string(),
            ));
        }
        if overlap >= size {
            return Err(Error::InvalidInput(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Words the window moves forward each step
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < words.len() {
            let end = (start + self.size).min(words.len());
            chunks.push(words[start..end].join(" "));
            // A window that reached the last word covers every later start
            if end == words.len() {
                break;
            }
            start += self.step();
        }

        chunks
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}
