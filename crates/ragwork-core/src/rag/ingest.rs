//! Markdown ingestion: read, chunk, embed, store
//!
//! A chunk whose embedding fails, or comes back with the wrong width, is
//! logged and skipped. The rest of the batch carries on.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::chunker::WordChunker;
use crate::error::{Error, Result};
use crate::llm::Embedder;
use crate::storage::{Database, DocumentRepository};

/// Totals for one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Documents written (new or updated)
    pub documents: usize,
    /// Files that were empty after trimming
    pub skipped_files: usize,
    /// Chunks newly written
    pub chunks_stored: usize,
    /// Chunks already present at the same position
    pub chunks_unchanged: usize,
    /// Chunks dropped because embedding failed
    pub chunks_failed: usize,
}

/// Result of ingesting a single document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub document_id: i64,
    pub title: String,
    pub chunks: usize,
    pub stored: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl IngestReport {
    fn add(&mut self, doc: &DocumentReport) {
        self.documents += 1;
        self.chunks_stored += doc.stored;
        self.chunks_unchanged += doc.unchanged;
        self.chunks_failed += doc.failed;
    }
}

pub struct Ingestor<E> {
    db: Database,
    embedder: E,
    chunker: WordChunker,
    dimensions: Option<usize>,
}

impl<E: Embedder> Ingestor<E> {
    pub fn new(db: Database, embedder: E) -> Self {
        Self {
            db,
            embedder,
            chunker: WordChunker::default(),
            dimensions: None,
        }
    }

    pub fn with_chunker(mut self, chunker: WordChunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Reject vectors whose length differs from `dimensions`
    pub fn expect_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Ingest every `*.md` file in `dir`, in name order
    pub async fn ingest_dir(&self, dir: &Path, reset: bool) -> Result<IngestReport> {
        if reset {
            warn!("Resetting document and chunk tables");
            self.db
                .reset_schema()
                .await
                .map_err(Error::from_storage)?;
        } else {
            self.db
                .migrate()
                .await
                .map_err(Error::from_storage)?;
        }

        let files = markdown_files(dir)?;
        let mut report = IngestReport::default();

        if files.is_empty() {
            warn!(dir = %dir.display(), "No .md files found");
            return Ok(report);
        }

        info!(count = files.len(), dir = %dir.display(), "Found documents to process");

        for path in files {
            let title = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            let raw = tokio::fs::read_to_string(&path).await?;
            let content = raw.trim();
            if content.is_empty() {
                warn!(file = %title, "Skipping empty file");
                report.skipped_files += 1;
                continue;
            }

            let doc = self.ingest_document(&title, content).await?;
            report.add(&doc);
        }

        info!(
            documents = report.documents,
            stored = report.chunks_stored,
            failed = report.chunks_failed,
            "Ingestion complete"
        );
        Ok(report)
    }

    /// Upsert one document and store its chunks
    pub async fn ingest_document(&self, title: &str, content: &str) -> Result<DocumentReport> {
        let repo = DocumentRepository::new(&self.db);
        let document_id = repo.upsert_document(title, content).await?;
        let chunks = self.chunker.chunk(content);

        info!(document = %title, chunks = chunks.len(), "Processing document");

        let mut report = DocumentReport {
            document_id,
            title: title.to_string(),
            chunks: chunks.len(),
            stored: 0,
            unchanged: 0,
            failed: 0,
        };

        for (index, text) in chunks.iter().enumerate() {
            let vector = match self.embed_chunk(text).await {
                Ok(vector) => vector,
                Err(e) => {
                    warn!(document = %title, chunk = index, error = %e, "Skipping chunk");
                    report.failed += 1;
                    continue;
                }
            };

            if repo.insert_chunk(document_id, index as i64, text, &vector).await? {
                report.stored += 1;
            } else {
                report.unchanged += 1;
            }
        }

        Ok(report)
    }

    async fn embed_chunk(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.embedder.embed(text).await?;
        match self.dimensions {
            Some(expected) if vector.len() != expected => Err(Error::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(vector),
        }
    }
}

fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Data directory {} does not exist",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    Ok(files)
}
