//! Document and chunk persistence
//!
//! Documents are keyed by title. Chunks are keyed by `(document_id, chunk_index)`
//! and carry their embedding as little-endian `f32` bytes.

use chrono::NaiveDateTime;
use sqlx::FromRow;
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::Database;

/// A stored document
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DocumentRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Chunk metadata without its vector
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ChunkRecord {
    pub id: i64,
    pub document_id: i64,
    pub chunk_index: i64,
    pub content: String,
    pub dimensions: i64,
}

/// A chunk with its decoded embedding, the unit retrieval scores against
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub document_id: i64,
    pub chunk_index: i64,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// Row counts for the two tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub documents: i64,
    pub chunks: i64,
    /// Every distinct vector width present in `chunks`
    pub dimensions: Vec<i64>,
}

#[derive(FromRow)]
struct StoredChunkRow {
    document_id: i64,
    chunk_index: i64,
    content: String,
    embedding: Vec<u8>,
}

impl From<StoredChunkRow> for StoredChunk {
    fn from(row: StoredChunkRow) -> Self {
        Self {
            document_id: row.document_id,
            chunk_index: row.chunk_index,
            content: row.content,
            embedding: decode_embedding(&row.embedding),
        }
    }
}

/// Serialize a vector as little-endian `f32` bytes
pub fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Inverse of [`encode_embedding`]; trailing bytes that do not form a full
/// `f32` are ignored
pub fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Repository for documents and chunks
pub struct DocumentRepository<'a> {
    db: &'a Database,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a document, or replace the content of the one with this title.
    /// Returns the row id, which is stable across re-ingestion.
    pub async fn upsert_document(&self, title: &str, content: &str) -> Result<i64> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO documents (title, content) VALUES (?, ?)
            ON CONFLICT(title) DO UPDATE SET
                content = excluded.content,
                updated_at = CURRENT_TIMESTAMP
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .fetch_one(self.db.pool())
        .await?;

        debug!(document_id = id, title = %title, "Document upserted");
        Ok(id)
    }

    /// Store one chunk. An existing `(document_id, chunk_index)` row is left
    /// untouched; the return value says whether a row was written.
    pub async fn insert_chunk(
        &self,
        document_id: i64,
        chunk_index: i64,
        content: &str,
        embedding: &[f32],
    ) -> Result<bool> {
        if embedding.is_empty() {
            return Err(Error::InvalidInput(
                "Refusing to store a chunk with an empty embedding".to_string(),
            ));
        }
        if chunk_index < 0 {
            return Err(Error::InvalidInput(format!(
                "Chunk index must be non-negative, got {}",
                chunk_index
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO chunks (document_id, chunk_index, content, embedding, dimensions)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(document_id, chunk_index) DO NOTHING
            "#,
        )
        .bind(document_id)
        .bind(chunk_index)
        .bind(content)
        .bind(encode_embedding(embedding))
        .bind(embedding.len() as i64)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Every chunk with its vector, in storage order
    pub async fn stored_chunks(&self) -> Result<Vec<StoredChunk>> {
        let rows: Vec<StoredChunkRow> = sqlx::query_as(
            "SELECT document_id, chunk_index, content, embedding FROM chunks ORDER BY id",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(StoredChunk::from).collect())
    }

    pub async fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>> {
        let row = sqlx::query_as(
            "SELECT id, title, content, created_at, updated_at FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row)
    }

    pub async fn find_by_title(&self, title: &str) -> Result<Option<DocumentRecord>> {
        let row = sqlx::query_as(
            "SELECT id, title, content, created_at, updated_at FROM documents WHERE title = ?",
        )
        .bind(title)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row)
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        let rows = sqlx::query_as(
            "SELECT id, title, content, created_at, updated_at FROM documents ORDER BY title",
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    /// Chunks of one document ordered by index
    pub async fn chunks_for(&self, document_id: i64) -> Result<Vec<ChunkRecord>> {
        if self.get_document(document_id).await?.is_none() {
            return Err(Error::DocumentNotFound(document_id.to_string()));
        }

        let rows = sqlx::query_as(
            r#"
            SELECT id, document_id, chunk_index, content, dimensions
            FROM chunks WHERE document_id = ?
            ORDER BY chunk_index
            "#,
        )
        .bind(document_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    pub async fn stats(&self) -> Result<StorageStats> {
        let (documents,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(self.db.pool())
            .await?;
        let (chunks,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chunks")
            .fetch_one(self.db.pool())
            .await?;
        let dimensions: Vec<(i64,)> =
            sqlx::query_as("SELECT DISTINCT dimensions FROM chunks ORDER BY dimensions")
                .fetch_all(self.db.pool())
                .await?;

        Ok(StorageStats {
            documents,
            chunks,
            dimensions: dimensions.into_iter().map(|(d,)| d).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::in_memory().await.expect("Failed to create database")
    }

    #[test]
    fn test_embedding_bytes() {
        let vector = vec![1.0f32, -0.5, 0.25];
        let bytes = encode_embedding(&vector);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(decode_embedding(&bytes), vector);
    }

    #[test]
    fn test_decode_ignores_partial_trailing_bytes() {
        let mut bytes = encode_embedding(&[2.0]);
        bytes.push(0xff);
        assert_eq!(decode_embedding(&bytes), vec![2.0]);
    }

    #[tokio::test]
    async fn test_upsert_does_not_duplicate() {
        let db = test_db().await;
        let repo = DocumentRepository::new(&db);

        let first = repo.upsert_document("avengers.md", "old text").await.unwrap();
        let second = repo.upsert_document("avengers.md", "new text").await.unwrap();
        assert_eq!(first, second);

        let docs = repo.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "new text");
    }

    #[tokio::test]
    async fn test_insert_chunk_ignores_conflicts() {
        let db = test_db().await;
        let repo = DocumentRepository::new(&db);
        let doc = repo.upsert_document("thor.md", "hammer").await.unwrap();

        assert!(repo.insert_chunk(doc, 0, "hammer", &[1.0, 0.0]).await.unwrap());
        assert!(!repo.insert_chunk(doc, 0, "changed", &[0.0, 1.0]).await.unwrap());

        let chunks = repo.stored_chunks().await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "hammer");
        assert_eq!(chunks[0].embedding, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_insert_chunk_rejects_empty_vector() {
        let db = test_db().await;
        let repo = DocumentRepository::new(&db);
        let doc = repo.upsert_document("hulk.md", "smash").await.unwrap();

        let err = repo.insert_chunk(doc, 0, "smash", &[]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_chunks_for_orders_by_index() {
        let db = test_db().await;
        let repo = DocumentRepository::new(&db);
        let doc = repo.upsert_document("cap.md", "shield").await.unwrap();

        repo.insert_chunk(doc, 1, "second", &[0.5]).await.unwrap();
        repo.insert_chunk(doc, 0, "first", &[0.5]).await.unwrap();

        let chunks = repo.chunks_for(doc).await.unwrap();
        let indices: Vec<i64> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(chunks[0].dimensions, 1);
    }

    #[tokio::test]
    async fn test_chunks_for_unknown_document() {
        let db = test_db().await;
        let repo = DocumentRepository::new(&db);

        let err = repo.chunks_for(42).await.unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn test_stats() {
        let db = test_db().await;
        let repo = DocumentRepository::new(&db);
        assert_eq!(repo.stats().await.unwrap(), StorageStats::default());

        let a = repo.upsert_document("a.md", "a").await.unwrap();
        let b = repo.upsert_document("b.md", "b").await.unwrap();
        repo.insert_chunk(a, 0, "a", &[1.0, 2.0]).await.unwrap();
        repo.insert_chunk(b, 0, "b", &[1.0, 2.0, 3.0]).await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.dimensions, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_find_by_title() {
        let db = test_db().await;
        let repo = DocumentRepository::new(&db);
        let id = repo.upsert_document("widow.md", "red room").await.unwrap();

        let found = repo.find_by_title("widow.md").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(repo.find_by_title("missing.md").await.unwrap().is_none());
    }
}
