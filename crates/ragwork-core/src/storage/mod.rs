//! Storage layer - SQLite
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and the full-table reset
//! - `documents`: Document and chunk persistence
//!
//! # Usage
//!
//! ```ignore
//! use ragwork_core::storage::{Database, DocumentRepository};
//!
//! let db = Database::connect("sqlite://ragwork.db").await?;
//! let repo = DocumentRepository::new(&db);
//! let id = repo.upsert_document("avengers.md", "...").await?;
//! ```

pub mod database;
pub mod documents;
pub mod migrations;

pub use database::{Database, DatabaseConfig};
pub use documents::{
    ChunkRecord, DocumentRecord, DocumentRepository, StorageStats, StoredChunk, decode_embedding,
    encode_embedding,
};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
