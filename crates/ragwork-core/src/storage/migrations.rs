//! Schema versions for the document store
//!
//! Each applied version is recorded in `_migrations`; `Database::new` brings
//! the schema up to `CURRENT_VERSION` unless auto-migration is disabled.

use sqlx::SqlitePool;

/// Latest schema version this build knows about
pub const CURRENT_VERSION: i32 = 1;

const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Documents and their embedded chunks
///
/// `embedding` holds little-endian f32 values; `dimensions` records the
/// vector width so a table filled by two different models is detectable.
const MIGRATION_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT UNIQUE NOT NULL,
        content TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS chunks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        dimensions INTEGER NOT NULL,
        UNIQUE(document_id, chunk_index)
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_document_id ON chunks(document_id);
"#;

/// SQL that removes every ragwork table, used by the schema reset
const DROP_ALL: &str = r#"
    DROP TABLE IF EXISTS chunks;
    DROP TABLE IF EXISTS documents;
    DROP TABLE IF EXISTS _migrations;
"#;

/// Highest recorded version, 0 for a fresh database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    // MAX over an empty table is NULL
    let (version,): (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Apply every version above the recorded one
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking document store schema"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Schema is current");
        return Ok(());
    }

    if current_version < 1 {
        tracing::info!("Applying migration v1: Documents and chunks");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    tracing::info!(version = CURRENT_VERSION, "Schema migrated");
    Ok(())
}

/// Drop every table and rebuild the schema from scratch
pub async fn reset_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    tracing::warn!("Dropping documents and chunks tables");
    sqlx::raw_sql(DROP_ALL).execute(pool).await?;
    run_migrations(pool).await
}

/// Recorded and target versions, without applying anything
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Where the schema stands relative to this build
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Highest version recorded in `_migrations`
    pub current_version: i32,
    pub target_version: i32,
    pub needs_migration: bool,
}
