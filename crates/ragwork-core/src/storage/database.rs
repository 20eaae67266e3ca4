//! Connection handling for the document store
//!
//! A `Database` is opened once per command from a connection string and
//! passed explicitly to whatever needs it. It holds a single connection by
//! default, matching the sequential pipeline.

use crate::storage::migrations;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;

const DEFAULT_MAX_CONNECTIONS: u32 = 1;

/// Connection string used for throwaway databases
const IN_MEMORY_URL: &str = "sqlite::memory:";

/// How to open a `Database`
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite://ragwork.db` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
    /// Bring the schema up to date on open
    pub auto_migrate: bool,
}

impl DatabaseConfig {
    /// Create a config for the given connection string
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_migrate: true,
        }
    }

    /// A private database that lives as long as the pool
    pub fn in_memory() -> Self {
        Self::with_url(IN_MEMORY_URL)
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Open without touching the schema
    pub fn no_migrate(mut self) -> Self {
        self.auto_migrate = false;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Pooled handle to the document store
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl Database {
    /// Open a database with the given configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let mut connect_options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("Invalid database URL: {}", config.url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);

        if config.is_in_memory() {
            // Closing the last connection would drop the whole database
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        } else {
            connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", config.url))?;

        let db = Self {
            pool,
            config: config.clone(),
        };

        if config.auto_migrate {
            db.migrate().await?;
        }

        Ok(db)
    }

    /// Open a database from a connection string with default options
    pub async fn connect(url: &str) -> Result<Self> {
        Self::new(DatabaseConfig::with_url(url)).await
    }

    /// Migrated in-memory store, used by tests and credential-free tools
    pub async fn in_memory() -> Result<Self> {
        Self::new(DatabaseConfig::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub async fn migrate(&self) -> Result<()> {
        migrations::run_migrations(&self.pool)
            .await
            .context("Failed to run database migrations")
    }

    /// Drop all tables and recreate them empty
    pub async fn reset_schema(&self) -> Result<()> {
        migrations::reset_schema(&self.pool)
            .await
            .context("Failed to reset database schema")
    }

    pub async fn migration_status(&self) -> Result<migrations::MigrationStatus> {
        migrations::migration_status(&self.pool)
            .await
            .context("Failed to check migration status")
    }

    /// Round-trip a trivial query
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    /// Wait for open connections to finish and close them
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
