//! Neo4j client over the HTTP transactional Cypher endpoint
//!
//! Each call is one auto-committed transaction:
//! `POST {uri}/db/{database}/tx/commit` with basic auth.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use super::episode::Episode;
use crate::config::{NEO4J_PASSWORD_VAR, NEO4J_URI_VAR, NEO4J_USER_VAR, require_env};
use crate::error::{Error, Result};

/// Used by `from_env` until `with_timeout` overrides it
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const INDEX_STATEMENTS: [&str; 3] = [
    "CREATE CONSTRAINT episodic_uuid IF NOT EXISTS FOR (e:Episodic) REQUIRE e.uuid IS UNIQUE",
    "CREATE INDEX episodic_valid_at IF NOT EXISTS FOR (e:Episodic) ON (e.valid_at)",
    "CREATE INDEX episodic_name IF NOT EXISTS FOR (e:Episodic) ON (e.name)",
];

const ADD_EPISODE: &str = "CREATE (e:Episodic {uuid: $uuid, name: $name, content: $content, \
source: $source, source_description: $source_description, \
valid_at: datetime($valid_at), created_at: datetime($created_at)}) RETURN e.uuid";

const SEARCH_EPISODES: &str = "MATCH (e:Episodic) WHERE toLower(e.content) CONTAINS toLower($query) \
RETURN e.uuid, e.name, e.content, e.source, e.source_description, toString(e.valid_at) \
ORDER BY e.valid_at DESC, e.created_at DESC LIMIT $limit";

const CLEAR_ALL: &str = "MATCH (n) DETACH DELETE n RETURN count(n)";

/// Connection settings for the graph database
#[derive(Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GraphConfig {
    /// Read `NEO4J_URI`, `NEO4J_USER` and `NEO4J_PASSWORD`; all three are required
    pub fn from_env(database: impl Into<String>) -> Result<Self> {
        Ok(Self {
            uri: require_env(NEO4J_URI_VAR)?,
            user: require_env(NEO4J_USER_VAR)?,
            password: require_env(NEO4J_PASSWORD_VAR)?,
            database: database.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// An episode node as returned by search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeHit {
    pub uuid: String,
    pub name: String,
    pub content: String,
    pub source: String,
    pub source_description: String,
    pub valid_at: String,
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxResult {
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct TxError {
    code: String,
    message: String,
}

#[derive(Clone)]
pub struct GraphClient {
    http_client: HttpClient,
    config: GraphConfig,
    endpoint: String,
    timeout: Duration,
}

impl GraphClient {
    pub fn new(config: GraphConfig) -> Result<Self> {
        let base = config.uri.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::ConfigError(format!(
                "{} must be an http(s) URL for the Neo4j HTTP API, got '{}'",
                NEO4J_URI_VAR, config.uri
            )));
        }
        let endpoint = format!("{}/db/{}/tx/commit", base, config.database);

        let timeout = Duration::from_secs(config.timeout_secs);
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::NetworkError)?;

        Ok(Self {
            http_client,
            config,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run statements in one transaction and return the rows of each
    async fn run(&self, statements: Vec<Value>) -> Result<Vec<Vec<Vec<Value>>>> {
        debug!(endpoint = %self.endpoint, statements = statements.len(), "Sending Cypher");

        let response = self
            .http_client
            .post(&self.endpoint)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&json!({ "statements": statements }))
            .send()
            .await
            .map_err(Error::NetworkError)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::GraphError(
                "Authentication failed. Check NEO4J_USER and NEO4J_PASSWORD.".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GraphError(format!("HTTP {}: {}", status, body)));
        }

        let body: TxResponse = response
            .json()
            .await
            .map_err(|e| Error::GraphError(format!("Failed to parse response: {}", e)))?;

        if let Some(err) = body.errors.first() {
            return Err(Error::GraphError(format!("{}: {}", err.code, err.message)));
        }

        Ok(body
            .results
            .into_iter()
            .map(|r| r.data.into_iter().map(|d| d.row).collect())
            .collect())
    }

    /// Create the constraint and indexes episodes rely on
    pub async fn build_indices(&self) -> Result<()> {
        let statements = INDEX_STATEMENTS
            .iter()
            .map(|s| json!({ "statement": s }))
            .collect();
        self.run(statements).await?;
        info!("Graph indices and constraints ready");
        Ok(())
    }

    /// Store one episode node; returns its uuid
    pub async fn add_episode(
        &self,
        name: &str,
        episode: &Episode,
        reference_time: DateTime<Utc>,
    ) -> Result<String> {
        let uuid = Uuid::new_v4().to_string();
        let statement = json!({
            "statement": ADD_EPISODE,
            "parameters": {
                "uuid": uuid,
                "name": name,
                "content": episode.body(),
                "source": episode.kind.as_str(),
                "source_description": episode.description,
                "valid_at": reference_time.to_rfc3339_opts(SecondsFormat::Secs, true),
                "created_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            }
        });

        self.run(vec![statement]).await?;
        debug!(name = %name, uuid = %uuid, kind = %episode.kind, "Episode added");
        Ok(uuid)
    }

    /// Episodes whose content contains `query`, ignoring case, newest first
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<EpisodeHit>> {
        let statement = json!({
            "statement": SEARCH_EPISODES,
            "parameters": { "query": query, "limit": limit },
        });

        let rows = self
            .run(vec![statement])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        Ok(rows.into_iter().map(|row| hit_from_row(&row)).collect())
    }

    /// Delete every node and relationship; returns the number of nodes removed
    pub async fn clear(&self) -> Result<u64> {
        let rows = self
            .run(vec![json!({ "statement": CLEAR_ALL })])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let deleted = rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_u64)
            .unwrap_or(0);
        info!(deleted = deleted, "Graph cleared");
        Ok(deleted)
    }
}

fn hit_from_row(row: &[Value]) -> EpisodeHit {
    let field = |i: usize| {
        row.get(i)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    EpisodeHit {
        uuid: field(0),
        name: field(1),
        content: field(2),
        source: field(3),
        source_description: field(4),
        valid_at: field(5),
    }
}

/// Add episodes named `"<prefix> 1"`, `"<prefix> 2"`, ... all valid from
/// `reference_time`. Returns how many were added.
pub async fn ingest_episodes(
    client: &GraphClient,
    episodes: &[Episode],
    prefix: &str,
    reference_time: DateTime<Utc>,
) -> Result<usize> {
    for (i, episode) in episodes.iter().enumerate() {
        let name = format!("{} {}", prefix, i + 1);
        client.add_episode(&name, episode, reference_time).await?;
        info!(name = %name, kind = %episode.kind, "Added episode");
    }
    Ok(episodes.len())
}
