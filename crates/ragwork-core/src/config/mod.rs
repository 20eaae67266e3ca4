//! Configuration management with file persistence
//!
//! Tunables (models, chunking, retrieval depth, graph naming) live in a TOML
//! file. Connection strings and credentials are read from the environment
//! only, and a missing one aborts the command that needs it.

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable holding the LLM provider key
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable holding the relational database connection string
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
/// Environment variables for the graph database
pub const NEO4J_URI_VAR: &str = "NEO4J_URI";
pub const NEO4J_USER_VAR: &str = "NEO4J_USER";
pub const NEO4J_PASSWORD_VAR: &str = "NEO4J_PASSWORD";

/// Ragwork configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub ingest: IngestConfig,
    pub retrieval: RetrievalConfig,
    pub graph: GraphSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Read only so that a key pasted into the file can be rejected
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Words per chunk
    pub chunk_size: usize,
    /// Words shared between consecutive chunks
    pub chunk_overlap: usize,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphSettings {
    pub database: String,
    pub episodes_file: PathBuf,
    pub episode_prefix: String,
    /// HTTP timeout for Neo4j requests
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            timeout_secs: 120,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 120,
            chunk_overlap: 20,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            database: "neo4j".to_string(),
            episodes_file: PathBuf::from("episodes.json"),
            episode_prefix: "S.H.I.E.L.D. Archive Entry".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            ingest: IngestConfig::default(),
            retrieval: RetrievalConfig::default(),
            graph: GraphSettings::default(),
        }
    }
}

/// Read a required environment variable; unset and empty both count as missing
pub fn require_env(var: &str) -> Result<String> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::MissingEnv(var.to_string())),
    }
}

impl LlmConfig {
    pub fn resolved_api_key(&self) -> anyhow::Result<String> {
        self.enforce_env_only()?;
        Ok(require_env(OPENAI_API_KEY_VAR)?)
    }

    pub fn redacted_api_key(&self) -> anyhow::Result<Option<String>> {
        self.enforce_env_only()?;
        Ok(env::var(OPENAI_API_KEY_VAR).ok().map(|key| redact(&key)))
    }

    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.api_key.is_some() {
            return Err(anyhow!(
                "LLM API keys must be provided via environment variables, not stored in configuration"
            ));
        }
        Ok(())
    }
}

fn redact(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        "***".to_string()
    } else {
        let tail: String = secret.chars().skip(count - 4).collect();
        format!("***{}", tail)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("RAGWORK_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("ragwork")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.llm.enforce_env_only()?;

        if self.ingest.chunk_size == 0 {
            return Err(anyhow!("ingest.chunk_size must be at least 1"));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(anyhow!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap,
                self.ingest.chunk_size
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(anyhow!("retrieval.top_k must be at least 1"));
        }
        if self.llm.timeout_secs == 0 || self.graph.timeout_secs == 0 {
            return Err(anyhow!("timeouts must be at least 1 second"));
        }
        if self.llm.embedding_dimensions == 0 {
            return Err(anyhow!("llm.embedding_dimensions must be at least 1"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "llm.base_url" => Ok(self.llm.base_url.clone()),
            "llm.chat_model" => Ok(self.llm.chat_model.clone()),
            "llm.embedding_model" => Ok(self.llm.embedding_model.clone()),
            "llm.embedding_dimensions" => Ok(self.llm.embedding_dimensions.to_string()),
            "llm.timeout_secs" => Ok(self.llm.timeout_secs.to_string()),

            "ingest.chunk_size" => Ok(self.ingest.chunk_size.to_string()),
            "ingest.chunk_overlap" => Ok(self.ingest.chunk_overlap.to_string()),
            "ingest.data_dir" => Ok(self.ingest.data_dir.display().to_string()),

            "retrieval.top_k" => Ok(self.retrieval.top_k.to_string()),

            "graph.database" => Ok(self.graph.database.clone()),
            "graph.episodes_file" => Ok(self.graph.episodes_file.display().to_string()),
            "graph.episode_prefix" => Ok(self.graph.episode_prefix.clone()),
            "graph.timeout_secs" => Ok(self.graph.timeout_secs.to_string()),

            // Secrets are only ever shown redacted
            "llm.api_key" | "api_key" => match self.llm.redacted_api_key()? {
                Some(redacted) => Ok(redacted),
                None => Ok(format!("(not set - use {} env var)", OPENAI_API_KEY_VAR)),
            },

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `ragwork config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    ///
    /// The change is validated as a whole, so an invalid combination
    /// (such as an overlap larger than the chunk size) leaves `self` untouched.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut next = self.clone();
        match key {
            "llm.base_url" => next.llm.base_url = value.trim_end_matches('/').to_string(),
            "llm.chat_model" => next.llm.chat_model = value.to_string(),
            "llm.embedding_model" => next.llm.embedding_model = value.to_string(),
            "llm.embedding_dimensions" => {
                next.llm.embedding_dimensions = parse_value(key, value)?;
            }
            "llm.timeout_secs" => next.llm.timeout_secs = parse_value(key, value)?,

            "ingest.chunk_size" => next.ingest.chunk_size = parse_value(key, value)?,
            "ingest.chunk_overlap" => next.ingest.chunk_overlap = parse_value(key, value)?,
            "ingest.data_dir" => next.ingest.data_dir = PathBuf::from(value),

            "retrieval.top_k" => next.retrieval.top_k = parse_value(key, value)?,

            "graph.database" => next.graph.database = value.to_string(),
            "graph.episodes_file" => next.graph.episodes_file = PathBuf::from(value),
            "graph.episode_prefix" => next.graph.episode_prefix = value.to_string(),
            "graph.timeout_secs" => next.graph.timeout_secs = parse_value(key, value)?,

            "llm.api_key" | "api_key" => {
                return Err(anyhow!(
                    "API keys cannot be stored in configuration. Set the {} environment variable instead.",
                    OPENAI_API_KEY_VAR
                ));
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `ragwork config list` to see available keys.",
                    key
                ));
            }
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "llm.base_url",
            "llm.chat_model",
            "llm.embedding_model",
            "llm.embedding_dimensions",
            "llm.timeout_secs",
            "llm.api_key",
            "ingest.chunk_size",
            "ingest.chunk_overlap",
            "ingest.data_dir",
            "retrieval.top_k",
            "graph.database",
            "graph.episodes_file",
            "graph.episode_prefix",
            "graph.timeout_secs",
        ];

        keys.into_iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> anyhow::Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid value for {}: {}", key, value))
}
