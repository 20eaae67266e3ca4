//! Error types for Ragwork

use thiserror::Error;

/// Result type alias using Ragwork's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Ragwork error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Environment and configuration errors (E001-E099)
    #[error("{0} is not set. Add it to your environment or a .env file.")]
    MissingEnv(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Network errors (E100-E199)
    #[error("Network error: {0}. Check your internet connection.")]
    NetworkError(#[from] reqwest::Error),

    #[error("LLM API error: {0}")]
    LlmError(String),

    #[error("Rate limited. Provider asked to wait {0} seconds.")]
    RateLimited(u64),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Document '{0}' not found. Run `ragwork ingest` first.")]
    DocumentNotFound(String),

    // Tool errors (E500-E599)
    #[error("Tool '{0}' not found. Run `ragwork tools list` to see all tools.")]
    ToolNotFound(String),

    #[error("Tool '{0}' failed: {1}")]
    ToolFailed(String, String),

    // Graph errors (E600-E699)
    #[error("Graph database error: {0}")]
    GraphError(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Recover the typed database error from the storage layer's `anyhow`
    /// chain so its code and suggestion survive
    pub fn from_storage(err: anyhow::Error) -> Self {
        match err.downcast::<sqlx::Error>() {
            Ok(db) => Self::DatabaseError(db),
            Err(other) => Self::Other(format!("{:#}", other)),
        }
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingEnv(_) => "E001",
            Self::ConfigError(_) => "E002",
            Self::InvalidInput(_) => "E003",
            Self::NetworkError(_) => "E100",
            Self::LlmError(_) => "E101",
            Self::RateLimited(_) => "E102",
            Self::EmbeddingFailed(_) => "E103",
            Self::DimensionMismatch { .. } => "E104",
            Self::DatabaseError(_) => "E400",
            Self::DocumentNotFound(_) => "E401",
            Self::ToolNotFound(_) => "E500",
            Self::ToolFailed(..) => "E501",
            Self::GraphError(_) => "E600",
            Self::Other(_) | Self::Io(_) | Self::Json(_) => "E9999",
        }
    }

    /// Short name of the error kind, used in inline error placeholders
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingEnv(_) => "MissingEnv",
            Self::ConfigError(_) => "ConfigError",
            Self::InvalidInput(_) => "InvalidInput",
            Self::NetworkError(_) => "NetworkError",
            Self::LlmError(_) => "LlmError",
            Self::RateLimited(_) => "RateLimited",
            Self::EmbeddingFailed(_) => "EmbeddingFailed",
            Self::DimensionMismatch { .. } => "DimensionMismatch",
            Self::DatabaseError(_) => "DatabaseError",
            Self::DocumentNotFound(_) => "DocumentNotFound",
            Self::ToolNotFound(_) => "ToolNotFound",
            Self::ToolFailed(..) => "ToolFailed",
            Self::GraphError(_) => "GraphError",
            Self::Other(_) => "Other",
            Self::Io(_) => "Io",
            Self::Json(_) => "Json",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::MissingEnv(var) => Some(format!("export {}=...", var)),
            Self::NetworkError(_) => Some("Check internet connection".to_string()),
            Self::LlmError(_) => Some("Check OPENAI_API_KEY and `ragwork config get llm.base_url`".to_string()),
            Self::DimensionMismatch { .. } => {
                Some("ragwork config get llm.embedding_dimensions".to_string())
            }
            Self::DocumentNotFound(_) => Some("ragwork ingest".to_string()),
            Self::ToolNotFound(_) => Some("ragwork tools list".to_string()),
            Self::GraphError(_) => Some("Check NEO4J_URI, NEO4J_USER and NEO4J_PASSWORD".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_grouped() {
        assert_eq!(Error::MissingEnv("DATABASE_URL".into()).code(), "E001");
        assert_eq!(Error::RateLimited(30).code(), "E102");
        assert_eq!(
            Error::DimensionMismatch {
                expected: 1536,
                actual: 3
            }
            .code(),
            "E104"
        );
        assert_eq!(Error::ToolNotFound("x".into()).code(), "E500");
        assert_eq!(Error::Other("x".into()).code(), "E9999");
    }

    #[test]
    fn test_missing_env_message_and_suggestion() {
        let err = Error::MissingEnv("OPENAI_API_KEY".to_string());
        assert!(err.to_string().contains("OPENAI_API_KEY is not set"));
        assert_eq!(err.suggestion().as_deref(), Some("export OPENAI_API_KEY=..."));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Error::LlmError("boom".into()).kind(), "LlmError");
        assert_eq!(Error::RateLimited(1).kind(), "RateLimited");
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = Error::DimensionMismatch {
            expected: 4,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Embedding has 2 dimensions, expected 4");
    }

    #[test]
    fn test_storage_errors_keep_database_kind() {
        let err = anyhow::Error::from(sqlx::Error::PoolClosed).context("Failed to run database migrations");
        let err = Error::from_storage(err);
        assert!(matches!(err, Error::DatabaseError(sqlx::Error::PoolClosed)));
        assert_eq!(err.kind(), "DatabaseError");

        let err = Error::from_storage(anyhow::anyhow!("disk on fire").context("Failed to reset"));
        assert!(matches!(err, Error::Other(ref msg) if msg == "Failed to reset: disk on fire"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.suggestion().is_none());
    }
}
