//! Episodes: timestamped inputs for the knowledge graph

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

/// How an episode body should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeKind {
    Text,
    Json,
}

impl EpisodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for EpisodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of an episodes file
///
/// ```json
/// {"content": "Tony Stark is Iron Man.", "type": "text", "description": "Hero status report"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// A string, or any JSON value for structured episodes
    pub content: Value,
    #[serde(rename = "type")]
    pub kind: EpisodeKind,
    pub description: String,
}

impl Episode {
    pub fn text(content: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            content: Value::String(content.into()),
            kind: EpisodeKind::Text,
            description: description.into(),
        }
    }

    pub fn json(content: Value, description: impl Into<String>) -> Self {
        Self {
            content,
            kind: EpisodeKind::Json,
            description: description.into(),
        }
    }

    /// Body sent to the graph: strings verbatim, anything else as JSON
    pub fn body(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Read an episodes file. Any problem is logged and yields an empty list.
pub fn load_episodes(path: &Path) -> Vec<Episode> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error!(path = %path.display(), "Episodes file not found");
            return Vec::new();
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read episodes file");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Episode>>(&raw) {
        Ok(episodes) => {
            info!(path = %path.display(), count = episodes.len(), "Loaded episodes");
            episodes
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Error parsing episodes file");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("episodes.json");
        std::fs::write(
            &path,
            r#"[
                {"content": "Tony Stark is Iron Man.", "type": "text", "description": "Hero status report"},
                {"content": {"name": "Sam Wilson", "alias": "Captain America"}, "type": "json", "description": "Hero profile"}
            ]"#,
        )
        .unwrap();

        let episodes = load_episodes(&path);
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].kind, EpisodeKind::Text);
        assert_eq!(episodes[0].body(), "Tony Stark is Iron Man.");
        assert_eq!(episodes[1].kind, EpisodeKind::Json);
        assert_eq!(
            serde_json::from_str::<Value>(&episodes[1].body()).unwrap(),
            json!({"name": "Sam Wilson", "alias": "Captain America"})
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_episodes(&dir.path().join("nope.json")).is_empty());
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("episodes.json");

        std::fs::write(&path, "[{not json").unwrap();
        assert!(load_episodes(&path).is_empty());

        std::fs::write(&path, r#"[{"content": "x", "type": "video", "description": "d"}]"#).unwrap();
        assert!(load_episodes(&path).is_empty());
    }

    #[test]
    fn test_constructors() {
        let text = Episode::text("Thor is king", "status");
        assert_eq!(text.kind.to_string(), "text");
        assert_eq!(text.body(), "Thor is king");

        let structured = Episode::json(json!({"status": "retired"}), "profile");
        assert_eq!(structured.body(), r#"{"status":"retired"}"#);
    }
}
