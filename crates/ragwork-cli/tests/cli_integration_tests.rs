//! CLI integration tests for ragwork
//!
//! Tests the ragwork CLI commands end-to-end using assert_cmd. Every command
//! runs in its own temp dir with credentials removed from the environment.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CREDENTIAL_VARS: [&str; 5] = [
    "OPENAI_API_KEY",
    "DATABASE_URL",
    "NEO4J_URI",
    "NEO4J_USER",
    "NEO4J_PASSWORD",
];

/// Helper to create a command isolated from the caller's config and credentials
#[allow(deprecated)]
fn ragwork_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ragwork").unwrap();
    cmd.current_dir(dir.path());
    cmd.env("RAGWORK_CONFIG_DIR", dir.path().join("config"));
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn sqlite_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("ragwork.db").display())
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("tools"))
        .stdout(predicate::str::contains("graph"));
}

#[test]
fn test_config_path_uses_override_dir() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_list_shows_defaults() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("retrieval.top_k = 3"))
        .stdout(predicate::str::contains("ingest.chunk_size"));
}

#[test]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["config", "set", "retrieval.top_k", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set retrieval.top_k = 5"));

    ragwork_cmd(&dir)
        .args(["config", "get", "retrieval.top_k"])
        .assert()
        .success()
        .stdout(predicate::str::diff("5\n"));

    assert!(dir.path().join("config").join("config.toml").exists());
}

#[test]
fn test_config_set_rejects_bad_values() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["config", "set", "retrieval.top_k", "many"])
        .assert()
        .failure();

    ragwork_cmd(&dir)
        .args(["config", "get", "no.such.key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_ask_without_api_key_names_the_variable() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["ask", "Who is Thor?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_retrieve_without_database_url_names_the_variable() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .env("OPENAI_API_KEY", "sk-test")
        .args(["retrieve", "Wolverine"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL"));
}

#[test]
fn test_retrieve_rejects_zero_k() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["retrieve", "Wolverine", "-k", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("k must be at least 1"));
}

#[test]
fn test_schema_init_and_status() {
    let dir = TempDir::new().unwrap();
    let url = sqlite_url(&dir);

    ragwork_cmd(&dir)
        .env("DATABASE_URL", &url)
        .args(["schema", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema ready (v1)"));

    ragwork_cmd(&dir)
        .env("DATABASE_URL", &url)
        .args(["schema", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Documents: 0"))
        .stdout(predicate::str::contains("Chunks: 0"));

    assert!(dir.path().join("ragwork.db").exists());
}

#[test]
fn test_schema_without_database_url_fails() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["schema", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL"));
}

#[test]
fn test_tools_list_needs_no_credentials() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["tools", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("retrieve_mission_intel"))
        .stdout(predicate::str::contains("get_available_heroes"))
        .stdout(predicate::str::contains("get_heroes_by_specialty"));
}

#[test]
fn test_graph_search_tool_needs_neo4j() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["tools", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("search_knowledge_graph").not());

    ragwork_cmd(&dir)
        .args([
            "tools",
            "call",
            "search_knowledge_graph",
            "--args",
            r#"{"query": "Captain America"}"#,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NEO4J_URI"));
}

#[test]
fn test_tools_call_available_heroes() {
    let dir = TempDir::new().unwrap();
    let output = ragwork_cmd(&dir)
        .args(["tools", "call", "get_available_heroes"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let heroes: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let names: Vec<&str> = heroes
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Iron Man", "Captain America", "Black Widow"]);
}

#[test]
fn test_tools_call_by_specialty() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args([
            "tools",
            "call",
            "get_heroes_by_specialty",
            "--args",
            r#"{"specialty": "heavy_combat"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Thor"))
        .stdout(predicate::str::contains("Hulk"))
        .stdout(predicate::str::contains("Iron Man").not());
}

#[test]
fn test_tools_call_unknown_tool_fails() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["tools", "call", "launch_quinjet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("launch_quinjet"));
}

#[test]
fn test_tools_call_retrieval_needs_api_key() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args([
            "tools",
            "call",
            "retrieve_mission_intel",
            "--args",
            r#"{"query": "Wolverine"}"#,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_heroes_by_specialty() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["heroes", "--specialty", "stealth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Black Widow"))
        .stdout(predicate::str::contains("Thor").not());
}

#[test]
fn test_heroes_json() {
    let dir = TempDir::new().unwrap();
    let output = ragwork_cmd(&dir)
        .args(["heroes", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let heroes: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(heroes.as_array().unwrap().len(), 5);
}

#[test]
fn test_graph_without_neo4j_vars_fails() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .args(["graph", "search", "Iron Man"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NEO4J_URI"));
}

#[test]
fn test_doctor_reports_missing_credentials() {
    let dir = TempDir::new().unwrap();
    ragwork_cmd(&dir)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("API Key: Not configured"))
        .stdout(predicate::str::contains("Some checks failed"));
}
