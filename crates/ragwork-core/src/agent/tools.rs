//! The mission tools: document retrieval, two roster lookups and, when a
//! graph is configured, episode search

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::context::MissionContext;
use super::heroes::{HeroDirectory, SuperheroInfo};
use super::tool::{Tool, ToolRegistry, parse_args};
use crate::error::{Error, Result};
use crate::graph::GraphClient;
use crate::llm::Embedder;
use crate::rag::Retriever;

pub const RETRIEVE_MISSION_INTEL: &str = "retrieve_mission_intel";
pub const GET_AVAILABLE_HEROES: &str = "get_available_heroes";
pub const GET_HEROES_BY_SPECIALTY: &str = "get_heroes_by_specialty";
pub const SEARCH_KNOWLEDGE_GRAPH: &str = "search_knowledge_graph";

const DEFAULT_INTEL_K: usize = 3;
const DEFAULT_GRAPH_LIMIT: usize = 10;

/// One retrieved passage, stamped with the caller's clearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub similarity_score: f32,
    pub content: String,
}

#[derive(Deserialize)]
struct IntelArgs {
    query: String,
    #[serde(default = "default_k")]
    k: usize,
}

fn default_k() -> usize {
    DEFAULT_INTEL_K
}

pub struct RetrieveMissionIntel<E> {
    retriever: Arc<Retriever<E>>,
}

impl<E: Embedder> RetrieveMissionIntel<E> {
    pub fn new(retriever: Arc<Retriever<E>>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl<E: Embedder + 'static> Tool for RetrieveMissionIntel<E> {
    fn name(&self) -> &str {
        RETRIEVE_MISSION_INTEL
    }

    fn description(&self) -> &str {
        "Retrieve mission intel and threat data from classified documents"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Intelligence query, e.g. \"Hydra bases\" or \"alien technology\""
                },
                "k": {
                    "type": "integer",
                    "description": "Number of top classified reports to return",
                    "default": DEFAULT_INTEL_K,
                    "minimum": 1
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, ctx: &MissionContext, args: Value) -> Result<Value> {
        let args: IntelArgs = parse_args(self.name(), args)?;
        if args.k == 0 {
            return Err(Error::ToolFailed(
                self.name().to_string(),
                "k must be at least 1".to_string(),
            ));
        }

        let results: Vec<RetrievalResult> = self
            .retriever
            .retrieve(&args.query, args.k)
            .await?
            .into_iter()
            .map(|chunk| RetrievalResult {
                similarity_score: chunk.similarity,
                content: format!("[CLEARANCE {}] {}", ctx.clearance_level, chunk.content),
            })
            .collect();

        Ok(serde_json::to_value(results)?)
    }
}

pub struct GetAvailableHeroes {
    directory: Arc<HeroDirectory>,
}

impl GetAvailableHeroes {
    pub fn new(directory: Arc<HeroDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for GetAvailableHeroes {
    fn name(&self) -> &str {
        GET_AVAILABLE_HEROES
    }

    fn description(&self) -> &str {
        "List heroes currently available for missions with their capabilities"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _ctx: &MissionContext, _args: Value) -> Result<Value> {
        let heroes: Vec<SuperheroInfo> = self
            .directory
            .available()
            .into_iter()
            .map(SuperheroInfo::from)
            .collect();
        Ok(serde_json::to_value(heroes)?)
    }
}

#[derive(Deserialize)]
struct SpecialtyArgs {
    specialty: String,
}

pub struct GetHeroesBySpecialty {
    directory: Arc<HeroDirectory>,
}

impl GetHeroesBySpecialty {
    pub fn new(directory: Arc<HeroDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for GetHeroesBySpecialty {
    fn name(&self) -> &str {
        GET_HEROES_BY_SPECIALTY
    }

    fn description(&self) -> &str {
        "Find every hero who specializes in the requested area"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "specialty": {
                    "type": "string",
                    "description": "Required specialty, e.g. \"divine_magic\", \"technology\" or \"stealth\""
                }
            },
            "required": ["specialty"]
        })
    }

    async fn call(&self, _ctx: &MissionContext, args: Value) -> Result<Value> {
        let args: SpecialtyArgs = parse_args(self.name(), args)?;
        let heroes: Vec<SuperheroInfo> = self
            .directory
            .by_specialty(&args.specialty)
            .into_iter()
            .map(SuperheroInfo::from)
            .collect();
        Ok(serde_json::to_value(heroes)?)
    }
}

#[derive(Deserialize)]
struct GraphSearchArgs {
    query: String,
    #[serde(default = "default_graph_limit")]
    limit: usize,
}

fn default_graph_limit() -> usize {
    DEFAULT_GRAPH_LIMIT
}

/// Episode search over the knowledge graph
pub struct SearchKnowledgeGraph {
    client: Arc<GraphClient>,
}

impl SearchKnowledgeGraph {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchKnowledgeGraph {
    fn name(&self) -> &str {
        SEARCH_KNOWLEDGE_GRAPH
    }

    fn description(&self) -> &str {
        "Search the knowledge graph for episodes about MCU heroes and events, newest first"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Phrase to look for, e.g. \"Captain America\""
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of episodes to return",
                    "default": DEFAULT_GRAPH_LIMIT,
                    "minimum": 1
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, _ctx: &MissionContext, args: Value) -> Result<Value> {
        let args: GraphSearchArgs = parse_args(self.name(), args)?;
        if args.limit == 0 {
            return Err(Error::ToolFailed(
                self.name().to_string(),
                "limit must be at least 1".to_string(),
            ));
        }

        let hits = self.client.search(&args.query, args.limit).await?;
        Ok(serde_json::to_value(hits)?)
    }
}

/// Registry holding the three mission tools
pub fn mission_tools<E: Embedder + 'static>(
    retriever: Arc<Retriever<E>>,
    directory: Arc<HeroDirectory>,
) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(RetrieveMissionIntel::new(retriever)))?;
    registry.register(Arc::new(GetAvailableHeroes::new(Arc::clone(&directory))))?;
    registry.register(Arc::new(GetHeroesBySpecialty::new(directory)))?;
    Ok(registry)
}

/// Add episode search to a registry
pub fn add_graph_search(registry: &mut ToolRegistry, client: Arc<GraphClient>) -> Result<()> {
    registry.register(Arc::new(SearchKnowledgeGraph::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphConfig;
    use crate::rag::retriever::tests::KeywordEmbedder;
    use crate::storage::{Database, DocumentRepository};

    async fn registry() -> ToolRegistry {
        let db = Database::in_memory().await.unwrap();
        let repo = DocumentRepository::new(&db);
        let doc = repo.upsert_document("intel.md", "...").await.unwrap();
        repo.insert_chunk(doc, 0, "Hydra stole the shield schematics", &[0.0, 1.0, 0.0])
            .await
            .unwrap();
        repo.insert_chunk(doc, 1, "Stark armor prototypes", &[0.0, 0.0, 1.0])
            .await
            .unwrap();

        let retriever = Arc::new(Retriever::new(db, KeywordEmbedder));
        mission_tools(retriever, Arc::new(HeroDirectory::avengers())).unwrap()
    }

    #[tokio::test]
    async fn test_registry_names() {
        let registry = registry().await;
        assert_eq!(
            registry.names(),
            vec![RETRIEVE_MISSION_INTEL, GET_AVAILABLE_HEROES, GET_HEROES_BY_SPECIALTY]
        );
        assert_eq!(registry.definitions().len(), 3);
    }

    #[tokio::test]
    async fn test_retrieve_mission_intel_stamps_clearance() {
        let registry = registry().await;
        let ctx = MissionContext::new("OPERATION_THUNDERSTRIKE", 8).unwrap();

        let out = registry
            .invoke(RETRIEVE_MISSION_INTEL, &ctx, json!({"query": "shield", "k": 1}))
            .await
            .unwrap();
        let results: Vec<RetrievalResult> = serde_json::from_value(out).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "[CLEARANCE 8] Hydra stole the shield schematics");
        assert!((results[0].similarity_score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_retrieve_mission_intel_defaults_k() {
        let registry = registry().await;
        let out = registry
            .invoke(RETRIEVE_MISSION_INTEL, &MissionContext::default(), json!({"query": "armor"}))
            .await
            .unwrap();
        assert_eq!(out.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retrieve_mission_intel_requires_query() {
        let registry = registry().await;
        let err = registry
            .invoke(RETRIEVE_MISSION_INTEL, &MissionContext::default(), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolFailed(..)));
    }

    #[tokio::test]
    async fn test_hero_tools() {
        let registry = registry().await;
        let ctx = MissionContext::default();

        let available = registry
            .invoke(GET_AVAILABLE_HEROES, &ctx, Value::Null)
            .await
            .unwrap();
        assert_eq!(available.as_array().unwrap().len(), 3);
        assert_eq!(available[0]["name"], "Iron Man");
        assert_eq!(available[0]["status"], "active");

        let magic = registry
            .invoke(GET_HEROES_BY_SPECIALTY, &ctx, json!({"specialty": "Divine_Magic"}))
            .await
            .unwrap();
        let magic: Vec<SuperheroInfo> = serde_json::from_value(magic).unwrap();
        assert_eq!(magic.len(), 1);
        assert_eq!(magic[0].name, "Thor");
    }

    fn graph_client(server: &mockito::ServerGuard) -> Arc<GraphClient> {
        let config = GraphConfig {
            uri: server.url(),
            user: "neo4j".to_string(),
            password: "secret".to_string(),
            database: "neo4j".to_string(),
            timeout_secs: 5,
        };
        Arc::new(GraphClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_search_knowledge_graph() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/db/neo4j/tx/commit")
            .match_body(mockito::Matcher::PartialJson(json!({
                "statements": [{"parameters": {"query": "captain america", "limit": 5}}]
            })))
            .with_status(200)
            .with_body(
                r#"{"results":[{"columns":[],"data":[
                    {"row":["u2","Post 3","Sam Wilson is Captain America.","text","Hero status update","2019-04-27T00:00:00Z"]}
                ]}],"errors":[]}"#,
            )
            .create_async()
            .await;

        let mut registry = registry().await;
        add_graph_search(&mut registry, graph_client(&server)).unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.names()[3], SEARCH_KNOWLEDGE_GRAPH);

        let out = registry
            .invoke(
                SEARCH_KNOWLEDGE_GRAPH,
                &MissionContext::default(),
                json!({"query": "captain america", "limit": 5}),
            )
            .await
            .unwrap();

        let hits = out.as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["name"], "Post 3");
        assert_eq!(hits[0]["content"], "Sam Wilson is Captain America.");
        assert_eq!(hits[0]["valid_at"], "2019-04-27T00:00:00Z");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_knowledge_graph_rejects_zero_limit() {
        let server = mockito::Server::new_async().await;
        let mut registry = ToolRegistry::new();
        add_graph_search(&mut registry, graph_client(&server)).unwrap();

        let err = registry
            .invoke(
                SEARCH_KNOWLEDGE_GRAPH,
                &MissionContext::default(),
                json!({"query": "thor", "limit": 0}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolFailed(..)));
    }

    #[tokio::test]
    async fn test_search_knowledge_graph_surfaces_cypher_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/db/neo4j/tx/commit")
            .with_status(200)
            .with_body(r#"{"results":[],"errors":[{"code":"Neo.ClientError.Statement.SyntaxError","message":"bad"}]}"#)
            .create_async()
            .await;

        let mut registry = ToolRegistry::new();
        add_graph_search(&mut registry, graph_client(&server)).unwrap();

        let err = registry
            .invoke(SEARCH_KNOWLEDGE_GRAPH, &MissionContext::default(), json!({"query": "thor"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GraphError(msg) if msg.contains("SyntaxError")));
    }
}
