//! Retrieval exposed as agent tools
//!
//! Tools share a `MissionContext`: document retrieval over the RAG store,
//! two lookups against the hero roster, and optional knowledge-graph search.

pub mod context;
pub mod heroes;
pub mod tool;
pub mod tools;

pub use context::{DEFAULT_MISSION_ID, FRIDAY_INSTRUCTIONS, MissionContext};
pub use heroes::{HeroDirectory, HeroStatus, Superhero, SuperheroInfo};
pub use tool::{Tool, ToolRegistry};
pub use tools::{
    GET_AVAILABLE_HEROES, GET_HEROES_BY_SPECIALTY, GetAvailableHeroes, GetHeroesBySpecialty,
    RETRIEVE_MISSION_INTEL, RetrievalResult, RetrieveMissionIntel, SEARCH_KNOWLEDGE_GRAPH,
    SearchKnowledgeGraph, add_graph_search, mission_tools,
};
