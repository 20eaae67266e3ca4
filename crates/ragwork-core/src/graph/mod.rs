//! Temporal knowledge-graph episodes
//!
//! Episodes are loaded from a JSON file and stored as `Episodic` nodes in
//! Neo4j. Entity and fact extraction happen outside this crate.

pub mod client;
pub mod episode;

pub use client::{EpisodeHit, GraphClient, GraphConfig, ingest_episodes};
pub use episode::{Episode, EpisodeKind, load_episodes};
