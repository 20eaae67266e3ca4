//! Ragwork CLI - retrieval-augmented generation workshop toolkit

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ragwork_core::agent::{
    HeroDirectory, HeroStatus, MissionContext, RETRIEVE_MISSION_INTEL, SEARCH_KNOWLEDGE_GRAPH,
    SuperheroInfo, ToolRegistry, add_graph_search, mission_tools,
};
use ragwork_core::config::{
    Config, DATABASE_URL_VAR, NEO4J_PASSWORD_VAR, NEO4J_URI_VAR, NEO4J_USER_VAR,
    OPENAI_API_KEY_VAR, require_env,
};
use ragwork_core::graph::{GraphClient, GraphConfig, ingest_episodes, load_episodes};
use ragwork_core::llm::{LlmClient, UnconfiguredEmbedder};
use ragwork_core::rag::{
    Ingestor, PASSAGE_WIDTH, RagPipeline, Retriever, WordChunker, render_answer, wrap_words,
};
use ragwork_core::storage::{Database, DocumentRepository};
use tracing::warn;

/// Question asked by `ragwork ask` when none is given
const DEMO_QUESTION: &str = "Have Wolverine and Deadpool ever met?";

#[derive(Parser)]
#[command(name = "ragwork")]
#[command(author, version, about = "Retrieval-augmented generation workshop toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the documents and chunks tables
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },

    /// Chunk, embed and store every .md file in a directory
    Ingest {
        /// Directory holding the markdown files (defaults to ingest.data_dir)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        /// Drop and recreate the tables first
        #[arg(long)]
        reset: bool,
    },

    /// Show the stored chunks closest to a query
    Retrieve {
        query: String,
        /// Number of chunks to return (defaults to retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Answer a question from the stored documents
    Ask {
        /// Question to answer
        question: Option<String>,
        /// Number of chunks to use as context (defaults to retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Inspect and call the mission tools
    Tools {
        #[command(subcommand)]
        action: ToolsAction,
    },

    /// Show the hero roster
    Heroes {
        /// Only heroes with this specialty
        #[arg(short, long)]
        specialty: Option<String>,
        /// Only heroes that are active
        #[arg(short, long)]
        available: bool,
    },

    /// Knowledge-graph episodes
    Graph {
        #[command(subcommand)]
        action: GraphAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum SchemaAction {
    /// Create the tables if they do not exist
    Init,
    /// Drop and recreate the tables
    Reset,
    /// Show schema version and row counts
    Status,
}

#[derive(Subcommand)]
enum ToolsAction {
    /// List tools with their descriptions
    List,
    /// Call a tool directly
    Call {
        name: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
        /// Mission identifier
        #[arg(long, default_value = ragwork_core::agent::DEFAULT_MISSION_ID)]
        mission: String,
        /// Clearance level, 1 to 10
        #[arg(long, default_value_t = 5)]
        clearance: u8,
    },
}

#[derive(Subcommand)]
enum GraphAction {
    /// Add episodes from a JSON file
    Ingest {
        /// Episodes file (defaults to graph.episodes_file)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Episode name prefix (defaults to graph.episode_prefix)
        #[arg(short, long)]
        prefix: Option<String>,
        /// Time the episodes are valid from, RFC 3339 (defaults to now)
        #[arg(long)]
        reference_time: Option<DateTime<Utc>>,
        /// Delete everything in the graph first
        #[arg(long)]
        clear: bool,
    },
    /// Find episodes mentioning a phrase
    Search {
        query: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Delete every node and relationship
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ragwork=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schema { action } => cmd_schema(action, cli.quiet).await,
        Commands::Ingest { data_dir, reset } => {
            cmd_ingest(data_dir, reset, cli.format, cli.quiet).await
        }
        Commands::Retrieve { query, k } => cmd_retrieve(&query, k, cli.format).await,
        Commands::Ask { question, k } => {
            let question = question.unwrap_or_else(|| DEMO_QUESTION.to_string());
            cmd_ask(&question, k, cli.format).await
        }
        Commands::Tools { action } => cmd_tools(action, cli.format).await,
        Commands::Heroes {
            specialty,
            available,
        } => cmd_heroes(specialty.as_deref(), available, cli.format),
        Commands::Graph { action } => cmd_graph(action, cli.format, cli.quiet).await,
        Commands::Config { action } => cmd_config(action, cli.quiet),
        Commands::Doctor => cmd_doctor(cli.quiet).await,
    }
}

// ============================================================================
// Shared setup
// ============================================================================

async fn open_database() -> anyhow::Result<Database> {
    let url = require_env(DATABASE_URL_VAR)?;
    Database::connect(&url).await
}

/// Client for the configured provider; fails when the key is missing
fn llm_client(config: &Config) -> anyhow::Result<LlmClient> {
    let api_key = config.llm.resolved_api_key()?;
    Ok(LlmClient::new(config.llm.clone(), api_key)?)
}

fn resolve_k(k: Option<usize>, config: &Config) -> anyhow::Result<usize> {
    let k = k.unwrap_or(config.retrieval.top_k);
    if k == 0 {
        bail!("k must be at least 1");
    }
    Ok(k)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_schema(action: SchemaAction, quiet: bool) -> anyhow::Result<()> {
    let db = open_database().await?;

    match action {
        SchemaAction::Init => {
            if !quiet {
                let status = db.migration_status().await?;
                println!("Schema ready (v{}).", status.current_version);
            }
        }
        SchemaAction::Reset => {
            db.reset_schema().await?;
            if !quiet {
                println!("Documents and chunks tables dropped and recreated.");
            }
        }
        SchemaAction::Status => {
            let status = db.migration_status().await?;
            let stats = DocumentRepository::new(&db).stats().await?;
            println!(
                "Schema: v{} (target v{})",
                status.current_version, status.target_version
            );
            println!("Documents: {}", stats.documents);
            println!("Chunks: {}", stats.chunks);
            if !stats.dimensions.is_empty() {
                let dims: Vec<String> = stats.dimensions.iter().map(|d| d.to_string()).collect();
                println!("Vector dimensions: {}", dims.join(", "));
            }
        }
    }

    db.close().await;
    Ok(())
}

async fn cmd_ingest(
    data_dir: Option<PathBuf>,
    reset: bool,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = llm_client(&config)?;
    let db = open_database().await?;

    let data_dir = data_dir.unwrap_or_else(|| config.ingest.data_dir.clone());
    let chunker = WordChunker::new(config.ingest.chunk_size, config.ingest.chunk_overlap)?;

    let ingestor = Ingestor::new(db.clone(), client)
        .with_chunker(chunker)
        .expect_dimensions(config.llm.embedding_dimensions);

    let report = ingestor
        .ingest_dir(&data_dir, reset)
        .await
        .with_context(|| format!("Ingestion from {} failed", data_dir.display()))?;
    db.close().await;

    if format == OutputFormat::Json {
        return print_json(&report);
    }

    if !quiet {
        if report.documents == 0 && report.skipped_files == 0 {
            println!("No .md files found in {}", data_dir.display());
            return Ok(());
        }
        println!("Ingestion complete.");
        println!("  Documents: {}", report.documents);
        println!("  Chunks stored: {}", report.chunks_stored);
        if report.chunks_unchanged > 0 {
            println!("  Chunks already present: {}", report.chunks_unchanged);
        }
        if report.chunks_failed > 0 {
            println!("  Chunks failed: {}", report.chunks_failed);
        }
        if report.skipped_files > 0 {
            println!("  Empty files skipped: {}", report.skipped_files);
        }
        println!("\nTry: ragwork ask \"{}\"", DEMO_QUESTION);
    }
    Ok(())
}

async fn cmd_retrieve(query: &str, k: Option<usize>, format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::load()?;
    let k = resolve_k(k, &config)?;
    let client = llm_client(&config)?;
    let db = open_database().await?;

    let retriever = Retriever::new(db.clone(), client);
    let results = retriever.retrieve(query, k).await?;
    db.close().await;

    if format == OutputFormat::Json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!("No chunks stored. Run `ragwork ingest` first.");
        return Ok(());
    }
    for (i, result) in results.iter().enumerate() {
        println!("[{}] Similarity: {:.3}", i + 1, result.similarity);
        for line in wrap_words(&result.content, PASSAGE_WIDTH) {
            println!("    {}", line);
        }
        println!();
    }
    Ok(())
}

async fn cmd_ask(question: &str, k: Option<usize>, format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::load()?;
    let k = resolve_k(k, &config)?;
    let client = llm_client(&config)?;
    let db = open_database().await?;

    let pipeline = RagPipeline::new(Retriever::new(db.clone(), client.clone()), client);
    let answer = pipeline.answer(question, k).await;
    db.close().await;

    if format == OutputFormat::Json {
        return print_json(&answer);
    }
    print!("{}", render_answer(&answer));
    Ok(())
}

fn graph_client(config: &Config) -> anyhow::Result<GraphClient> {
    let graph = GraphConfig::from_env(config.graph.database.clone())?
        .with_timeout(config.graph.timeout_secs);
    Ok(GraphClient::new(graph)?)
}

/// Registry for `tools`. Only retrieval needs the provider and database;
/// graph search is added when the Neo4j variables are set.
async fn tool_registry(calling: Option<&str>) -> anyhow::Result<ToolRegistry> {
    let config = Config::load()?;
    let directory = Arc::new(HeroDirectory::avengers());

    let mut registry = if calling == Some(RETRIEVE_MISSION_INTEL) {
        let client = llm_client(&config)?;
        let db = open_database().await?;
        mission_tools(Arc::new(Retriever::new(db, client)), directory)?
    } else {
        let db = Database::in_memory().await?;
        mission_tools(Arc::new(Retriever::new(db, UnconfiguredEmbedder)), directory)?
    };

    match graph_client(&config) {
        Ok(client) => add_graph_search(&mut registry, Arc::new(client))?,
        Err(e) if calling == Some(SEARCH_KNOWLEDGE_GRAPH) => return Err(e),
        Err(_) => {}
    }
    Ok(registry)
}

async fn cmd_tools(action: ToolsAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        ToolsAction::List => {
            let registry = tool_registry(None).await?;
            if format == OutputFormat::Json {
                return print_json(&registry.definitions());
            }
            println!("Tools:");
            for def in registry.definitions() {
                println!(
                    "  {} - {}",
                    def["function"]["name"].as_str().unwrap_or_default(),
                    def["function"]["description"].as_str().unwrap_or_default()
                );
            }
        }
        ToolsAction::Call {
            name,
            args,
            mission,
            clearance,
        } => {
            let ctx = MissionContext::new(mission, clearance)?;
            let args: serde_json::Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            let registry = tool_registry(Some(&name)).await?;
            let output = registry.invoke(&name, &ctx, args).await?;
            print_json(&output)?;
        }
    }
    Ok(())
}

fn cmd_heroes(specialty: Option<&str>, available: bool, format: OutputFormat) -> anyhow::Result<()> {
    let directory = HeroDirectory::avengers();

    let mut heroes: Vec<_> = match specialty {
        Some(s) => directory.by_specialty(s),
        None => directory.all().collect(),
    };
    if available {
        heroes.retain(|h| h.status == HeroStatus::Active);
    }

    if format == OutputFormat::Json {
        let infos: Vec<SuperheroInfo> = heroes.into_iter().map(SuperheroInfo::from).collect();
        return print_json(&infos);
    }

    if heroes.is_empty() {
        println!("No heroes found.");
        return Ok(());
    }
    for hero in heroes {
        println!("{} [{}] - {}", hero.name, hero.status, hero.location);
        let powers: Vec<String> = hero
            .powers
            .iter()
            .map(|(power, level)| format!("{} {}", power, level))
            .collect();
        println!("  Powers: {}", powers.join(", "));
        println!("  Specialties: {}", hero.specialties.join(", "));
    }
    Ok(())
}

async fn cmd_graph(action: GraphAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = graph_client(&config)?;

    match action {
        GraphAction::Ingest {
            file,
            prefix,
            reference_time,
            clear,
        } => {
            let file = file.unwrap_or_else(|| config.graph.episodes_file.clone());
            let prefix = prefix.unwrap_or_else(|| config.graph.episode_prefix.clone());

            let episodes = load_episodes(&file);
            if episodes.is_empty() {
                warn!(file = %file.display(), "No episodes loaded");
                if !quiet {
                    println!("No episodes loaded from {}.", file.display());
                }
                return Ok(());
            }

            client.build_indices().await?;
            if clear {
                let deleted = client.clear().await?;
                if !quiet {
                    println!("Cleared {} nodes.", deleted);
                }
            }

            let when = reference_time.unwrap_or_else(Utc::now);
            let added = ingest_episodes(&client, &episodes, &prefix, when).await?;
            if !quiet {
                println!("Added {} episodes (valid from {}).", added, when.to_rfc3339());
            }
        }
        GraphAction::Search { query, limit } => {
            let hits = client.search(&query, limit).await?;
            if format == OutputFormat::Json {
                return print_json(&hits);
            }
            if hits.is_empty() {
                println!("No episodes match '{}'.", query);
            }
            for hit in hits {
                println!("{} ({}, valid from {})", hit.name, hit.source, hit.valid_at);
                println!("  UUID: {}", hit.uuid);
                for line in wrap_words(&hit.content, PASSAGE_WIDTH) {
                    println!("    {}", line);
                }
            }
        }
        GraphAction::Clear => {
            let deleted = client.clear().await?;
            if !quiet {
                println!("Graph cleared ({} nodes deleted).", deleted);
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Ragwork Health Check");
        println!("====================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }

            match config.llm.redacted_api_key() {
                Ok(Some(redacted)) => {
                    if !quiet {
                        println!("[OK] API Key: Configured ({})", redacted);
                    }
                }
                Ok(None) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] API Key: Not configured");
                        println!("     Set the {} environment variable", OPENAI_API_KEY_VAR);
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] API Key: Error - {}", e);
                    }
                }
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {}", e);
            }
        }
    }

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) => {
                if path.exists() {
                    println!("[OK] Config file: {}", path.display());
                } else {
                    println!("[--] Config file: {} (using defaults)", path.display());
                }
            }
            Err(e) => {
                println!("[!!] Config file: Error - {}", e);
            }
        }
    }

    // Check database
    match open_database().await {
        Ok(db) => {
            match db.health_check().await {
                Ok(()) => {
                    if !quiet {
                        println!("[OK] Database: Connected");
                    }
                    match db.migration_status().await {
                        Ok(status) if status.needs_migration => {
                            all_ok = false;
                            if !quiet {
                                println!(
                                    "[!!] Database: Migrations pending (v{} -> v{})",
                                    status.current_version, status.target_version
                                );
                            }
                        }
                        Ok(status) => {
                            if !quiet {
                                println!("[OK] Database: Schema v{}", status.current_version);
                            }
                        }
                        Err(e) => {
                            all_ok = false;
                            if !quiet {
                                println!("[!!] Database: Migration check failed - {}", e);
                            }
                        }
                    }
                    if let Ok(stats) = DocumentRepository::new(&db).stats().await {
                        if !quiet {
                            println!(
                                "     Documents: {}, Chunks: {}",
                                stats.documents, stats.chunks
                            );
                        }
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] Database: Health check failed - {:#}", e);
                    }
                }
            }
            db.close().await;
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: {:#}", e);
            }
        }
    }

    // Graph credentials are only needed by `ragwork graph`
    let missing_graph: Vec<&str> = [NEO4J_URI_VAR, NEO4J_USER_VAR, NEO4J_PASSWORD_VAR]
        .into_iter()
        .filter(|var| require_env(var).is_err())
        .collect();
    if !quiet {
        if missing_graph.is_empty() {
            println!("[OK] Graph: Credentials configured");
        } else {
            println!(
                "[--] Graph: {} not set (only needed for `ragwork graph`)",
                missing_graph.join(", ")
            );
        }
    }

    // Summary
    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}
