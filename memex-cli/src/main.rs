//! memex CLI: serve the capture bridge, import browsing history and
//! bookmarks, save single URLs, and query the saved corpus. Config from env
//! (.env supported) and CLI args.

use std::fs;
use std::sync::Arc;

use ai_client::{EnvAiConfig, OpenAiClient};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bridge::server::CaptureHandler;
use clap::{Parser, Subcommand};
use extractor::{Extractor, ExtractorConfig, ReqwestConnectivity};
use ingest::{CaptureProcessor, HistoryPipeline, SaveFlows};
use memex_core::config::{AiGateConfig, IngestConfig, SearchConfig};
use memex_core::store::{MemoryStore, SearchCache};
use memex_core::types::{CaptureRequest, CaptureResponse, HistoryEntry};
use semantic_search::SearchEngine;
use storage::{MemoryRepository, SearchCacheRepository, SqlitePoolManager};

#[derive(Parser)]
#[command(name = "memex")]
#[command(about = "Personal second brain: capture pages, import history, query your memories", long_about = None)]
#[command(version)]
struct Cli {
    /// Owner of the memories being read or written.
    #[arg(long, global = true, default_value = "local")]
    user: String,

    /// SQLite database path (MEMEX_DB overrides the default).
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the local control channel the capture host connects to.
    Serve,
    /// Import a browsing-history export (JSON array of entries) through the
    /// filter → select → fetch → persist pipeline.
    ImportHistory {
        /// Path to the history JSON file.
        file: String,
    },
    /// Fetch and save one URL.
    SaveUrl {
        url: String,
        /// Why this is worth remembering (stored alongside the memory).
        #[arg(short, long, default_value = "")]
        intent: String,
    },
    /// Import bookmarks (JSON array of URL strings), one memory each.
    ImportBookmarks {
        /// Path to the bookmarks JSON file.
        file: String,
    },
    /// Ask a question against the saved corpus.
    Search { query: String },
    /// List the most recent searches.
    Recent {
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
    /// Corpus stats for the user.
    Stats,
    /// Delete one memory by id.
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let log_path = std::env::var("MEMEX_LOG_FILE").unwrap_or_else(|_| "memex.log".to_string());
    memex_core::logger::init_tracing(&log_path)?;

    let cli = Cli::parse();
    let db_path = cli
        .db
        .clone()
        .or_else(|| std::env::var("MEMEX_DB").ok())
        .unwrap_or_else(|| "memex.db".to_string());

    match cli.command {
        Commands::Serve => handle_serve(&db_path, &cli.user).await,
        Commands::ImportHistory { file } => handle_import_history(&db_path, &cli.user, &file).await,
        Commands::SaveUrl { url, intent } => {
            handle_save_url(&db_path, &cli.user, &url, &intent).await
        }
        Commands::ImportBookmarks { file } => {
            handle_import_bookmarks(&db_path, &cli.user, &file).await
        }
        Commands::Search { query } => handle_search(&db_path, &cli.user, &query).await,
        Commands::Recent { limit } => handle_recent(&db_path, &cli.user, limit).await,
        Commands::Stats => handle_stats(&db_path, &cli.user).await,
        Commands::Delete { id } => handle_delete(&db_path, &cli.user, id).await,
    }
}

/// Opens both repositories over one shared pool.
async fn open_stores(db_path: &str) -> Result<(Arc<MemoryRepository>, Arc<SearchCacheRepository>)> {
    let pool = SqlitePoolManager::new(db_path)
        .await
        .with_context(|| format!("failed to open database at {db_path}"))?;
    let memories = MemoryRepository::from_pool(pool.clone());
    memories.init().await?;
    let searches = SearchCacheRepository::from_pool(pool);
    searches.init().await?;
    Ok((Arc::new(memories), Arc::new(searches)))
}

/// Builds the OpenAI-backed collaborator client from env config.
fn open_ai_client() -> Result<Arc<OpenAiClient>> {
    let config = EnvAiConfig::from_env()?;
    config.validate()?;
    Ok(Arc::new(OpenAiClient::new(&config)))
}

struct AppCaptureHandler {
    processor: CaptureProcessor,
    user_id: String,
}

#[async_trait]
impl CaptureHandler for AppCaptureHandler {
    async fn handle(&self, req: CaptureRequest) -> CaptureResponse {
        self.processor.process(&self.user_id, req).await
    }
}

async fn handle_serve(db_path: &str, user: &str) -> Result<()> {
    let (memories, _) = open_stores(db_path).await?;
    let ai = open_ai_client()?;

    let handler = Arc::new(AppCaptureHandler {
        processor: CaptureProcessor::new(memories, ai.clone(), ai),
        user_id: user.to_string(),
    });

    let port = bridge::bridge_port();
    println!("memex control channel listening on 127.0.0.1:{port}");
    bridge::server::run_server(port, handler).await?;
    Ok(())
}

async fn handle_import_history(db_path: &str, user: &str, file: &str) -> Result<()> {
    let raw = fs::read_to_string(file).with_context(|| format!("failed to read {file}"))?;
    let entries: Vec<HistoryEntry> =
        serde_json::from_str(&raw).context("history file must be a JSON array of entries")?;

    let (memories, _) = open_stores(db_path).await?;
    let ai = open_ai_client()?;
    let extractor = Arc::new(Extractor::new(ExtractorConfig::default())?);

    let pipeline = HistoryPipeline::new(
        memories,
        extractor,
        ai.clone(),
        ai.clone(),
        ai,
        Arc::new(ReqwestConnectivity::default()),
        IngestConfig::default(),
    );

    let result = pipeline
        .run(user, entries, &mut |p| {
            println!("[{:>3.0}%] {}", p.progress, p.message);
        })
        .await?;

    println!("{}", result.message);
    println!(
        "funnel: {} input -> {} after blocklist -> {} to ranker -> {} selected -> {} fetched -> {} saved",
        result.stats.total_input,
        result.stats.after_blocklist,
        result.stats.sent_to_ai,
        result.stats.ai_selected,
        result.stats.successfully_fetched,
        result.stats.final_count,
    );
    Ok(())
}

fn save_flows(
    memories: Arc<MemoryRepository>,
    ai: Arc<OpenAiClient>,
    extractor: Arc<Extractor>,
) -> SaveFlows {
    SaveFlows::new(memories, extractor, ai.clone(), ai, IngestConfig::default())
}

async fn handle_save_url(db_path: &str, user: &str, url: &str, intent: &str) -> Result<()> {
    let (memories, _) = open_stores(db_path).await?;
    let ai = open_ai_client()?;
    let extractor = Arc::new(Extractor::new(ExtractorConfig::default())?);

    let flows = save_flows(memories, ai, extractor);
    match flows.save_single_url(user, url, intent).await {
        Ok(id) => {
            println!("Memory saved successfully! (id {id})");
            Ok(())
        }
        Err(e) => {
            println!("{e}");
            std::process::exit(1);
        }
    }
}

async fn handle_import_bookmarks(db_path: &str, user: &str, file: &str) -> Result<()> {
    let raw = fs::read_to_string(file).with_context(|| format!("failed to read {file}"))?;
    let urls: Vec<String> =
        serde_json::from_str(&raw).context("bookmarks file must be a JSON array of URLs")?;

    let (memories, _) = open_stores(db_path).await?;
    let ai = open_ai_client()?;
    let extractor = Arc::new(Extractor::new(ExtractorConfig::default())?);
    let flows = save_flows(memories, ai, extractor);

    let total = urls.len();
    let mut saved = 0usize;
    for (index, url) in urls.iter().enumerate() {
        // One bad bookmark never aborts the batch.
        match flows.import_bookmark(user, url).await {
            Ok(_) => {
                saved += 1;
                println!("[{}/{}] saved {}", index + 1, total, url);
            }
            Err(e) => {
                println!("[{}/{}] skipped {}: {}", index + 1, total, url, e);
            }
        }
    }

    println!("Imported {saved} of {total} bookmarks.");
    Ok(())
}

async fn handle_search(db_path: &str, user: &str, query: &str) -> Result<()> {
    let (memories, searches) = open_stores(db_path).await?;
    let ai = open_ai_client()?;

    let engine = SearchEngine::new(
        memories,
        searches,
        ai.clone(),
        ai,
        Arc::new(ReqwestConnectivity::default()),
        SearchConfig::default(),
        AiGateConfig::default(),
    );

    let response = engine.search_with_cache(user, query).await?;

    println!("{}", response.answer);
    if !response.sources.is_empty() {
        println!();
        for (index, source) in response.sources.iter().enumerate() {
            println!(
                "  [{}] {} ({:.2})\n      {}",
                index + 1,
                source.title,
                source.similarity,
                source.url
            );
        }
    }
    if let Some(confidence) = response.confidence {
        println!(
            "\nconfidence: {:?}, generative: {}",
            confidence, response.used_ai
        );
    }
    Ok(())
}

async fn handle_recent(db_path: &str, user: &str, limit: usize) -> Result<()> {
    let (_, searches) = open_stores(db_path).await?;
    for search in searches.recent(user, limit).await? {
        println!("{}  {}", search.date.format("%Y-%m-%d %H:%M"), search.query);
    }
    Ok(())
}

async fn handle_stats(db_path: &str, user: &str) -> Result<()> {
    let (memories, _) = open_stores(db_path).await?;
    let stats = memories.stats_for_user(user).await?;
    println!(
        "{} memories, average embedding {} bytes",
        stats.total_memories, stats.avg_embedding_size as u64
    );
    Ok(())
}

async fn handle_delete(db_path: &str, user: &str, id: i64) -> Result<()> {
    let (memories, _) = open_stores(db_path).await?;
    memories.delete(id, user).await?;
    println!("Deleted memory {id}.");
    Ok(())
}
