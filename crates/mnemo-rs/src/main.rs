//! `mnemo` command-line client for a local memory store.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::{debug, info};
use mnemo_rs::config::MnemoConfig;
use mnemo_rs::memory::{MemoryCategory, MemoryStore};
use mnemo_rs::{format_search_outcome, init_logging, open_store};
use std::path::PathBuf;

/// Command-line options for the memory client.
#[derive(Parser)]
#[command(name = "mnemo", version, about = "Persistent hybrid memory store")]
struct Cli {
    /// Optional path to a mnemo.json5 config file (skips layered discovery)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

/// Memory operations.
#[derive(Subcommand)]
enum Command {
    /// Save a memory.
    Save {
        /// Memory text.
        content: String,
        /// One of fact, preference, decision, lesson, context.
        #[arg(long, default_value = "fact")]
        category: MemoryCategory,
    },
    /// Hybrid search over saved memories.
    Search {
        /// Search query text.
        query: String,
        /// Maximum number of results (config default when omitted).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List memories, newest first.
    List {
        /// Maximum number of results (config default when omitted).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete a memory by id.
    Delete {
        /// Memory id.
        id: i64,
    },
    /// Print the number of stored memories.
    Count,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let mut config = if let Some(path) = cli.config.as_ref() {
        MnemoConfig::load_from_path(path).context("failed to load config")?
    } else {
        let layered = MnemoConfig::load_layered(&cwd).context("failed to load layered config")?;
        debug!("layered config loaded (layers={})", layered.layers.len());
        layered.config
    };
    config
        .apply_env()
        .context("invalid environment override")?;
    if let Some(db) = cli.db.as_ref() {
        config.memory.path = db.to_string_lossy().to_string();
    }
    config.validate().context("invalid config")?;

    let store = open_store(&config, &cwd).context("failed to open memory store")?;
    info!("memory store ready (path={})", store.path().display());
    run(cli.command, &store, &config, cli.json)
}

fn run(command: Command, store: &MemoryStore, config: &MnemoConfig, json: bool) -> Result<()> {
    match command {
        Command::Save { content, category } => {
            let id = store
                .save(&content, category)
                .context("failed to save memory")?;
            if json {
                println!("{}", serde_json::json!({ "id": id, "category": category }));
            } else {
                println!("Saved to memory under '{category}' (id {id}).");
            }
        }
        Command::Search { query, limit } => {
            let limit = limit.unwrap_or(config.memory.search_limit);
            let outcome = store.search(&query, limit).context("search failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", format_search_outcome(&outcome));
            }
        }
        Command::List { limit } => {
            let limit = limit.unwrap_or(config.memory.list_limit);
            let records = store.get_all(limit).context("failed to list memories")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No memories saved.");
            } else {
                for record in records {
                    println!(
                        "{:>5}  {}  [{}] {}",
                        record.id,
                        record.created_at.format("%Y-%m-%d %H:%M"),
                        record.category,
                        record.content
                    );
                }
            }
        }
        Command::Delete { id } => {
            if !store.delete(id).context("failed to delete memory")? {
                bail!("memory {id} not found");
            }
            if json {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                println!("Deleted memory {id}.");
            }
        }
        Command::Count => {
            let count = store.count().context("failed to count memories")?;
            if json {
                println!("{}", serde_json::json!({ "count": count }));
            } else {
                println!("{count}");
            }
        }
    }
    Ok(())
}
