//! # Stockroom CLI (`stock`)
//!
//! The `stock` binary is the primary interface for Stockroom. It provides
//! commands for initializing the data files, reconciling the raw capture log
//! into the structured store, searching records, printing label manifests,
//! managing the shared reorder queue, and syncing the store through a bucket.
//!
//! ## Usage
//!
//! ```bash
//! stock --config ./config/stockroom.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stock init` | Create the data files and a starter config |
//! | `stock reconcile` | Reconcile the raw log into the slotted store |
//! | `stock search "<query>"` | Search store records |
//! | `stock stats` | Store statistics and slot usage |
//! | `stock check` | List capture photos missing from the store |
//! | `stock labels` | Produce the label manifest (text or JSON) |
//! | `stock reorder add <pn>` | Append a part to the shared reorder queue |
//! | `stock push` / `stock pull` | Sync the store file through the bucket |
//!
//! ## Examples
//!
//! ```bash
//! # First-time setup
//! stock init
//!
//! # See what a run would do, then do it
//! stock reconcile --dry-run
//! stock reconcile --push
//!
//! # Find a part
//! stock search "0.1uF 0603"
//! stock search "YAGEO" --key "Fabricated Company"
//!
//! # Queue a restock
//! stock reorder add 297-11433-1-ND --description "325 OHM resistor"
//! ```

mod blockfile;
mod bucket;
mod check;
mod chunk;
mod config;
mod dedup;
mod extract;
mod heuristics;
mod init;
mod labels;
mod models;
mod progress;
mod reconcile;
mod reorder;
mod retry;
mod search;
mod slots;
mod stats;
mod store;
mod sync;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::progress::ProgressMode;

/// Stockroom CLI: reconcile OCR'd part captures into a slotted inventory
/// store.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/stockroom.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "stock",
    about = "Reconcile OCR'd electronics-part captures into a slotted inventory store",
    version,
    long_about = "Stockroom turns an append-only log of OCR'd part photos into a structured, \
    searchable inventory: new capture blocks are extracted into records by a configurable \
    provider, assigned storage-box slots from a bounded per-prefix namespace, and duplicate \
    part numbers are reconciled onto shared slots. The store is a flat text file that syncs \
    through a bucket so the whole lab reads one copy."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/stockroom.toml`. All path, extraction, slot,
    /// and bucket settings are read from this file.
    #[arg(long, global = true, default_value = "./config/stockroom.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the data files and a starter configuration.
    ///
    /// Writes the config file (if absent), then creates the raw log and
    /// store files it names. This command is idempotent; running it multiple
    /// times is safe.
    Init,

    /// Reconcile the raw capture log into the structured store.
    ///
    /// Diffs the raw log against the store by item id, extracts fields from
    /// new blocks via the configured provider, assigns storage slots, and
    /// reconciles duplicate part numbers onto shared slots.
    Reconcile {
        /// Show block and chunk counts without extracting or writing.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of new blocks to process in this run.
        #[arg(long)]
        limit: Option<usize>,

        /// Upload the store to the bucket after a successful run.
        #[arg(long)]
        push: bool,

        /// Progress reporting: `auto`, `human`, `json`, or `off`.
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// Search the store.
    ///
    /// Splits the query into whitespace terms; a record matches when every
    /// term occurs (case-insensitively) in at least one of its field values.
    Search {
        /// The search query string.
        query: String,

        /// Restrict matching to one field (e.g. `Description`, `Location`).
        #[arg(long)]
        key: Option<String>,

        /// Maximum number of results to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show store statistics and slot usage.
    Stats,

    /// Compare the photos directory against the store.
    ///
    /// Walks the configured photos directory and lists capture files that
    /// have no store record yet.
    Check,

    /// Produce the label manifest for printing.
    ///
    /// One entry per slotted record, sorted by slot. The PDF layout is a
    /// downstream step; this emits the manifest it consumes.
    Labels {
        /// Write to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: `text` or `json`.
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Manage the shared reorder queue.
    Reorder {
        #[command(subcommand)]
        action: ReorderAction,
    },

    /// Upload the store file to the bucket.
    Push,

    /// Download the store file from the bucket.
    ///
    /// Refuses to overwrite a non-empty local store unless `--force` is
    /// given.
    Pull {
        /// Overwrite the local store even if it is not empty.
        #[arg(long)]
        force: bool,
    },
}

/// Reorder queue subcommands.
#[derive(Subcommand)]
enum ReorderAction {
    /// Append a part to the reorder queue.
    Add {
        /// Distributor part number to reorder.
        part_number: String,

        /// Short description for the order line.
        #[arg(long)]
        description: String,

        /// Who asked for the part.
        #[arg(long, default_value = "N/A")]
        requester: String,
    },

    /// Print the reorder queue.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Init = &cli.command {
        init::run_init(&cli.config)?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            // Handled above (before config loading)
            unreachable!()
        }
        Commands::Reconcile {
            dry_run,
            limit,
            push,
            progress,
        } => {
            let mode = match progress.as_str() {
                "auto" => ProgressMode::default_for_tty(),
                "human" => ProgressMode::Human,
                "json" => ProgressMode::Json,
                "off" => ProgressMode::Off,
                other => anyhow::bail!(
                    "Unknown progress mode: {}. Use auto, human, json, or off.",
                    other
                ),
            };
            let reporter = mode.reporter();
            reconcile::run_reconcile(&cfg, dry_run, limit, push, reporter.as_ref()).await?;
        }
        Commands::Search { query, key, limit } => {
            search::run_search(&cfg, &query, key.as_deref(), limit)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Check => {
            check::run_check(&cfg)?;
        }
        Commands::Labels { output, format } => {
            labels::run_labels(&cfg, output.as_deref(), &format)?;
        }
        Commands::Reorder { action } => match action {
            ReorderAction::Add {
                part_number,
                description,
                requester,
            } => {
                reorder::run_reorder_add(&cfg, &part_number, &description, &requester).await?;
            }
            ReorderAction::List => {
                reorder::run_reorder_list(&cfg).await?;
            }
        },
        Commands::Push => {
            sync::run_push(&cfg).await?;
        }
        Commands::Pull { force } => {
            sync::run_pull(&cfg, force).await?;
        }
    }

    Ok(())
}
