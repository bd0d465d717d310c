//! # Brand Chat CLI (`brandchat`)
//!
//! The `brandchat` binary manages the knowledge base, inspects retrieval,
//! asks questions from the terminal, and starts the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! brandchat --config ./config/brandchat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `brandchat init` | Create an empty knowledge base file |
//! | `brandchat add --category <c>` | Chunk text and append it under a category |
//! | `brandchat list` | List items with their indices |
//! | `brandchat stats` | Total items and per-category counts |
//! | `brandchat remove <index>` | Remove one item |
//! | `brandchat remove-category <c>` | Remove every item in a category |
//! | `brandchat clear --yes` | Remove everything |
//! | `brandchat retrieve "<query>"` | Show which items a question would use |
//! | `brandchat ask "<question>"` | Answer a question (streams the reply) |
//! | `brandchat serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use brand_chat::config::{self, Config};
use brand_chat::ingest::TextSource;
use brand_chat::{chat, ingest, knowledge, search, server, stats};

/// Brand Chat CLI: a grounded chat assistant for a personal brand.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/brandchat.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "brandchat",
    about = "Brand Chat: a grounded chat assistant for a personal brand",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/brandchat.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create an empty knowledge base file.
    ///
    /// Works without a config file, using the default store path.
    /// Running it again leaves an existing knowledge base untouched.
    Init,

    /// Chunk text on blank lines and append it under a category.
    ///
    /// Reads `--text`, `--file`, or standard input when neither is given.
    Add {
        /// Category label, e.g. `education` or `brand-voice`.
        #[arg(long)]
        category: String,

        /// Inline text to ingest.
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from this file.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List knowledge items with their positional indices.
    List {
        /// Only show items in this category.
        #[arg(long)]
        category: Option<String>,
    },

    /// Show the total item count and a per-category breakdown.
    Stats,

    /// Remove one item by its index (see `list`).
    Remove {
        index: usize,
    },

    /// Remove every item in a category (exact, case-sensitive match).
    RemoveCategory {
        category: String,
    },

    /// Remove every item.
    Clear {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Show which items would ground an answer to a question.
    Retrieve {
        query: String,

        /// Maximum number of scored items (defaults to `retrieval.top_k`).
        #[arg(long)]
        limit: Option<usize>,

        /// Print the strategy and matched categories.
        #[arg(long)]
        debug: bool,
    },

    /// Answer a question grounded in the knowledge base.
    Ask {
        question: String,

        /// Print retrieval diagnostics to stderr after the reply.
        #[arg(long)]
        debug: bool,
    },

    /// Start the HTTP server.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        let level = match (&cli.command, cli.verbose) {
            (_, true) => "debug",
            (Commands::Serve, false) => "info",
            _ => "warn",
        };
        format!("brand_chat={level},brand_chat_core={level},tower_http={level}")
    });
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    // Init works before any config file exists.
    let cfg = match &cli.command {
        Commands::Init if !cli.config.exists() => Config::minimal(),
        _ => config::load_config(&cli.config)?,
    };

    match cli.command {
        Commands::Init => {
            knowledge::run_init(&cfg).await?;
        }
        Commands::Add {
            category,
            text,
            file,
        } => {
            let source = match (text, file) {
                (Some(text), _) => TextSource::Inline(text),
                (None, Some(path)) => TextSource::File(path),
                (None, None) => TextSource::Stdin,
            };
            ingest::run_add(&cfg, &category, source).await?;
        }
        Commands::List { category } => {
            knowledge::run_list(&cfg, category.as_deref()).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Remove { index } => {
            knowledge::run_remove(&cfg, index).await?;
        }
        Commands::RemoveCategory { category } => {
            knowledge::run_remove_category(&cfg, &category).await?;
        }
        Commands::Clear { yes } => {
            knowledge::run_clear(&cfg, yes).await?;
        }
        Commands::Retrieve {
            query,
            limit,
            debug,
        } => {
            search::run_retrieve(&cfg, &query, limit, debug).await?;
        }
        Commands::Ask { question, debug } => {
            chat::run_ask(&cfg, &question, debug).await?;
        }
        Commands::Serve => {
            tracing::info!(bind = %cfg.server.bind, "starting server");
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
