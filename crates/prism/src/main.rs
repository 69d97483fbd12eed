//! Prism CLI - zero-shot visual attribute classification.
//!
//! Prism labels precomputed image embeddings (season, blur, watermark, scene
//! type) by comparing them with CLIP text prompt embeddings kept in a local
//! embedding store.
//!
//! # Usage
//!
//! ```bash
//! # Encode every prompt the schema references
//! prism store sync
//!
//! # Apply a prompt revision
//! prism store sync --manifest prompts-v8.toml --prune
//!
//! # Classify a directory of embedding files
//! prism classify ./embeddings/ -c clothing-season --output labels.jsonl -f jsonl
//!
//! # Inspect the active schema
//! prism schema show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Prism - zero-shot visual attribute classification over CLIP embeddings.
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify image embeddings
    Classify(cli::classify::ClassifyArgs),

    /// Manage the prompt embedding store
    Store(cli::store::StoreArgs),

    /// Inspect and check category schemas
    Schema(cli::schema::SchemaArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match prism_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `prism config path`."
            );
            prism_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Prism v{}", prism_core::VERSION);

    match cli.command {
        Commands::Classify(args) => cli::classify::execute(args, &config).await,
        Commands::Store(args) => cli::store::execute(args, &config).await,
        Commands::Schema(args) => cli::schema::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config).await,
    }
}
