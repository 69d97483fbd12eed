//! The `prism schema` command for inspecting category schemas.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use prism_core::{CategorySchema, Config};

use super::theme;
use super::{load_schema, load_store};

/// Arguments for the `schema` command.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(subcommand)]
    pub command: SchemaCommand,
}

/// Subcommands for schema management.
#[derive(Subcommand, Debug)]
pub enum SchemaCommand {
    /// Print the active schema as TOML
    Show,

    /// Write the built-in categories to a schema file for editing
    Init {
        /// Destination (defaults to `schema.toml` in the data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check the schema against the embedding store
    Check,
}

/// Execute the schema command.
pub async fn execute(args: SchemaArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        SchemaCommand::Show => {
            let schema = load_schema(config)?;
            print!("{}", schema.to_toml()?);
        }

        SchemaCommand::Init { output, force } => {
            let path = output
                .or_else(|| config.schema_path())
                .unwrap_or_else(|| config.data_dir().join("schema.toml"));

            if path.exists() && !force {
                anyhow::bail!(
                    "Schema file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, CategorySchema::builtin().to_toml()?)?;

            tracing::info!("Schema written to {}", path.display());
            println!("Schema initialized at: {}", path.display());
            if config.schema_path().as_deref() != Some(path.as_path()) {
                println!("Set `schema.path` in your config file to use it.");
            }
        }

        SchemaCommand::Check => check(config)?,
    }

    Ok(())
}

fn check(config: &Config) -> anyhow::Result<()> {
    let schema = load_schema(config)?;
    let (path, store) = load_store(config)?;

    for category in schema.categories() {
        println!(
            "{}",
            theme::field(
                &category.name,
                format!(
                    "{} primary, {} override",
                    category.primary.len(),
                    category.overrides.len()
                )
            )
        );
        if category.primary.is_empty() {
            println!(
                "{}",
                theme::warn("no primary groups; classification will always fail")
            );
        }
    }

    let missing = schema.missing_prompts(&store);
    if missing.is_empty() {
        println!("{}", theme::ok("All prompts present in the store"));
        return Ok(());
    }

    for m in &missing {
        eprintln!("  missing  {} / {}: {:?}", m.category, m.label, m.text);
    }
    anyhow::bail!(
        "{} prompt(s) missing from {}.\nRun `prism store sync` to encode them.",
        missing.len(),
        path.display()
    )
}
