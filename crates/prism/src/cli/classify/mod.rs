//! The `prism classify` command for labelling precomputed image embeddings.

mod batch;
pub mod types;

pub use types::OutputFormat;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use prism_core::{input, Classifier, ClassifyError, Config};

use batch::{classify_files, BatchOptions};

use super::{load_schema, load_store};

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Embedding file (.json / .jsonl) or directory of them
    #[arg(required = true)]
    pub input: PathBuf,

    /// Category to classify (repeatable; defaults to the configured list, then all)
    #[arg(short, long = "category")]
    pub categories: Vec<String>,

    /// Include every group's score in the output
    #[arg(long)]
    pub explain: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to `output.format` from the config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Number of files classified in parallel
    #[arg(short, long)]
    pub parallel: Option<usize>,
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs, config: &Config) -> anyhow::Result<()> {
    let schema = load_schema(config)?;
    let (store_path, store) = load_store(config)?;

    let classifier = match Classifier::new(schema, Arc::new(store)) {
        Ok(classifier) => classifier,
        Err(e @ ClassifyError::MissingPrompt { .. }) => anyhow::bail!(
            "{e}\n  Store: {}\n  Run `prism store sync` to encode the schema's prompts.",
            store_path.display()
        ),
        Err(e) => return Err(e.into()),
    };

    let categories = resolve_categories(&classifier, &args.categories, config)?;

    let files = input::discover(&args.input);
    if files.is_empty() {
        anyhow::bail!(
            "No embedding files (.json, .jsonl) found at {}",
            args.input.display()
        );
    }
    tracing::info!(
        "Classifying {} file(s) in {} categor{}",
        files.len(),
        categories.len(),
        if categories.len() == 1 { "y" } else { "ies" }
    );

    let options = BatchOptions {
        categories: Arc::new(categories),
        explain: args.explain,
        parallel: args.parallel.unwrap_or(config.classify.parallel_workers),
        format: args
            .format
            .unwrap_or_else(|| OutputFormat::from_config(&config.output.format)),
        pretty: config.output.pretty,
    };

    let out: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    let stats = classify_files(Arc::new(classifier), files, options, out).await?;

    if let Some(path) = &args.output {
        tracing::info!("Output written to {:?}", path);
    }
    if stats.records == 0 && (stats.failed_records > 0 || stats.failed_files > 0) {
        anyhow::bail!("Every input failed to classify");
    }
    Ok(())
}

/// Requested categories, else the configured list, else every category.
/// Unknown names fail before any file is read.
fn resolve_categories(
    classifier: &Classifier,
    requested: &[String],
    config: &Config,
) -> anyhow::Result<Vec<String>> {
    let names: Vec<String> = if !requested.is_empty() {
        requested.to_vec()
    } else if !config.classify.categories.is_empty() {
        config.classify.categories.clone()
    } else {
        classifier.schema().names().map(str::to_string).collect()
    };

    let schema = classifier.schema();
    if let Some(unknown) = names.iter().find(|n| schema.category(n).is_none()) {
        let known: Vec<&str> = schema.names().collect();
        anyhow::bail!(
            "Unknown category {unknown:?}. Available: {}",
            known.join(", ")
        );
    }
    Ok(names)
}
