//! The `prism store` command for managing prompt embeddings.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use dialoguer::Confirm;
use prism_core::{
    CommandEncoder, Config, EmbeddingStore, EncoderError, PromptManifest, TextEncoder,
    UpsertReport,
};

use super::theme;
use super::{load_schema, load_store};

/// Arguments for the `store` command.
#[derive(Args, Debug)]
pub struct StoreArgs {
    #[command(subcommand)]
    pub command: StoreCommand,
}

/// Subcommands for embedding store management.
#[derive(Subcommand, Debug)]
pub enum StoreCommand {
    /// Summarize the store and its coverage of the schema
    Status,

    /// List stored prompts
    List {
        /// Only prompts no category references
        #[arg(long)]
        unreferenced: bool,
    },

    /// Encode every prompt the schema references that is not stored yet
    Sync {
        /// Apply a prompt manifest (removals, then additions) first
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Also remove prompts no category references
        #[arg(long)]
        prune: bool,
    },

    /// Encode and store prompts
    Add {
        /// Prompt texts, used verbatim as keys
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Remove prompts from the store
    Remove {
        /// Prompt texts, matched exactly
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Remove prompts no category references
    Prune {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Execute the store command.
pub async fn execute(args: StoreArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        StoreCommand::Status => status(config),
        StoreCommand::List { unreferenced } => list(config, unreferenced),
        StoreCommand::Sync { manifest, prune } => sync(config, manifest.as_deref(), prune),
        StoreCommand::Add { texts } => add(config, &texts),
        StoreCommand::Remove { texts } => remove(config, &texts),
        StoreCommand::Prune { yes } => prune(config, yes),
    }
}

fn encoder(config: &Config) -> anyhow::Result<CommandEncoder> {
    CommandEncoder::from_config(&config.encoder).with_context(|| {
        format!(
            "A text encoder is required to embed prompts.\n  \
             Configure `encoder.command` in {}",
            Config::default_path().display()
        )
    })
}

/// Stands in for the encoder when a sync has nothing to encode.
struct Unneeded;

impl TextEncoder for Unneeded {
    fn encode_text(&self, _text: &str) -> Result<Vec<f32>, EncoderError> {
        Err(EncoderError::NotConfigured)
    }
}

/// Prompts a sync would encode: manifest additions and schema prompts that
/// are not stored once the manifest's removals apply.
fn pending_prompts<'a>(
    store: &EmbeddingStore,
    manifest: Option<&'a PromptManifest>,
    referenced: &[&'a str],
) -> BTreeSet<&'a str> {
    let retired: BTreeSet<&str> = manifest
        .map(|m| m.remove.iter().map(String::as_str).collect())
        .unwrap_or_default();
    manifest
        .into_iter()
        .flat_map(|m| m.add.iter().map(String::as_str))
        .chain(referenced.iter().copied())
        .filter(|text| retired.contains(text) || !store.contains(text))
        .collect()
}

fn status(config: &Config) -> anyhow::Result<()> {
    let (path, store) = load_store(config)?;
    let schema = load_schema(config)?;
    let missing = schema.missing_prompts(&store);
    let unreferenced = store.unreferenced(&schema);

    println!("{}", theme::field("store", path.display()));
    println!("{}", theme::field("prompts", store.len()));
    println!(
        "{}",
        theme::field(
            "dimension",
            store
                .dimension()
                .map_or_else(|| "-".to_string(), |d| d.to_string())
        )
    );
    if !store.is_empty() {
        println!("{}", theme::field("fingerprint", &store.fingerprint()[..16]));
    }
    println!("{}", theme::field("categories", schema.categories().len()));
    println!();

    if missing.is_empty() {
        println!("{}", theme::ok("Every schema prompt is stored"));
    } else {
        println!(
            "{}",
            theme::warn(&format!(
                "{} schema prompt(s) missing; run `prism store sync`",
                missing.len()
            ))
        );
        for m in &missing {
            println!("    {} / {}: {:?}", m.category, m.label, m.text);
        }
    }
    if !unreferenced.is_empty() {
        println!(
            "{}",
            theme::warn(&format!(
                "{} stored prompt(s) unreferenced; `prism store prune` removes them",
                unreferenced.len()
            ))
        );
    }
    Ok(())
}

fn list(config: &Config, unreferenced: bool) -> anyhow::Result<()> {
    let (_, store) = load_store(config)?;
    if unreferenced {
        let schema = load_schema(config)?;
        for text in store.unreferenced(&schema) {
            println!("{text}");
        }
    } else {
        for text in store.texts() {
            println!("{text}");
        }
    }
    Ok(())
}

fn sync(config: &Config, manifest_path: Option<&Path>, prune: bool) -> anyhow::Result<()> {
    let (path, mut store) = load_store(config)?;
    let schema = load_schema(config)?;
    let manifest = manifest_path.map(PromptManifest::load).transpose()?;
    let referenced: Vec<&str> = schema.referenced_prompts().into_iter().collect();
    let mut changed = false;

    let command;
    let encoder: &dyn TextEncoder =
        if pending_prompts(&store, manifest.as_ref(), &referenced).is_empty() {
            &Unneeded
        } else {
            command = encoder(config)?;
            &command
        };

    if let (Some(manifest_path), Some(manifest)) = (manifest_path, &manifest) {
        let report = store.apply_manifest(manifest, encoder)?;
        eprintln!(
            "Manifest {}: {} removed, {} added",
            manifest_path.display(),
            report.removed.removed.len(),
            report.upserted.added.len()
        );
        changed |= report.changed();
    }

    let report = store.upsert(&referenced, encoder)?;
    print_upsert(&report);
    changed |= !report.added.is_empty();

    if prune {
        let stale = store.unreferenced(&schema);
        let removed = store.remove(&stale);
        eprintln!("Pruned {} unreferenced prompt(s)", removed.removed.len());
        changed |= !removed.removed.is_empty();
    }

    if changed {
        store.save(&path)?;
        println!("{}", theme::ok(&format!("Saved {} prompts to {}", store.len(), path.display())));
    } else {
        println!("{}", theme::ok("Store already up to date"));
    }
    Ok(())
}

fn add(config: &Config, texts: &[String]) -> anyhow::Result<()> {
    let (path, mut store) = load_store(config)?;
    let report = store.upsert(texts, &encoder(config)?)?;
    print_upsert(&report);
    if !report.added.is_empty() {
        store.save(&path)?;
    }
    Ok(())
}

fn remove(config: &Config, texts: &[String]) -> anyhow::Result<()> {
    let (path, mut store) = load_store(config)?;
    let report = store.remove(texts);
    for text in &report.absent {
        eprintln!("{}", theme::warn(&format!("Not stored: {text:?}")));
    }
    if !report.removed.is_empty() {
        store.save(&path)?;
    }
    println!("Removed {} prompt(s)", report.removed.len());
    Ok(())
}

fn prune(config: &Config, yes: bool) -> anyhow::Result<()> {
    let (path, mut store) = load_store(config)?;
    let schema = load_schema(config)?;
    let stale = store.unreferenced(&schema);

    if stale.is_empty() {
        println!("{}", theme::ok("No unreferenced prompts"));
        return Ok(());
    }

    for text in &stale {
        eprintln!("  - {text}");
    }
    if !yes && !confirm_prune(stale.len())? {
        println!("Aborted");
        return Ok(());
    }

    let report = store.remove(&stale);
    store.save(&path)?;
    println!(
        "{}",
        theme::ok(&format!("Pruned {} prompt(s)", report.removed.len()))
    );
    Ok(())
}

fn confirm_prune(count: usize) -> anyhow::Result<bool> {
    let confirmed = Confirm::with_theme(&theme::prism_theme())
        .with_prompt(format!("Remove {count} unreferenced prompt(s)?"))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn print_upsert(report: &UpsertReport) {
    for text in &report.added {
        tracing::debug!("Encoded {:?}", text);
    }
    eprintln!(
        "Encoded {} new prompt(s), {} already stored",
        report.added.len(),
        report.skipped.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::{CategorySchema, EmbeddingStore};

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.general.data_dir = dir.to_path_buf();
        config
    }

    fn seed_store(config: &Config, extra: &[&str]) {
        let schema = CategorySchema::builtin();
        let texts = schema
            .referenced_prompts()
            .into_iter()
            .chain(extra.iter().copied())
            .enumerate()
            .map(|(i, t)| (t.to_string(), vec![1.0, i as f32]))
            .collect::<Vec<_>>();
        EmbeddingStore::from_vectors(texts)
            .unwrap()
            .save(&config.store_path())
            .unwrap();
    }

    #[test]
    fn test_prune_removes_only_unreferenced() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_store(&config, &["winter scenery with snow, bare trees, frost, or ice"]);

        prune(&config, true).unwrap();

        let (_, store) = load_store(&config).unwrap();
        let schema = CategorySchema::builtin();
        assert!(store.unreferenced(&schema).is_empty());
        assert!(schema.missing_prompts(&store).is_empty());
    }

    #[test]
    fn test_remove_saves_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_store(&config, &["retired"]);

        remove(&config, &["retired".to_string(), "never stored".to_string()]).unwrap();

        let (_, store) = load_store(&config).unwrap();
        assert!(!store.contains("retired"));
    }

    #[test]
    fn test_sync_prune_needs_no_encoder_when_schema_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_store(&config, &["stale prompt"]);

        sync(&config, None, true).unwrap();

        let (_, store) = load_store(&config).unwrap();
        assert!(!store.contains("stale prompt"));
        assert!(CategorySchema::builtin().missing_prompts(&store).is_empty());
    }

    #[test]
    fn test_sync_removal_only_manifest_needs_no_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed_store(&config, &["old winter"]);
        let manifest = dir.path().join("revision.toml");
        std::fs::write(&manifest, "remove = [\"old winter\"]\n").unwrap();

        sync(&config, Some(&manifest), false).unwrap();

        let (_, store) = load_store(&config).unwrap();
        assert!(!store.contains("old winter"));
    }

    #[test]
    fn test_sync_with_pending_prompts_requires_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let manifest = dir.path().join("refresh.toml");
        seed_store(&config, &[]);
        let prompt = CategorySchema::builtin()
            .referenced_prompts()
            .into_iter()
            .next()
            .unwrap()
            .to_string();
        // Listed in both lists: forces a re-encode.
        std::fs::write(
            &manifest,
            format!("add = [{prompt:?}]\nremove = [{prompt:?}]\n"),
        )
        .unwrap();

        let err = sync(&config, Some(&manifest), false).unwrap_err();
        assert!(err.to_string().contains("encoder.command"));
    }

    #[test]
    fn test_add_without_encoder_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let err = add(&config, &["a sharp photo".to_string()]).unwrap_err();
        assert!(err.to_string().contains("encoder.command"));
    }
}
