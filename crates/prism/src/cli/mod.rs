//! CLI command implementations.

pub mod classify;
pub mod config;
pub mod schema;
pub mod store;
pub mod theme;

use std::path::PathBuf;

use anyhow::Context;
use prism_core::{CategorySchema, Config, EmbeddingStore};

/// The active schema: the configured schema file, or the built-in categories.
pub fn load_schema(config: &Config) -> anyhow::Result<CategorySchema> {
    match config.schema_path() {
        Some(path) => CategorySchema::load(&path)
            .with_context(|| format!("Failed to load schema from {}", path.display())),
        None => {
            tracing::debug!("No schema file configured, using built-in categories");
            Ok(CategorySchema::builtin())
        }
    }
}

/// Load the configured embedding store (empty if the file does not exist yet).
pub fn load_store(config: &Config) -> anyhow::Result<(PathBuf, EmbeddingStore)> {
    let path = config.store_path();
    let store = EmbeddingStore::load(&path, config.store.dimension)?;
    Ok((path, store))
}
