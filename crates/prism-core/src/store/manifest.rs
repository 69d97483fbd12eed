//! Prompt manifests: one file describing a store revision.
//!
//! Prompt wording evolves by trial and error. A manifest lists the prompts a
//! revision introduces and the phrasings it retires:
//!
//! ```toml
//! add = [
//!     "a photo with faint watermark in the corner",
//! ]
//! remove = [
//!     "winter scenery with snow, bare trees, frost, or ice",
//! ]
//! ```
//!
//! Removals are applied before additions, so a prompt listed in both is
//! re-encoded with the current encoder.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::encoder::TextEncoder;
use crate::error::{StoreError, StoreResult};

use super::{EmbeddingStore, RemoveReport, UpsertReport};

/// Prompts to add to and retire from an embedding store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromptManifest {
    /// Prompts to encode if not already stored
    pub add: Vec<String>,
    /// Prompts to delete if present
    pub remove: Vec<String>,
}

/// Outcome of applying a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub removed: RemoveReport,
    pub upserted: UpsertReport,
}

impl SyncReport {
    /// Whether the store content changed.
    pub fn changed(&self) -> bool {
        !self.removed.removed.is_empty() || !self.upserted.added.is_empty()
    }
}

impl PromptManifest {
    /// Load a manifest from a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| StoreError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Prompts listed in both `add` and `remove` (forced re-encodes).
    pub fn refreshed(&self) -> Vec<&str> {
        self.add
            .iter()
            .filter(|t| self.remove.contains(t))
            .map(String::as_str)
            .collect()
    }
}

impl EmbeddingStore {
    /// Apply a manifest: remove retired prompts, then upsert new ones.
    ///
    /// All-or-nothing: if encoding fails, neither the removals nor the
    /// additions are applied.
    pub fn apply_manifest<E>(
        &mut self,
        manifest: &PromptManifest,
        encoder: &E,
    ) -> StoreResult<SyncReport>
    where
        E: TextEncoder + ?Sized,
    {
        let mut next = self.clone();
        let removed = next.remove(&manifest.remove);
        let upserted = next.upsert(&manifest.add, encoder)?;

        tracing::info!(
            "Applied manifest: {} removed, {} added, {} already present",
            removed.removed.len(),
            upserted.added.len(),
            upserted.skipped.len()
        );
        if !removed.absent.is_empty() {
            tracing::debug!("{} retired prompt(s) were not stored", removed.absent.len());
        }

        *self = next;
        Ok(SyncReport { removed, upserted })
    }
}
