//! Persistent prompt → embedding store.
//!
//! The store maps each prompt string (exact match: case, whitespace, and
//! punctuation are all significant) to a unit-normalized embedding. It is
//! updated incrementally: [`EmbeddingStore::upsert`] encodes only prompts that
//! are not stored yet, and [`EmbeddingStore::remove`] retires prompts. An
//! existing entry is never re-encoded, even if the encoder model changed;
//! to refresh a prompt, remove it and upsert it again.
//!
//! # File format
//!
//! A flat JSON object of `prompt → [f32; D]`, keys sorted, one entry per line:
//!
//! ```text
//! {
//!   "a blurry, out of focus, or motion blurred photo": [0.0132, -0.0411, ...],
//!   "a sharp, clear, and in-focus photo": [0.0087, -0.0302, ...]
//! }
//! ```

pub mod manifest;

pub use manifest::{PromptManifest, SyncReport};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::encoder::TextEncoder;
use crate::error::{EncoderError, StoreError, StoreResult};
use crate::math::UnitVector;
use crate::schema::CategorySchema;

/// Prompts added and skipped by an [`EmbeddingStore::upsert`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Newly encoded prompts, in input order
    pub added: Vec<String>,
    /// Prompts already present (not re-encoded)
    pub skipped: Vec<String>,
}

/// Prompts removed by an [`EmbeddingStore::remove`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveReport {
    /// Prompts that were present and are now gone
    pub removed: Vec<String>,
    /// Prompts that were not in the store
    pub absent: Vec<String>,
}

/// Prompt text → unit embedding, with a fixed dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingStore {
    entries: BTreeMap<String, UnitVector>,
    dimension: Option<usize>,
}

impl EmbeddingStore {
    /// Create an empty store whose dimension is set by the first insert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that only accepts `dimension`-length vectors.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            dimension: Some(dimension),
        }
    }

    /// Build a store from raw vectors, normalizing each one.
    pub fn from_vectors<I, S>(entries: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut store = Self::new();
        for (text, raw) in entries {
            let text = text.into();
            let vector = store.stage(&text, raw)?;
            store.dimension.get_or_insert(vector.dim());
            store.entries.insert(text, vector);
        }
        Ok(store)
    }

    /// Load a store from disk.
    ///
    /// A missing file is an empty store. `dimension` declares the expected
    /// vector length; when `None` the first entry (in key order) defines it.
    pub fn load(path: &Path, dimension: Option<usize>) -> StoreResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No embedding store at {:?}, starting empty", path);
                return Ok(Self {
                    entries: BTreeMap::new(),
                    dimension,
                });
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let store = Self::parse(&content, dimension).map_err(|message| StoreError::Corrupt {
            path: path.to_path_buf(),
            message,
        })?;

        tracing::info!(
            "Loaded embedding store: {} prompts x {} dims from {:?}",
            store.len(),
            store.dimension.unwrap_or(0),
            path
        );
        Ok(store)
    }

    /// Parse a store from its JSON representation.
    pub fn from_json_str(json: &str, dimension: Option<usize>) -> StoreResult<Self> {
        Self::parse(json, dimension).map_err(|message| StoreError::Corrupt {
            path: PathBuf::from("<memory>"),
            message,
        })
    }

    fn parse(json: &str, dimension: Option<usize>) -> Result<Self, String> {
        let RawEntries(raw) =
            serde_json::from_str(json).map_err(|e| format!("invalid store JSON: {e}"))?;

        let mut expected = dimension;
        let mut entries = BTreeMap::new();
        for (text, vector) in raw {
            let dim = *expected.get_or_insert(vector.len());
            if vector.len() != dim {
                return Err(format!(
                    "prompt {text:?} has {} values, expected {dim}",
                    vector.len()
                ));
            }
            let unit = UnitVector::from_normalized(vector)
                .ok_or_else(|| format!("prompt {text:?} is not a finite unit vector"))?;
            entries.insert(text, unit);
        }

        Ok(Self {
            entries,
            dimension: expected,
        })
    }

    /// Encode and insert every prompt not already stored.
    ///
    /// Present prompts are skipped without calling the encoder. Duplicate
    /// prompts in `texts` are encoded once. On any error the store is left
    /// unchanged.
    pub fn upsert<S, E>(&mut self, texts: &[S], encoder: &E) -> StoreResult<UpsertReport>
    where
        S: AsRef<str>,
        E: TextEncoder + ?Sized,
    {
        let mut report = UpsertReport::default();
        let mut seen = BTreeSet::new();
        let mut pending = Vec::new();

        for text in texts {
            let text = text.as_ref();
            if !seen.insert(text) {
                continue;
            }
            if self.entries.contains_key(text) {
                tracing::debug!("Skipping (already stored): {}", text);
                report.skipped.push(text.to_string());
            } else {
                pending.push(text.to_string());
            }
        }

        if pending.is_empty() {
            return Ok(report);
        }

        tracing::info!("Encoding {} new prompt(s)...", pending.len());
        let vectors = encoder.encode_batch(&pending)?;
        if vectors.len() != pending.len() {
            return Err(EncoderError::CountMismatch {
                expected: pending.len(),
                actual: vectors.len(),
            }
            .into());
        }

        // Stage everything before touching the map so a failure mid-batch
        // leaves the store as it was.
        let mut dimension = self.dimension;
        let mut staged = Vec::with_capacity(pending.len());
        for (text, raw) in pending.into_iter().zip(vectors) {
            let vector = Self::normalize_for(&text, raw, dimension)?;
            dimension.get_or_insert(vector.dim());
            staged.push((text, vector));
        }

        self.dimension = dimension;
        for (text, vector) in staged {
            tracing::debug!("Added: {}", text);
            report.added.push(text.clone());
            self.entries.insert(text, vector);
        }

        Ok(report)
    }

    /// Remove prompts. Absent prompts are a no-op.
    pub fn remove<S: AsRef<str>>(&mut self, texts: &[S]) -> RemoveReport {
        let mut report = RemoveReport::default();
        for text in texts {
            let text = text.as_ref();
            if self.entries.remove(text).is_some() {
                tracing::debug!("Removed: {}", text);
                report.removed.push(text.to_string());
            } else if !report.absent.iter().any(|t| t == text)
                && !report.removed.iter().any(|t| t == text)
            {
                report.absent.push(text.to_string());
            }
        }
        report
    }

    /// Serialize deterministically: sorted keys, one entry per line.
    pub fn to_json_string(&self) -> String {
        if self.entries.is_empty() {
            return "{}\n".to_string();
        }

        let mut out = String::from("{\n");
        let last = self.entries.len() - 1;
        for (i, (text, vector)) in self.entries.iter().enumerate() {
            // Serializing a String or a slice of f32 cannot fail.
            let key = serde_json::to_string(text).unwrap_or_default();
            let values = serde_json::to_string(vector.as_slice()).unwrap_or_default();
            out.push_str("  ");
            out.push_str(&key);
            out.push_str(": ");
            out.push_str(&values);
            if i != last {
                out.push(',');
            }
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }

    /// Atomically write the store to `path`.
    ///
    /// The content goes to a temporary file in the destination directory,
    /// which is synced and then renamed over `path`.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir).map_err(io_err)?;

        let json = self.to_json_string();
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        tracing::info!(
            "Saved embedding store to {:?} ({} prompts, {:.1} KB)",
            path,
            self.len(),
            json.len() as f64 / 1024.0
        );
        Ok(())
    }

    /// Normalize a raw vector destined for this store.
    fn stage(&self, text: &str, raw: Vec<f32>) -> StoreResult<UnitVector> {
        Self::normalize_for(text, raw, self.dimension)
    }

    fn normalize_for(
        text: &str,
        raw: Vec<f32>,
        dimension: Option<usize>,
    ) -> StoreResult<UnitVector> {
        if let Some(expected) = dimension {
            if raw.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    text: text.to_string(),
                    expected,
                    actual: raw.len(),
                });
            }
        }
        UnitVector::normalize(raw).ok_or_else(|| StoreError::DegenerateVector {
            text: text.to_string(),
        })
    }

    /// Look up the embedding for a prompt.
    pub fn get(&self, text: &str) -> Option<&UnitVector> {
        self.entries.get(text)
    }

    /// Whether a prompt is stored.
    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    /// Number of stored prompts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimension, if declared or known from stored entries.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Stored prompts in sorted order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Stored entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnitVector)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Stored prompts that no category in `schema` references.
    pub fn unreferenced(&self, schema: &CategorySchema) -> Vec<String> {
        let referenced = schema.referenced_prompts();
        self.texts()
            .filter(|t| !referenced.contains(t))
            .map(str::to_string)
            .collect()
    }

    /// BLAKE3 digest over all entries in key order.
    ///
    /// Two stores with the same fingerprint hold identical prompts and vectors.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (text, vector) in &self.entries {
            hasher.update(text.as_bytes());
            hasher.update(b"\0");
            for x in vector.as_slice() {
                hasher.update(&x.to_le_bytes());
            }
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Store file content before validation. Repeated prompt keys are rejected.
struct RawEntries(BTreeMap<String, Vec<f32>>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of prompt -> float array")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawEntries, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some((text, vector)) = map.next_entry::<String, Vec<f32>>()? {
                    if entries.contains_key(&text) {
                        return Err(de::Error::custom(format!("duplicate prompt {text:?}")));
                    }
                    entries.insert(text, vector);
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::testing::TableEncoder;
    use crate::math::l2_norm;

    fn encoder() -> TableEncoder {
        TableEncoder::new(&[
            ("summer", vec![1.0, 0.0, 0.0]),
            ("winter", vec![0.0, 2.0, 0.0]),
            ("no person", vec![0.0, 0.0, 5.0]),
            ("autumn", vec![3.0, 4.0, 0.0]),
            ("blank", vec![0.0, 0.0, 0.0]),
            ("short", vec![1.0, 1.0]),
        ])
    }

    #[test]
    fn test_upsert_normalizes_vectors() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        store.upsert(&["summer", "winter", "autumn"], &enc).unwrap();

        for (_, v) in store.iter() {
            assert!((l2_norm(v.as_slice()) - 1.0).abs() < 1e-4);
        }
        assert_eq!(store.get("autumn").unwrap().as_slice(), &[0.6, 0.8, 0.0]);
        assert_eq!(store.dimension(), Some(3));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let enc = encoder();
        let mut once = EmbeddingStore::new();
        once.upsert(&["summer", "winter"], &enc).unwrap();

        let mut twice = once.clone();
        let report = twice.upsert(&["summer", "winter"], &enc).unwrap();

        assert_eq!(once, twice);
        assert!(report.added.is_empty());
        assert_eq!(report.skipped, vec!["summer", "winter"]);
    }

    #[test]
    fn test_upsert_never_reencodes_existing_key() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        store.upsert(&["summer"], &enc).unwrap();
        assert_eq!(enc.call_count(), 1);

        store.upsert(&["summer", "winter"], &enc).unwrap();
        assert_eq!(enc.calls(), vec!["summer", "winter"]);
    }

    #[test]
    fn test_remove_then_upsert_reencodes() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        store.upsert(&["summer"], &enc).unwrap();

        store.remove(&["summer"]);
        let report = store.upsert(&["summer"], &enc).unwrap();

        assert_eq!(report.added, vec!["summer"]);
        assert_eq!(enc.calls(), vec!["summer", "summer"]);
    }

    #[test]
    fn test_upsert_dedupes_input() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        let report = store.upsert(&["summer", "summer"], &enc).unwrap();
        assert_eq!(report.added, vec!["summer"]);
        assert_eq!(enc.call_count(), 1);
    }

    #[test]
    fn test_upsert_degenerate_vector_leaves_store_untouched() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        store.upsert(&["summer"], &enc).unwrap();
        let before = store.clone();

        let err = store.upsert(&["winter", "blank"], &enc).unwrap_err();
        match err {
            StoreError::DegenerateVector { text } => assert_eq!(text, "blank"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store, before);
        assert!(!store.contains("winter"));
    }

    #[test]
    fn test_upsert_dimension_mismatch() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        store.upsert(&["summer"], &enc).unwrap();

        let err = store.upsert(&["short"], &enc).unwrap_err();
        assert!(matches!(
            err,
            StoreError::DimensionMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_upsert_dimension_mismatch_within_batch() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        let err = store.upsert(&["summer", "short"], &enc).unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { .. }));
        assert!(store.is_empty());
        assert_eq!(store.dimension(), None);
    }

    #[test]
    fn test_upsert_encoder_failure() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        let err = store.upsert(&["unknown prompt"], &enc).unwrap_err();
        assert!(matches!(err, StoreError::Encoder { .. }));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        store.upsert(&["summer"], &enc).unwrap();

        let report = store.remove(&["winter", "summer", "winter"]);
        assert_eq!(report.removed, vec!["summer"]);
        assert_eq!(report.absent, vec!["winter"]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_are_exact() {
        let enc = TableEncoder::new(&[
            ("a photo of snow", vec![1.0, 0.0]),
            ("a photo of snow.", vec![0.0, 1.0]),
            ("A photo of snow", vec![1.0, 1.0]),
        ]);
        let mut store = EmbeddingStore::new();
        store
            .upsert(&["a photo of snow", "a photo of snow.", "A photo of snow"], &enc)
            .unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_save_load_round_trip() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        store.upsert(&["summer", "winter", "no person", "autumn"], &enc).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text-embeddings.json");
        store.save(&path).unwrap();

        let loaded = EmbeddingStore::load(&path, None).unwrap();
        assert_eq!(loaded.len(), store.len());
        for (text, vector) in store.iter() {
            let other = loaded.get(text).unwrap();
            for (a, b) in vector.as_slice().iter().zip(other.as_slice()) {
                assert!((a - b).abs() < 1e-6);
            }
        }
        assert_eq!(loaded.fingerprint(), store.fingerprint());
    }

    #[test]
    fn test_save_is_deterministic_and_repeatable() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        store.upsert(&["winter", "summer"], &enc).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        store.save(&path).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        store.save(&path).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first,
            "{\n  \"summer\": [1.0,0.0,0.0],\n  \"winter\": [0.0,1.0,0.0]\n}\n"
        );
        // Only the store file remains; the temp file was renamed into place.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        EmbeddingStore::new().save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddingStore::load(&dir.path().join("absent.json"), Some(512)).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.dimension(), Some(512));
    }

    #[test]
    fn test_load_rejects_inconsistent_lengths() {
        let err =
            EmbeddingStore::from_json_str(r#"{"a": [1.0, 0.0], "b": [0.0, 0.0, 1.0]}"#, None)
                .unwrap_err();
        match err {
            StoreError::Corrupt { message, .. } => assert!(message.contains("\"b\"")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_rejects_declared_dimension_mismatch() {
        let err = EmbeddingStore::from_json_str(r#"{"a": [1.0, 0.0]}"#, Some(3)).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        assert!(matches!(
            EmbeddingStore::from_json_str("{\"a\": [1.0,", None),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(
            EmbeddingStore::from_json_str("[[1.0, 0.0]]", None),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(
            EmbeddingStore::from_json_str(r#"{"a": "not a vector"}"#, None),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_load_rejects_duplicate_prompts() {
        let err = EmbeddingStore::from_json_str(r#"{"a": [1.0, 0.0], "a": [0.0, 1.0]}"#, None)
            .unwrap_err();
        match err {
            StoreError::Corrupt { message, .. } => assert!(message.contains("duplicate prompt")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_load_unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the store file cannot be read as text.
        let path = dir.path().join("store.json");
        std::fs::create_dir(&path).unwrap();

        let err = EmbeddingStore::load(&path, None).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_load_rejects_non_unit_vectors() {
        let err = EmbeddingStore::from_json_str(r#"{"a": [3.0, 4.0]}"#, None).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_load_corrupt_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();

        let err = EmbeddingStore::load(&path, None).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_from_vectors_normalizes() {
        let store = EmbeddingStore::from_vectors([("a", vec![0.0, 3.0])]).unwrap();
        assert_eq!(store.get("a").unwrap().as_slice(), &[0.0, 1.0]);
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let enc = encoder();
        let mut store = EmbeddingStore::new();
        store.upsert(&["summer"], &enc).unwrap();
        let before = store.fingerprint();
        store.upsert(&["winter"], &enc).unwrap();
        assert_ne!(before, store.fingerprint());
        store.remove(&["winter"]);
        assert_eq!(before, store.fingerprint());
    }
}
