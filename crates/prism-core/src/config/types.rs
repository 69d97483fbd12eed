//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the embedding store and schema files
    pub data_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("~/.prism"),
        }
    }
}

/// Embedding store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store file path. Relative paths resolve against `general.data_dir`.
    pub path: String,

    /// Expected embedding dimension. When unset, the first stored vector
    /// defines it (512 for CLIP ViT-B/32).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "text-embeddings.json".to_string(),
            dimension: None,
        }
    }
}

/// Category schema settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Schema TOML path. When unset, the built-in schema is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// External text encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Program and arguments, e.g. `["python3", "scripts/encode_text.py"]`.
    /// Empty means no encoder; store updates that need encoding will fail.
    pub command: Vec<String>,

    /// Prompts sent per encoder invocation
    pub batch_size: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            command: vec![],
            batch_size: 32,
        }
    }
}

/// Classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Files classified concurrently in batch mode
    pub parallel_workers: usize,

    /// Categories to run when none are given on the command line.
    /// Empty means every category in the schema.
    pub categories: Vec<String>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            categories: vec![],
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
