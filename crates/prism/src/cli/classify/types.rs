//! CLI enum types for the classify command.

use clap::ValueEnum;
use prism_core::OutputFormat as CoreOutputFormat;

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON array of records
    Json,
    /// One JSON record per line
    Jsonl,
    /// Human-readable score tables
    Text,
}

impl OutputFormat {
    /// Parse the config-file spelling (`json` or `jsonl`).
    pub fn from_config(name: &str) -> Self {
        match CoreOutputFormat::parse(name) {
            Some(CoreOutputFormat::JsonLines) => Self::Jsonl,
            _ => Self::Json,
        }
    }

    /// The record writer layout, if this format writes records.
    pub fn records(self) -> Option<CoreOutputFormat> {
        match self {
            Self::Json => Some(CoreOutputFormat::Json),
            Self::Jsonl => Some(CoreOutputFormat::JsonLines),
            Self::Text => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}
