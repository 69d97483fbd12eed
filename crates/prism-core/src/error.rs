//! Error types for Prism.
//!
//! Errors are organized by concern so every failure names the thing a user has
//! to fix: the store file, the offending prompt text, or the category.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Prism operations.
#[derive(Error, Debug)]
pub enum PrismError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Embedding store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Category schema errors
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Classification errors
    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    /// Encoder boundary errors
    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),

    /// Image embedding input errors
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while loading, mutating, or saving the embedding store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The persisted store is malformed. Nothing is loaded.
    #[error("Corrupt embedding store {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// The encoder produced a zero (or non-finite) vector for a prompt.
    #[error("Encoder returned a degenerate vector for prompt {text:?}")]
    DegenerateVector { text: String },

    /// The encoder produced a vector whose length disagrees with the store.
    #[error("Dimension mismatch for prompt {text:?}: store is {expected}-d, encoder returned {actual}-d")]
    DimensionMismatch {
        text: String,
        expected: usize,
        actual: usize,
    },

    /// The text encoder failed.
    #[error("Text encoding failed: {source}")]
    Encoder {
        #[from]
        source: EncoderError,
    },

    /// Reading or writing the store file failed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Reading the prompt manifest failed.
    #[error("Invalid prompt manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },
}

/// Structural errors in a category schema file.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Failed to read the schema file
    #[error("Failed to read schema {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the schema TOML
    #[error("Failed to parse schema: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize the schema back to TOML
    #[error("Failed to serialize schema: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Two categories share a name
    #[error("Duplicate category name: {0:?}")]
    DuplicateCategory(String),

    /// Two groups in one category share a label
    #[error("Duplicate label {label:?} in category {category:?}")]
    DuplicateLabel { category: String, label: String },

    /// A group references no prompts, so it can never be scored
    #[error("Group {label:?} in category {category:?} has no prompts")]
    EmptyGroup { category: String, label: String },
}

/// Errors raised by the classification call surface.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// A schema prompt is absent from the embedding store.
    #[error("Category {category:?}, group {label:?}: prompt {text:?} is not in the embedding store")]
    MissingPrompt {
        category: String,
        label: String,
        text: String,
    },

    /// The category declares no primary groups.
    #[error("Category {category:?} has no primary groups to compare")]
    EmptyScoreVector { category: String },

    /// No category with this name exists in the schema.
    #[error("Unknown category: {0:?}")]
    UnknownCategory(String),

    /// The image embedding and the store disagree on dimension.
    #[error("Image embedding is {actual}-d but the store holds {expected}-d prompts")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The image embedding is zero or non-finite.
    #[error("Image embedding is degenerate (zero or non-finite)")]
    DegenerateEmbedding,

    /// The image encoder failed.
    #[error("Image encoding failed: {0}")]
    Encoder(#[from] EncoderError),
}

/// Errors at the encoder boundary.
#[derive(Error, Debug)]
pub enum EncoderError {
    /// The encoder command could not be started
    #[error("Failed to start encoder {program:?}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// Talking to the encoder process failed
    #[error("Encoder I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The encoder exited unsuccessfully
    #[error("Encoder exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The encoder wrote something that is not a JSON array of vectors
    #[error("Malformed encoder output: {0}")]
    Protocol(String),

    /// The encoder returned the wrong number of vectors
    #[error("Encoder returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    /// No encoder is configured
    #[error("No encoder configured. Set `encoder.command` in the config file.")]
    NotConfigured,
}

/// Errors reading precomputed image embeddings.
#[derive(Error, Debug)]
pub enum InputError {
    /// Failed to read an input file
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An input file is not in a recognized embedding layout
    #[error("Invalid embedding input {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Convenience type alias for Prism results.
pub type Result<T> = std::result::Result<T, PrismError>;

/// Convenience type alias for store results.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Convenience type alias for classification results.
pub type ClassifyResult<T> = std::result::Result<T, ClassifyError>;
