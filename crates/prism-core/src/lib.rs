//! Prism Core - zero-shot visual attribute classification.
//!
//! Prism decides which of several mutually exclusive labels an image belongs
//! to (a season, blurry or sharp, watermarked or clean) by comparing its
//! embedding against text prompt embeddings from the same CLIP-style space.
//!
//! # Architecture
//!
//! ```text
//! prompts → TextEncoder → EmbeddingStore (JSON, incremental upsert/remove)
//!                                  │
//! image embedding → Classifier(CategorySchema) → scores → decide → label
//! ```
//!
//! No network runs in-process: text and image encoders sit behind the
//! [`TextEncoder`] and [`ImageEncoder`] traits.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use prism_core::{CategorySchema, Classifier, Config, EmbeddingStore};
//!
//! fn main() -> prism_core::Result<()> {
//!     let config = Config::load()?;
//!     let store = EmbeddingStore::load(&config.store_path(), config.store.dimension)?;
//!     let classifier = Classifier::new(CategorySchema::builtin(), Arc::new(store))?;
//!
//!     let image = vec![0.0_f32; 512];
//!     let result = classifier.classify(&image, "clothing-season")?;
//!     println!("{} ({:.3})", result.label, result.score);
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod encoder;
pub mod error;
pub mod input;
pub mod math;
pub mod output;
pub mod schema;
pub mod store;
pub mod types;

pub use classify::{decide, score_category, score_group, Classifier};
pub use config::Config;
pub use encoder::{CommandEncoder, ImageEncoder, ImageNormalization, TextEncoder};
pub use error::{
    ClassifyError, ClassifyResult, ConfigError, EncoderError, InputError, PrismError, Result,
    SchemaError, StoreError, StoreResult,
};
pub use input::EmbeddingRecord;
pub use math::UnitVector;
pub use output::{OutputFormat, RecordWriter};
pub use schema::{Category, CategorySchema, Group};
pub use store::{EmbeddingStore, PromptManifest, RemoveReport, SyncReport, UpsertReport};
pub use types::{ClassificationRecord, ClassificationResult, GroupScore, ScoreVector};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
