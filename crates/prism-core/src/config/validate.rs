//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.store.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.path must not be empty".into(),
            ));
        }
        if self.store.dimension == Some(0) {
            return Err(ConfigError::ValidationError(
                "store.dimension must be > 0".into(),
            ));
        }
        if self.encoder.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "encoder.batch_size must be > 0".into(),
            ));
        }
        if self.classify.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "classify.parallel_workers must be > 0".into(),
            ));
        }
        if !matches!(self.output.format.as_str(), "json" | "jsonl") {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be \"json\" or \"jsonl\", got {:?}",
                self.output.format
            )));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}
