//! Configuration management for Prism.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a missing file or a
//! partial file both work.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Prism.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Embedding store settings
    pub store: StoreConfig,

    /// Category schema settings
    pub schema: SchemaConfig,

    /// External text encoder settings
    pub encoder: EncoderConfig,

    /// Classification settings
    pub classify: ClassifyConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.prism.prism/config.toml
    /// - Linux: ~/.config/prism/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\prism\config\config.toml
    ///
    /// Falls back to ~/.prism/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "prism", "prism")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".prism").join("config.toml")
            })
    }

    /// Get the resolved data directory (with ~ expansion).
    pub fn data_dir(&self) -> PathBuf {
        let path_str = self.general.data_dir.to_string_lossy();
        PathBuf::from(shellexpand::tilde(&path_str).into_owned())
    }

    /// Get the resolved embedding store path.
    pub fn store_path(&self) -> PathBuf {
        self.resolve(&self.store.path)
    }

    /// Get the resolved schema path, if a custom schema is configured.
    pub fn schema_path(&self) -> Option<PathBuf> {
        self.schema.path.as_deref().map(|p| self.resolve(p))
    }

    /// Expand `~` and anchor relative paths at the data directory.
    fn resolve(&self, path: &str) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(path).into_owned());
        if expanded.is_absolute() {
            expanded
        } else {
            self.data_dir().join(expanded)
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.classify.parallel_workers, 4);
        assert_eq!(config.encoder.batch_size, 32);
        assert!(config.encoder.command.is_empty());
        assert!(config.schema.path.is_none());
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[store]"));
        assert!(toml.contains("[encoder]"));
    }

    #[test]
    fn test_store_path_relative_to_data_dir() {
        let mut config = Config::default();
        config.general.data_dir = PathBuf::from("/srv/prism");
        assert_eq!(
            config.store_path(),
            PathBuf::from("/srv/prism/text-embeddings.json")
        );

        config.store.path = "/tmp/other.json".to_string();
        assert_eq!(config.store_path(), PathBuf::from("/tmp/other.json"));
    }

    #[test]
    fn test_schema_path_defaults_to_builtin() {
        let mut config = Config::default();
        assert!(config.schema_path().is_none());

        config.general.data_dir = PathBuf::from("/srv/prism");
        config.schema.path = Some("schema.toml".to_string());
        assert_eq!(
            config.schema_path(),
            Some(PathBuf::from("/srv/prism/schema.toml"))
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[encoder]\ncommand = [\"python3\", \"encode.py\"]\n\n[store]\ndimension = 512\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.encoder.command, vec!["python3", "encode.py"]);
        assert_eq!(config.encoder.batch_size, 32);
        assert_eq!(config.store.dimension, Some(512));
        assert_eq!(config.output.format, "json");
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[classify]\nparallel_workers = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("parallel_workers"));
    }
}
