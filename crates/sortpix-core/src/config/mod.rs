//! Configuration management for SortPix.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a partial file is fine.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for SortPix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input, output, model and override locations
    pub paths: PathsConfig,

    /// Worker pool and discovery settings
    pub processing: ProcessingConfig,

    /// Object detector settings
    pub detector: DetectorConfig,

    /// Image classifier settings
    pub classifier: ClassifierConfig,

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
    /// - macOS: ~/Library/Application Support/com.sortpix.sortpix/config.toml
    /// - Linux: ~/.config/sortpix/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\sortpix\sortpix\config\config.toml
    ///
    /// Falls back to ~/.sortpix/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "sortpix", "sortpix")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".sortpix").join("config.toml")
            })
    }

    pub fn input_dir(&self) -> PathBuf {
        expand(&self.paths.input_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        expand(&self.paths.output_dir)
    }

    pub fn model_dir(&self) -> PathBuf {
        expand(&self.paths.model_dir)
    }

    pub fn detector_labels(&self) -> PathBuf {
        expand(&self.paths.detector_labels)
    }

    pub fn classifier_labels(&self) -> PathBuf {
        expand(&self.paths.classifier_labels)
    }

    pub fn skip_list(&self) -> PathBuf {
        expand(&self.paths.skip_list)
    }

    pub fn manual_tags(&self) -> PathBuf {
        expand(&self.paths.manual_tags)
    }

    pub fn confidence_log(&self) -> PathBuf {
        expand(&self.paths.confidence_log)
    }

    /// Resolved path of the detector ONNX model.
    pub fn detector_model(&self) -> PathBuf {
        self.model_dir().join(&self.detector.model)
    }

    /// Resolved path of the classifier ONNX model.
    pub fn classifier_model(&self) -> PathBuf {
        self.model_dir().join(&self.classifier.model)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Expand a leading `~` in a configured path.
fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}
