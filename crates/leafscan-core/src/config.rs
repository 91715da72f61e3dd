//! Shared runtime configuration.
//!
//! Settings start from [`Settings::default`], are optionally read from a JSON
//! file, and are then overridden by command-line flags in the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{CategoryRegistry, DEFAULT_CATEGORIES};

/// Scores strictly below this are flagged as low confidence.
pub const DEFAULT_LOW_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Language the models' labels and advice files are written in.
pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Model input resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `<plant>.<ext>`, `<plant>_class_map.json`, and
    /// `<plant>_prevention.json` for every plant.
    pub model_dir: PathBuf,
    /// Extension of the model artifacts inside `model_dir`.
    pub model_extension: String,
    pub image_size: ImageSize,
    pub low_confidence_threshold: f32,
    pub source_language: String,
    pub translation_enabled: bool,
    /// Override for the translation endpoint; `None` uses the backend default.
    pub translation_endpoint: Option<String>,
    pub translation_timeout_ms: u64,
    pub categories: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            model_extension: "onnx".to_string(),
            image_size: ImageSize::default(),
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
            source_language: DEFAULT_SOURCE_LANGUAGE.to_string(),
            translation_enabled: true,
            translation_endpoint: None,
            translation_timeout_ms: 5_000,
            categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        debug!(
            path = %path.display(),
            model_dir = %settings.model_dir.display(),
            categories = settings.categories.len(),
            "loaded settings"
        );
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.low_confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "low_confidence_threshold must be within [0, 1], got {}",
                self.low_confidence_threshold
            )));
        }
        if self.image_size.width == 0 || self.image_size.height == 0 {
            return Err(ConfigError::Invalid("image_size must be non-zero".into()));
        }
        if self.registry().is_empty() {
            return Err(ConfigError::Invalid("no categories configured".into()));
        }
        Ok(())
    }

    pub fn registry(&self) -> CategoryRegistry {
        CategoryRegistry::new(self.categories.iter().map(String::as_str))
    }

    pub fn translation_timeout(&self) -> Duration {
        Duration::from_millis(self.translation_timeout_ms)
    }
}
