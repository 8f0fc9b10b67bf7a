//! # Engine Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! name = "sandbox"
//! strict_dependencies = true
//! max_frames = 600
//! max_delta_seconds = 0.1
//! fps_window = 60
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine-wide settings handed to every module on `Initialize`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Application name, used in logs.
    pub name: String,
    /// Refuse to start while any module waits on a missing dependency.
    pub strict_dependencies: bool,
    /// Stop after this many frames. `None` runs until shutdown is requested.
    pub max_frames: Option<u64>,
    /// Upper bound for the `dt` reported to `Update` handlers, in seconds.
    pub max_delta_seconds: f64,
    /// Number of recent frames averaged for the fps estimate.
    pub fps_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "concord".to_string(),
            strict_dependencies: true,
            max_frames: None,
            max_delta_seconds: 0.1,
            fps_window: 60,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_string()));
        }
        if !self.max_delta_seconds.is_finite() || self.max_delta_seconds <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_delta_seconds must be positive, got {}",
                self.max_delta_seconds
            )));
        }
        if self.fps_window < 2 {
            return Err(ConfigError::Invalid(format!(
                "fps_window must be at least 2, got {}",
                self.fps_window
            )));
        }
        Ok(())
    }
}
