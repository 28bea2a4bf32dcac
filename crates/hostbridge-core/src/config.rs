//! Bridge configuration (`[bridge]`-style TOML)
//!
//! ```toml
//! max_array_depth = 8
//! intern_references = true
//! typed_array_sources = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read bridge config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse bridge config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid bridge config: {0}")]
    Invalid(String),
}

/// Default maximum array depth
pub const DEFAULT_MAX_ARRAY_DEPTH: u8 = 32;

/// Tunables of the conversion engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Deepest array descriptor the classifier accepts
    pub max_array_depth: u8,

    /// Intern reference handles by host identity within one call scope
    pub intern_references: bool,

    /// Accept typed views where a depth-1 numeric array is expected
    pub typed_array_sources: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_array_depth: DEFAULT_MAX_ARRAY_DEPTH,
            intern_references: false,
            typed_array_sources: true,
        }
    }
}

impl BridgeConfig {
    /// Parse a config from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_array_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_array_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
