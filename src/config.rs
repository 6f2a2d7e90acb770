//! Engine configuration.
//!
//! Every value here is fixed for the lifetime of the process. Changing the
//! seed salt or iteration count makes previously produced images unreadable.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::seed::{DEFAULT_SEED_ITERATIONS, DEFAULT_SEED_SALT};

/// Default pixel budget for carrier growth (Full HD).
pub const DEFAULT_MAX_PIXELS: u64 = 1920 * 1080;

/// Default number of payload bytes processed between progress reports.
pub const DEFAULT_YIELD_CHUNK: usize = 100_000;

/// Name of the config file inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Process-wide engine constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// PBKDF2 salt for the scheduler seed.
    pub seed_salt: String,

    /// PBKDF2 iteration count for the scheduler seed.
    pub seed_iterations: u32,

    /// Largest carrier (in pixels) the planner may grow a cover to.
    pub max_pixels: u64,

    /// Payload bytes between progress reports.
    pub yield_chunk: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed_salt: DEFAULT_SEED_SALT.to_string(),
            seed_iterations: DEFAULT_SEED_ITERATIONS,
            max_pixels: DEFAULT_MAX_PIXELS,
            yield_chunk: DEFAULT_YIELD_CHUNK,
        }
    }
}

impl EngineConfig {
    /// Loads and validates a TOML config file. Missing keys use defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config from `~/.pixvault/config.toml` if it exists,
    /// otherwise returns defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seed_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "seed_iterations must be at least 1".to_string(),
            ));
        }
        if self.yield_chunk == 0 {
            return Err(ConfigError::InvalidValue(
                "yield_chunk must be at least 1".to_string(),
            ));
        }
        if self.max_pixels == 0 {
            return Err(ConfigError::InvalidValue(
                "max_pixels must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns `~/.pixvault`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pixvault"))
}

/// Returns `~/.pixvault/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.seed_salt, "ATHIRD_HIGH_SALT_SECURE_LAYER_V2");
        assert_eq!(config.seed_iterations, 100_000);
        assert_eq!(config.max_pixels, 2_073_600);
        assert_eq!(config.yield_chunk, 100_000);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_pixels = 4000000\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.max_pixels, 4_000_000);
        assert_eq!(config.seed_iterations, DEFAULT_SEED_ITERATIONS);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig {
            yield_chunk: 4096,
            ..EngineConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "yield_chunk = 0\n").unwrap();

        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_pixels = \"lots\"\n").unwrap();

        assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
