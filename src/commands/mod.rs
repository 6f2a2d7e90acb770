//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.

mod capacity;
mod decode;
mod encode;
mod fingerprint;
mod keygen;

pub use capacity::CapacityCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use fingerprint::FingerprintCommand;
pub use keygen::KeygenCommand;

use std::path::Path;

use anyhow::{Context, Result};

use pixvault::EngineConfig;

/// State shared by every command, resolved once from the global flags.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Engine constants from `--config`, `~/.pixvault/config.toml` or defaults.
    pub engine: EngineConfig,
}

impl AppContext {
    /// Loads the engine config from `path` when given, otherwise from the
    /// default location if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let engine = match path {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => EngineConfig::load_default().context("Failed to load default config")?,
        };
        Ok(Self { engine })
    }
}

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments.
    fn execute(&self, ctx: &AppContext) -> Result<()>;
}
