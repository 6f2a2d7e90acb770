//! Fingerprint command - display key fingerprints for verification.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pixvault::crypto::{fingerprint, format_fingerprint, load_private_key, load_public_key, PublicKey};

use super::{AppContext, CommandExecutor};

/// Display a key's fingerprint for out-of-band verification.
///
/// Use this to verify keys with your contact over a secure channel
/// (phone call, in person, etc.) before sending anything.
///
/// Supports both public (.pub) and private (.key) key files; a private key
/// shows the fingerprint of its public half.
#[derive(Args, Debug)]
pub struct FingerprintCommand {
    /// Path to the key file (.pub or .key)
    #[arg(required = true)]
    pub key_path: PathBuf,
}

impl CommandExecutor for FingerprintCommand {
    fn execute(&self, _ctx: &AppContext) -> Result<()> {
        let public = self.load_public()?;
        let hash = fingerprint(&public).context("Failed to encode public key")?;

        println!("Key:      {}", self.key_path.display());
        println!("Nickname: {}", public.nickname());
        println!();
        println!("SHA-256 Fingerprint:");
        println!("  {}", format_fingerprint(&hash));

        Ok(())
    }
}

impl FingerprintCommand {
    /// Loads the key, deriving the public half from a private key file.
    fn load_public(&self) -> Result<PublicKey> {
        let ext = self
            .key_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        if ext == "pub" {
            load_public_key(&self.key_path)
                .with_context(|| format!("Failed to load {}", self.key_path.display()))
        } else {
            let private = load_private_key(&self.key_path)
                .with_context(|| format!("Failed to load {}", self.key_path.display()))?;
            Ok(private.public_key())
        }
    }
}
