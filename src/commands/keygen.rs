//! Key generation command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pixvault::crypto::{KeyPair, DEFAULT_NICKNAME};

use super::{AppContext, CommandExecutor};

/// Generate a new RSA-2048 key pair.
#[derive(Args, Debug)]
pub struct KeygenCommand {
    /// Nickname embedded in both key strings (cosmetic)
    #[arg(short, long, default_value = DEFAULT_NICKNAME)]
    pub nickname: String,

    /// Output path for keys (creates .pub and .key files)
    #[arg(short, long, default_value = "pixvault")]
    pub output: PathBuf,

    /// Also print both key strings to stdout
    #[arg(long)]
    pub print: bool,
}

impl CommandExecutor for KeygenCommand {
    fn execute(&self, _ctx: &AppContext) -> Result<()> {
        eprintln!("Generating RSA-2048 key pair...");
        let keypair = KeyPair::generate(&self.nickname).context("Failed to generate key pair")?;
        keypair
            .save_to_files(&self.output)
            .context("Failed to save key pair")?;

        let pub_path = self.output.with_extension("pub");
        let key_path = self.output.with_extension("key");

        println!("Key pair generated successfully:");
        println!("  Public key:  {}", pub_path.display());
        println!("  Private key: {}", key_path.display());
        println!();
        println!("Share your public key (.pub) with people who want to send you files.");
        println!("Keep your private key (.key) secret and secure.");

        if self.print {
            println!();
            println!("Public:  {}", keypair.public_key().to_compact()?);
            println!("Private: {}", keypair.private_key().to_compact()?);
        }

        Ok(())
    }
}
