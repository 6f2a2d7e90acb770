//! Decode command - recover a hidden message or file from an image.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;

use pixvault::crypto::{load_private_key, PrivateKey};
use pixvault::stego::Carrier;
use pixvault::{decode_with_config, DecoderConfig, ProgressEvent};

use super::{AppContext, CommandExecutor};

/// Recover what was hidden in an image with your private key.
///
/// Text messages are printed to stdout unless -o is given. Files are written
/// to -o, or under their embedded name in the current directory.
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// Image produced by `pixvault encode`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to your private key file (.key)
    #[arg(short, long, conflicts_with = "key_string")]
    pub key: Option<PathBuf>,

    /// Your private key string (nickname:base64)
    #[arg(long, conflicts_with = "key")]
    pub key_string: Option<String>,

    /// Where to write the recovered payload
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for DecodeCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let private_key = self.load_private_key()?;

        let image = Carrier::from_file(&self.input)
            .with_context(|| format!("Failed to load image {}", self.input.display()))?;

        let config = DecoderConfig {
            engine: ctx.engine.clone(),
        };

        let mut progress = |event: ProgressEvent| {
            if let ProgressEvent::Stage(stage) = event {
                eprintln!("{}...", stage);
            }
        };

        let decoded = decode_with_config(&image, &private_key, &config, &mut progress)
            .map_err(|e| {
                log::debug!("Decode failed: {}", e);
                anyhow!(e.user_message())
            })?;

        if decoded.is_text && self.output.is_none() {
            match decoded.text() {
                Some(text) => println!("{}", text),
                None => println!("{}", String::from_utf8_lossy(&decoded.data)),
            }
            return Ok(());
        }

        let output = match &self.output {
            Some(path) => path.clone(),
            None => PathBuf::from(decoded.safe_filename()),
        };
        fs::write(&output, &decoded.data)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        println!(
            "Recovered {} ({} bytes) to {}",
            decoded.filename,
            decoded.data.len(),
            output.display()
        );

        Ok(())
    }
}

impl DecodeCommand {
    fn load_private_key(&self) -> Result<PrivateKey> {
        match (&self.key, &self.key_string) {
            (Some(path), None) => load_private_key(path)
                .with_context(|| format!("Failed to load private key {}", path.display())),
            (None, Some(compact)) => {
                PrivateKey::parse(compact).context("Invalid private key string")
            }
            _ => bail!("Provide your private key with --key or --key-string"),
        }
    }
}
