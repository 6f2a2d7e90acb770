//! Encode command - hide a message or file in a cover image.

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::Args;

use pixvault::crypto::{load_public_key, PublicKey};
use pixvault::stego::Carrier;
use pixvault::{encode_with_config, EncoderConfig, Payload, ProgressEvent};

use super::{AppContext, CommandExecutor};

/// Hide a text message or a file inside a cover image.
///
/// The output is always a PNG. A cover too small for the payload is scaled up,
/// keeping its aspect ratio.
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// Cover image (PNG, JPEG, BMP, GIF, WebP)
    #[arg(short, long)]
    pub cover: PathBuf,

    /// Text message to hide (mutually exclusive with --file)
    #[arg(short, long, conflicts_with = "file")]
    pub message: Option<String>,

    /// File to hide (mutually exclusive with --message)
    #[arg(short, long, conflicts_with = "message")]
    pub file: Option<PathBuf>,

    /// Recipient's public key string (nickname:base64)
    #[arg(short = 't', long = "to", conflicts_with = "key")]
    pub to: Option<String>,

    /// Path to the recipient's public key file (.pub)
    #[arg(short, long, conflicts_with = "to")]
    pub key: Option<PathBuf>,

    /// Output PNG path (default: pic_<unix-millis>.png)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Force bits per channel (1-3) instead of the lowest that fits
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub bpc: Option<u8>,
}

impl CommandExecutor for EncodeCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let payload = self.load_payload()?;
        let recipient = self.load_recipient()?;

        let cover = Carrier::from_file(&self.cover)
            .with_context(|| format!("Failed to load cover image {}", self.cover.display()))?;

        let config = EncoderConfig {
            engine: ctx.engine.clone(),
            bpc: self.bpc,
        };

        let mut progress = |event: ProgressEvent| match event {
            ProgressEvent::Stage(stage) => eprintln!("{}...", stage),
            ProgressEvent::Bytes { done, total } => eprintln!("  {}/{} bytes", done, total),
        };

        let encoded = encode_with_config(&payload, &cover, &recipient, &config, &mut progress)
            .context("Failed to encode")?;

        let output = self.output.clone().unwrap_or_else(default_output_path);
        encoded
            .save(&output)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        let plan = encoded.plan();
        println!("Hidden for {} in {}", recipient.nickname(), output.display());
        println!(
            "  {}x{}, {} bit(s) per channel{}",
            plan.width,
            plan.height,
            plan.bpc,
            if plan.resized { ", cover was scaled" } else { "" }
        );

        Ok(())
    }
}

impl EncodeCommand {
    fn load_payload(&self) -> Result<Payload> {
        match (&self.message, &self.file) {
            (Some(message), None) => Ok(Payload::text(message.as_str())),
            (None, Some(path)) => {
                let bytes = fs::read(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .context("File name is not valid UTF-8")?;
                Ok(Payload::file(name, bytes))
            }
            _ => bail!("Provide either --message or --file"),
        }
    }

    fn load_recipient(&self) -> Result<PublicKey> {
        match (&self.to, &self.key) {
            (Some(compact), None) => {
                PublicKey::parse(compact).context("Invalid recipient key string")
            }
            (None, Some(path)) => load_public_key(path)
                .with_context(|| format!("Failed to load public key {}", path.display())),
            _ => bail!("Provide the recipient's key with --to or --key"),
        }
    }
}

/// `pic_<unix-millis>.png` in the current directory.
fn default_output_path() -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    PathBuf::from(format!("pic_{}.png", millis))
}
