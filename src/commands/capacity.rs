//! Capacity command - show how a payload would be laid out in a cover.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pixvault::crypto::TAG_SIZE;
use pixvault::stego::{self, Carrier};

use super::{AppContext, CommandExecutor};

/// Show the density and carrier size a payload would need.
///
/// The size is the ciphertext size; the archive adds some overhead on top of
/// the raw file, and compression can take some away.
#[derive(Args, Debug)]
pub struct CapacityCommand {
    /// Cover image
    #[arg(short, long)]
    pub cover: PathBuf,

    /// Payload size in bytes
    #[arg(short, long)]
    pub size: usize,

    /// Force bits per channel (1-3)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub bpc: Option<u8>,
}

impl CommandExecutor for CapacityCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let cover = Carrier::from_file(&self.cover)
            .with_context(|| format!("Failed to load cover image {}", self.cover.display()))?;

        let ciphertext_len = self.size + TAG_SIZE;
        let plan = stego::plan(
            ciphertext_len,
            cover.width(),
            cover.height(),
            ctx.engine.max_pixels,
            self.bpc,
        )
        .context("Payload does not fit")?;

        println!("Cover:            {}x{}", cover.width(), cover.height());
        println!("Bits per channel: {}", plan.bpc);
        println!("Pixels required:  {}", plan.required_pixels);
        println!("Carrier:          {}x{}", plan.width, plan.height);
        println!("Resized:          {}", if plan.resized { "yes" } else { "no" });
        println!(
            "Slots used:       {} of {}",
            stego::capacity::writes_needed(ciphertext_len, plan.bpc),
            stego::available_slots(plan.pixels() as usize)
        );

        Ok(())
    }
}
