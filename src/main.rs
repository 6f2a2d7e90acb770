//! pixvault - hide files and messages inside images
//!
//! A CLI tool for LSB image steganography with RSA-OAEP + AES-GCM protection.

mod commands;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;

use commands::{
    AppContext, CapacityCommand, CommandExecutor, DecodeCommand, EncodeCommand,
    FingerprintCommand, KeygenCommand,
};

/// pixvault - hide files and messages inside images
///
/// The payload is compressed, encrypted for the recipient's RSA key and
/// spread over the image's low bits. Output is always PNG.
#[derive(Parser)]
#[command(name = "pixvault")]
#[command(version)]
#[command(about = "Hide files and messages inside images, readable only by the recipient")]
#[command(long_about = None)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a config file (default: ~/.pixvault/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key pair
    Keygen(KeygenCommand),

    /// Hide a message or file in a cover image
    Encode(EncodeCommand),

    /// Recover a hidden message or file
    Decode(DecodeCommand),

    /// Show the density and carrier size a payload would need
    Capacity(CapacityCommand),

    /// Display a key's fingerprint
    Fingerprint(FingerprintCommand),
}

fn init_logger(verbose: bool) {
    let mut builder = Builder::new();
    builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));

    if verbose {
        builder.filter_level(LevelFilter::Debug);
    } else if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    } else {
        builder.filter_level(LevelFilter::Warn);
    }

    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let ctx = AppContext::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Keygen(cmd) => cmd.execute(&ctx),
        Commands::Encode(cmd) => cmd.execute(&ctx),
        Commands::Decode(cmd) => cmd.execute(&ctx),
        Commands::Capacity(cmd) => cmd.execute(&ctx),
        Commands::Fingerprint(cmd) => cmd.execute(&ctx),
    }
}
