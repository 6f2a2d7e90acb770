//! Payload decoding.
//!
//! This module orchestrates the decoding process:
//! 1. Read the 273-byte header from the first pixels
//! 2. Unwrap the AES key with the private key
//! 3. Derive the seed and rebuild the placement schedule
//! 4. Extract the ciphertext bits
//! 5. Decrypt and authenticate
//! 6. Unpack the archive
//!
//! The key is unwrapped before the header geometry is trusted, so a wrong key
//! is always reported as such and never as a layout problem. Nothing is
//! returned unless every step succeeds.

use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::archive::{self, ArchiveError};
use crate::config::EngineConfig;
use crate::crypto::{decrypt_payload, derive_seed_with, unwrap_key, PrivateKey};
use crate::stego::{
    self, read_header, Carrier, NoProgress, ProgressEvent, ProgressSink, Stage, StegoError,
};

/// File name used when the embedded one cannot be used safely.
pub const FALLBACK_FILE_NAME: &str = "decoded.bin";

/// Message shown to users for every key or integrity failure.
const GENERIC_FAILURE: &str = "Invalid key or corrupted file";

/// Errors that can occur during decoding.
#[derive(Error, Debug)]
pub enum DecoderError {
    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Image too small to hold a header: {0}")]
    Header(StegoError),

    /// The private key does not open the wrapped AES key.
    #[error("Invalid key")]
    InvalidKey,

    /// The ciphertext failed GCM authentication.
    #[error("Authentication failed")]
    Authentication,

    /// The header describes a layout this image cannot hold.
    #[error("Corrupted layout: {0}")]
    CorruptedLayout(StegoError),

    /// The decrypted archive could not be read.
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

impl DecoderError {
    /// Text suitable for end users. Key, integrity and layout failures all
    /// read the same.
    pub fn user_message(&self) -> String {
        match self {
            DecoderError::InvalidKey
            | DecoderError::Authentication
            | DecoderError::CorruptedLayout(_)
            | DecoderError::Archive(_) => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

/// A recovered payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Name of the archive entry, as embedded.
    pub filename: String,
    /// Entry content.
    pub data: Vec<u8>,
    /// True when the payload was embedded as a text message.
    pub is_text: bool,
}

impl DecodedPayload {
    /// The content as text, for text payloads that are valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        if self.is_text {
            std::str::from_utf8(&self.data).ok()
        } else {
            None
        }
    }

    /// The embedded file name reduced to its last path component.
    ///
    /// Falls back to [`FALLBACK_FILE_NAME`] for names such as `..`, `/` or
    /// the empty string.
    pub fn safe_filename(&self) -> String {
        Path::new(&self.filename)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
    }
}

/// Configuration for the decoder.
#[derive(Debug, Clone, Default)]
pub struct DecoderConfig {
    /// Engine constants. Must match those used for encoding.
    pub engine: EngineConfig,
}

/// Recovers the payload hidden in `image` with the default configuration.
pub fn decode(image: &Carrier, private_key: &PrivateKey) -> Result<DecodedPayload, DecoderError> {
    decode_with_config(image, private_key, &DecoderConfig::default(), &mut NoProgress)
}

/// Recovers the payload hidden in `image`.
pub fn decode_with_config(
    image: &Carrier,
    private_key: &PrivateKey,
    config: &DecoderConfig,
    progress: &mut dyn ProgressSink,
) -> Result<DecodedPayload, DecoderError> {
    if image.pixel_count() == 0 {
        return Err(DecoderError::EmptyImage);
    }

    // Step 1: Header
    stage(progress, Stage::ReadingHeader);
    let header = read_header(image.pixels()).map_err(DecoderError::Header)?;
    debug!(
        "Header: {} payload bytes at {} bpc, image {}x{}",
        header.payload_len,
        header.bpc,
        image.width(),
        image.height()
    );

    // Step 2: Key
    stage(progress, Stage::UnwrappingKey);
    let key = unwrap_key(&header.wrapped_key, private_key).map_err(|_| DecoderError::InvalidKey)?;

    // Step 3-4: Schedule and extraction
    let seed = derive_seed_with(
        key.as_bytes(),
        config.engine.seed_salt.as_bytes(),
        config.engine.seed_iterations,
    );
    let ciphertext = stego::extract(image, &header, seed, config.engine.yield_chunk, progress)
        .map_err(DecoderError::CorruptedLayout)?;

    // Step 5: Decrypt
    stage(progress, Stage::Decrypting);
    let archive_bytes = decrypt_payload(&ciphertext, &key, &header.iv)
        .map_err(|_| DecoderError::Authentication)?;

    // Step 6: Unpack
    stage(progress, Stage::Unpacking);
    let entry = archive::unpack(&archive_bytes)?;
    let is_text = entry.is_text();

    Ok(DecodedPayload {
        filename: entry.name,
        data: entry.bytes,
        is_text,
    })
}

fn stage(progress: &mut dyn ProgressSink, stage: Stage) {
    info!("{}", stage);
    progress.report(ProgressEvent::Stage(stage));
}
