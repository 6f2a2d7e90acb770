//! Payload encoding.
//!
//! This module orchestrates the encoding process:
//! 1. Pack the payload into a single-entry ZIP (DEFLATE, level 9)
//! 2. Encrypt the archive with a fresh AES-256-GCM key
//! 3. Wrap the AES key for the recipient (RSA-OAEP)
//! 4. Plan density and carrier size
//! 5. Prepare the canvas (scale, flatten over black)
//! 6. Embed the header, then the payload along the key-derived schedule
//! 7. Encode the carrier as PNG

use std::fs;
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::archive::{self, ArchiveError, TEXT_ENTRY_NAME};
use crate::config::EngineConfig;
use crate::crypto::{
    derive_seed_with, encrypt_payload, wrap_key, PublicKey, SymmetricError, SymmetricKey,
    WrapError,
};
use crate::stego::{
    self, Carrier, CapacityPlan, Header, NoProgress, ProgressEvent, ProgressSink, Stage,
    StegoError,
};

/// Errors that can occur during encoding.
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("Nothing to hide: the message is empty")]
    MissingPayload,

    #[error("Cover image has no pixels")]
    MissingCover,

    #[error("File name must not be empty")]
    InvalidFileName,

    #[error("Unsupported bits per channel: {0} (expected 1-3)")]
    InvalidDensity(u8),

    #[error("Payload does not fit: {writes_needed} writes needed, {available_slots} slots available")]
    Capacity {
        available_slots: usize,
        writes_needed: usize,
    },

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Key wrapping error: {0}")]
    Wrap(#[from] WrapError),

    #[error("Encryption error: {0}")]
    Symmetric(#[from] SymmetricError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Steganography error: {0}")]
    Stego(StegoError),
}

impl From<StegoError> for EncoderError {
    fn from(e: StegoError) -> Self {
        match e {
            StegoError::CapacityExceeded {
                available_slots,
                writes_needed,
            } => EncoderError::Capacity {
                available_slots,
                writes_needed,
            },
            StegoError::InvalidDensity(bpc) => EncoderError::InvalidDensity(bpc),
            other => EncoderError::Stego(other),
        }
    }
}

/// What to hide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A file, stored under its name.
    File { name: String, bytes: Vec<u8> },
    /// A text message, stored under the text sentinel name.
    Text(String),
}

impl Payload {
    /// Creates a file payload.
    pub fn file(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Payload::File {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Creates a text payload.
    pub fn text(text: impl Into<String>) -> Self {
        Payload::Text(text.into())
    }

    /// Entry name and content for the archive.
    fn entry(&self) -> Result<(&str, &[u8]), EncoderError> {
        match self {
            Payload::Text(text) if text.is_empty() => Err(EncoderError::MissingPayload),
            Payload::Text(text) => Ok((TEXT_ENTRY_NAME, text.as_bytes())),
            Payload::File { name, .. } if name.is_empty() => Err(EncoderError::InvalidFileName),
            Payload::File { name, bytes } => Ok((name.as_str(), bytes.as_slice())),
        }
    }
}

/// Configuration for the encoder.
#[derive(Debug, Clone, Default)]
pub struct EncoderConfig {
    /// Engine constants (seed derivation, pixel budget, progress chunk).
    pub engine: EngineConfig,
    /// Forces a payload density instead of picking the lowest that fits.
    pub bpc: Option<u8>,
}

/// Result of encoding a payload.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    png: Vec<u8>,
    plan: CapacityPlan,
}

impl EncodedImage {
    /// The carrier as PNG bytes.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Consumes self and returns the PNG bytes.
    pub fn into_png_bytes(self) -> Vec<u8> {
        self.png
    }

    /// Density and geometry the payload was embedded with.
    pub fn plan(&self) -> &CapacityPlan {
        &self.plan
    }

    /// Writes the PNG to `path`.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, &self.png)
    }
}

/// Hides `payload` in `cover` for `recipient` with the default configuration.
pub fn encode(
    payload: &Payload,
    cover: &Carrier,
    recipient: &PublicKey,
) -> Result<EncodedImage, EncoderError> {
    encode_with_config(
        payload,
        cover,
        recipient,
        &EncoderConfig::default(),
        &mut NoProgress,
    )
}

/// Hides `payload` in `cover` for `recipient`.
///
/// Nothing is produced unless every step succeeds; capacity problems are
/// reported before any pixel is written.
pub fn encode_with_config(
    payload: &Payload,
    cover: &Carrier,
    recipient: &PublicKey,
    config: &EncoderConfig,
    progress: &mut dyn ProgressSink,
) -> Result<EncodedImage, EncoderError> {
    let (name, bytes) = payload.entry()?;
    if cover.pixel_count() == 0 {
        return Err(EncoderError::MissingCover);
    }
    if let Some(bpc) = config.bpc {
        stego::check_bpc(bpc)?;
    }

    // Step 1: Archive
    stage(progress, Stage::Compressing);
    let archive = archive::pack(name, bytes)?;
    debug!("Packed {} bytes into {} byte archive", bytes.len(), archive.len());

    // Step 2-3: Encrypt and wrap
    stage(progress, Stage::Encrypting);
    let key = SymmetricKey::generate();
    let (iv, ciphertext) = encrypt_payload(&archive, &key)?;
    let wrapped_key = wrap_key(&key, recipient)?;

    let payload_len = u32::try_from(ciphertext.len())
        .map_err(|_| EncoderError::PayloadTooLarge(ciphertext.len()))?;

    // Step 4: Plan
    let plan = stego::plan(
        ciphertext.len(),
        cover.width(),
        cover.height(),
        config.engine.max_pixels,
        config.bpc,
    )?;

    // Step 5: Canvas
    stage(progress, Stage::PreparingCanvas { bpc: plan.bpc });
    let mut carrier = cover.prepare(&plan);

    // Step 6: Embed
    let seed = derive_seed_with(
        key.as_bytes(),
        config.engine.seed_salt.as_bytes(),
        config.engine.seed_iterations,
    );
    let header = Header {
        payload_len,
        bpc: plan.bpc,
        iv,
        wrapped_key,
    };
    stego::embed(
        &mut carrier,
        &header,
        &ciphertext,
        seed,
        config.engine.yield_chunk,
        progress,
    )?;

    // Step 7: PNG
    stage(progress, Stage::EncodingPng);
    let png = carrier.to_png_bytes()?;

    Ok(EncodedImage { png, plan })
}

fn stage(progress: &mut dyn ProgressSink, stage: Stage) {
    info!("{}", stage);
    progress.report(ProgressEvent::Stage(stage));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::fixtures;
    use crate::crypto::TAG_SIZE;
    use crate::decoder::decode;
    use image::{ImageBuffer, Rgba};

    fn cover(width: u32, height: u32) -> Carrier {
        Carrier::from_rgba(ImageBuffer::from_pixel(width, height, Rgba([90, 140, 200, 255])))
    }

    #[test]
    fn test_empty_text_is_missing_payload() {
        let result = encode(&Payload::text(""), &cover(64, 64), fixtures::alice().public_key());
        assert!(matches!(result, Err(EncoderError::MissingPayload)));
    }

    #[test]
    fn test_empty_file_name_rejected() {
        let result = encode(
            &Payload::file("", vec![1, 2, 3]),
            &cover(64, 64),
            fixtures::alice().public_key(),
        );
        assert!(matches!(result, Err(EncoderError::InvalidFileName)));
    }

    #[test]
    fn test_empty_cover_rejected() {
        let empty = Carrier::from_rgba(ImageBuffer::new(0, 0));
        let result = encode(&Payload::text("hi"), &empty, fixtures::alice().public_key());
        assert!(matches!(result, Err(EncoderError::MissingCover)));
    }

    #[test]
    fn test_invalid_forced_density() {
        let config = EncoderConfig {
            bpc: Some(0),
            ..EncoderConfig::default()
        };
        let result = encode_with_config(
            &Payload::text("hi"),
            &cover(64, 64),
            fixtures::alice().public_key(),
            &config,
            &mut NoProgress,
        );
        assert!(matches!(result, Err(EncoderError::InvalidDensity(0))));
    }

    #[test]
    fn test_small_cover_is_grown() {
        let encoded = encode(
            &Payload::text("a message that needs more room than a tiny cover has"),
            &cover(8, 8),
            fixtures::alice().public_key(),
        )
        .unwrap();

        let plan = encoded.plan();
        assert!(plan.resized);
        assert_eq!(plan.bpc, 1);
        assert!(plan.width.abs_diff(plan.height) <= 1);
        assert!(plan.pixels() >= plan.required_pixels);

        let carrier = Carrier::from_bytes(encoded.png_bytes()).unwrap();
        assert_eq!((carrier.width(), carrier.height()), (plan.width, plan.height));
    }

    #[test]
    fn test_budget_exceeded() {
        let config = EncoderConfig {
            engine: EngineConfig {
                max_pixels: 1000,
                ..EngineConfig::default()
            },
            bpc: None,
        };
        let noise: Vec<u8> = (0..5000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect();
        let result = encode_with_config(
            &Payload::file("noise.bin", noise),
            &cover(10, 10),
            fixtures::alice().public_key(),
            &config,
            &mut NoProgress,
        );
        assert!(matches!(result, Err(EncoderError::Capacity { .. })));
    }

    #[test]
    fn test_exact_fit_and_one_pixel_short() {
        // Find a file whose ciphertext length in bits is a multiple of 3, so
        // the payload fills its last pixel exactly at 1 bpc
        let (bytes, ciphertext_len) = (40..80usize)
            .map(|n| {
                let bytes: Vec<u8> = (0..n as u32).map(|i| (i * 37 % 251) as u8).collect();
                let len = archive::pack("fit.bin", &bytes).unwrap().len() + TAG_SIZE;
                (bytes, len)
            })
            .find(|(_, len)| (len * 8) % 3 == 0)
            .unwrap();
        let payload = Payload::file("fit.bin", bytes);
        let exact = (stego::PAYLOAD_START_PIXEL + ciphertext_len * 8 / 3) as u32;

        let config_for = |pixels: u32| EncoderConfig {
            engine: EngineConfig {
                max_pixels: u64::from(pixels),
                ..EngineConfig::default()
            },
            bpc: Some(1),
        };

        let encoded = encode_with_config(
            &payload,
            &cover(exact, 1),
            fixtures::alice().public_key(),
            &config_for(exact),
            &mut NoProgress,
        )
        .unwrap();
        assert!(!encoded.plan().resized);
        assert_eq!(encoded.plan().required_pixels, u64::from(exact));

        let carrier = Carrier::from_bytes(encoded.png_bytes()).unwrap();
        let decoded = decode(&carrier, fixtures::alice().private_key()).unwrap();
        assert_eq!(Payload::file(decoded.filename, decoded.data), payload);

        let short = exact - 1;
        let result = encode_with_config(
            &payload,
            &cover(short, 1),
            fixtures::alice().public_key(),
            &config_for(short),
            &mut NoProgress,
        );
        match result {
            Err(EncoderError::Capacity {
                available_slots,
                writes_needed,
            }) => {
                assert_eq!(writes_needed, ciphertext_len * 8);
                assert_eq!(available_slots + 3, writes_needed);
            }
            other => panic!("expected a capacity error, got {:?}", other.map(|e| *e.plan())),
        }
    }

    #[test]
    fn test_stage_order() {
        let mut stages = Vec::new();
        let mut sink = |e: ProgressEvent| {
            if let ProgressEvent::Stage(s) = e {
                stages.push(s);
            }
        };
        encode_with_config(
            &Payload::text("stages"),
            &cover(64, 64),
            fixtures::alice().public_key(),
            &EncoderConfig::default(),
            &mut sink,
        )
        .unwrap();

        assert_eq!(
            stages,
            vec![
                Stage::Compressing,
                Stage::Encrypting,
                Stage::PreparingCanvas { bpc: 1 },
                Stage::EmbeddingHeader,
                Stage::EmbeddingPayload,
                Stage::EncodingPng,
            ]
        );
    }
}
