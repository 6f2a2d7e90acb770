//! # pixvault - hide files and messages inside images
//!
//! pixvault hides an arbitrary file or text message in the least significant
//! bits of a carrier image. Only the holder of the recipient's private key can
//! get it back out.
//!
//! ## Overview
//!
//! - The payload is packed into a single-entry ZIP (DEFLATE, level 9)
//! - The archive is encrypted with a fresh AES-256-GCM key
//! - The AES key is wrapped for the recipient with RSA-OAEP (SHA-256)
//! - A fixed 273-byte header (length, density, IV, wrapped key) is written at
//!   1 bit per channel from the first pixel
//! - The ciphertext is spread over the rest of the image at 1-3 bits per
//!   channel, along a jittered schedule derived from the AES key
//! - The carrier is always written as PNG
//!
//! ## Security Model
//!
//! - **Confidentiality and integrity** come from AES-GCM; a wrong key or any
//!   tampering is detected, never silently decoded
//! - **Placement** is key-derived, so there is no fixed stride to scan for,
//!   but it is not a steganalysis guarantee
//! - **Fixed algorithms**: RSA-2048, AES-256-GCM, PBKDF2-SHA256
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pixvault::crypto::KeyPair;
//! use pixvault::stego::Carrier;
//! use pixvault::{decode, encode, Payload};
//!
//! let keys = KeyPair::generate("alice").unwrap();
//! let cover = Carrier::from_file("cover.jpg").unwrap();
//!
//! let encoded = encode(&Payload::text("meet at noon"), &cover, keys.public_key()).unwrap();
//! encoded.save("out.png".as_ref()).unwrap();
//!
//! let image = Carrier::from_file("out.png").unwrap();
//! let decoded = decode(&image, keys.private_key()).unwrap();
//! assert_eq!(decoded.text(), Some("meet at noon"));
//! ```
//!
//! ## Modules
//!
//! - [`crypto`]: keys, key wrapping, payload encryption, seed derivation
//! - [`archive`]: single-entry ZIP container
//! - [`stego`]: header, scheduling, capacity planning, LSB embedding
//! - [`encoder`]: the full encode pipeline
//! - [`decoder`]: the full decode pipeline
//! - [`config`]: engine constants

pub mod archive;
pub mod config;
pub mod crypto;
pub mod decoder;
pub mod encoder;
pub mod stego;

// Re-export commonly used types at the crate root
pub use config::EngineConfig;
pub use crypto::{KeyPair, PrivateKey, PublicKey};
pub use decoder::{decode, decode_with_config, DecodedPayload, DecoderConfig, DecoderError};
pub use encoder::{encode, encode_with_config, EncodedImage, EncoderConfig, EncoderError, Payload};
pub use stego::{Carrier, CapacityPlan, NoProgress, ProgressEvent, ProgressSink, Stage};
