//! Cryptographic envelope for pixvault.
//!
//! This module provides:
//! - RSA-2048 key pairs in the compact `nickname:base64(DER)` form
//! - RSA-OAEP (SHA-256) wrapping of the per-message AES key
//! - AES-256-GCM payload encryption
//! - PBKDF2 derivation of the placement seed

pub mod asymmetric;
pub mod keys;
pub mod seed;
pub mod symmetric;

pub use asymmetric::{unwrap_key, wrap_key, WrapError};
pub use keys::{
    load_private_key, load_public_key, KeyError, KeyPair, PrivateKey, PublicKey, DEFAULT_NICKNAME,
    RSA_BITS, WRAPPED_KEY_SIZE,
};
pub use seed::{derive_seed, derive_seed_with, DEFAULT_SEED_ITERATIONS, DEFAULT_SEED_SALT};
pub use symmetric::{decrypt_payload, encrypt_payload, SymmetricError, SymmetricKey, IV_SIZE, KEY_SIZE, TAG_SIZE};

use sha2::{Digest, Sha256};

/// SHA-256 of the public key's SPKI DER encoding.
///
/// Nicknames are not part of the fingerprint, so two strings that differ only
/// in nickname identify the same key.
pub fn fingerprint(public: &PublicKey) -> Result<[u8; 32], KeyError> {
    let der = public.to_der()?;
    Ok(Sha256::digest(&der).into())
}

/// Formats a fingerprint as upper-case hex in groups of four, e.g.
/// `3F2A 91C0 ...`.
pub fn format_fingerprint(hash: &[u8; 32]) -> String {
    hash.chunks(2)
        .map(hex::encode_upper)
        .collect::<Vec<_>>()
        .join(" ")
}
