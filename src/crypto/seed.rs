//! Scheduler seed derivation.
//!
//! The payload placement is keyed by the per-message AES key: PBKDF2 turns the
//! raw key into a 32-bit seed, so only someone who can unwrap the key knows
//! where the payload bits sit.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

/// Salt used when no configuration overrides it.
pub const DEFAULT_SEED_SALT: &str = "ATHIRD_HIGH_SALT_SECURE_LAYER_V2";

/// PBKDF2 iteration count used when no configuration overrides it.
pub const DEFAULT_SEED_ITERATIONS: u32 = 100_000;

/// Derives the scheduler seed with the default salt and iteration count.
pub fn derive_seed(key_bytes: &[u8]) -> u32 {
    derive_seed_with(key_bytes, DEFAULT_SEED_SALT.as_bytes(), DEFAULT_SEED_ITERATIONS)
}

/// Derives the scheduler seed: PBKDF2-HMAC-SHA256, 4 bytes, big-endian.
pub fn derive_seed_with(key_bytes: &[u8], salt: &[u8], iterations: u32) -> u32 {
    let mut out = [0u8; 4];
    pbkdf2_hmac::<Sha256>(key_bytes, salt, iterations, &mut out);
    u32::from_be_bytes(out)
}
