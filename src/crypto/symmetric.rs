//! AES-256-GCM payload encryption.
//!
//! A fresh key is generated for every encode. The 96-bit IV is random and
//! travels in the header; the 16-byte tag is appended to the ciphertext.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// GCM nonce size in bytes.
pub const IV_SIZE: usize = 12;

/// GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during symmetric encryption.
#[derive(Error, Debug)]
pub enum SymmetricError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Tag mismatch, truncated ciphertext or wrong key. Never more specific.
    #[error("Authentication failed")]
    AuthenticationFailed,
}

/// A transient AES-256 key. Zeroed on drop.
#[derive(Clone)]
pub struct SymmetricKey(Zeroizing<[u8; KEY_SIZE]>);

impl SymmetricKey {
    /// Generates a random key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_SIZE]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self(bytes)
    }

    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// Encrypts `plaintext` under `key` with a random IV.
///
/// Returns the IV and the ciphertext with the tag appended.
pub fn encrypt_payload(
    plaintext: &[u8],
    key: &SymmetricKey,
) -> Result<([u8; IV_SIZE], Vec<u8>), SymmetricError> {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| SymmetricError::EncryptionFailed(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| SymmetricError::EncryptionFailed(e.to_string()))?;

    Ok((iv, ciphertext))
}

/// Decrypts and authenticates `ciphertext`.
pub fn decrypt_payload(
    ciphertext: &[u8],
    key: &SymmetricKey,
    iv: &[u8; IV_SIZE],
) -> Result<Vec<u8>, SymmetricError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| SymmetricError::AuthenticationFailed)?;

    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| SymmetricError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = SymmetricKey::generate();
        let plaintext = b"Hello, pixvault!";

        let (iv, ciphertext) = encrypt_payload(plaintext, &key).unwrap();
        let decrypted = decrypt_payload(&ciphertext, &key, &iv).unwrap();

        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_tag_is_appended() {
        let key = SymmetricKey::generate();
        let (_, ciphertext) = encrypt_payload(&[7u8; 100], &key).unwrap();
        assert_eq!(ciphertext.len(), 100 + TAG_SIZE);
    }

    #[test]
    fn test_empty_plaintext() {
        let key = SymmetricKey::generate();

        let (iv, ciphertext) = encrypt_payload(b"", &key).unwrap();
        assert_eq!(ciphertext.len(), TAG_SIZE);

        let decrypted = decrypt_payload(&ciphertext, &key, &iv).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_fresh_iv_per_message() {
        let key = SymmetricKey::generate();
        let (iv1, ct1) = encrypt_payload(b"same", &key).unwrap();
        let (iv2, ct2) = encrypt_payload(b"same", &key).unwrap();

        assert_ne!(iv1, iv2);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = SymmetricKey::generate();
        let other = SymmetricKey::generate();

        let (iv, ciphertext) = encrypt_payload(b"Secret data", &key).unwrap();
        let result = decrypt_payload(&ciphertext, &other, &iv);

        assert!(matches!(result, Err(SymmetricError::AuthenticationFailed)));
    }

    #[test]
    fn test_single_bit_flip_fails() {
        let key = SymmetricKey::generate();
        let (iv, mut ciphertext) = encrypt_payload(b"tamper with me", &key).unwrap();

        ciphertext[3] ^= 0x01;
        let result = decrypt_payload(&ciphertext, &key, &iv);

        assert!(matches!(result, Err(SymmetricError::AuthenticationFailed)));
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let key = SymmetricKey::generate();
        let iv = [0u8; IV_SIZE];

        let result = decrypt_payload(&[0u8; 5], &key, &iv);
        assert!(matches!(result, Err(SymmetricError::AuthenticationFailed)));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SymmetricKey::from_bytes([0xAB; KEY_SIZE]);
        assert!(!format!("{:?}", key).contains("AB"));
    }
}
