//! RSA-OAEP wrapping of the per-message symmetric key.
//!
//! The AES key is encrypted under the recipient's public key with OAEP
//! (SHA-256 digest, MGF1-SHA-256, empty label). Under a 2048-bit modulus the
//! wrapped key is always exactly [`WRAPPED_KEY_SIZE`] bytes.

use rand::rngs::OsRng;
use rsa::Oaep;
use sha2::Sha256;
use thiserror::Error;

use super::keys::{PrivateKey, PublicKey, WRAPPED_KEY_SIZE};
use super::symmetric::{SymmetricKey, KEY_SIZE};

/// Errors that can occur while wrapping or unwrapping a key.
#[derive(Error, Debug)]
pub enum WrapError {
    #[error("Key wrapping failed: {0}")]
    WrapFailed(String),

    /// Any unwrap failure. Padding and length failures are not distinguished.
    #[error("Invalid key")]
    InvalidKey,
}

/// Encrypts a raw symmetric key for `recipient`.
pub fn wrap_key(
    key: &SymmetricKey,
    recipient: &PublicKey,
) -> Result<[u8; WRAPPED_KEY_SIZE], WrapError> {
    let wrapped = recipient
        .rsa()
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key.as_bytes())
        .map_err(|e| WrapError::WrapFailed(e.to_string()))?;

    wrapped
        .try_into()
        .map_err(|v: Vec<u8>| WrapError::WrapFailed(format!("unexpected wrapped size {}", v.len())))
}

/// Recovers the symmetric key with our own private key.
pub fn unwrap_key(wrapped: &[u8], own: &PrivateKey) -> Result<SymmetricKey, WrapError> {
    let raw = own
        .rsa()
        .decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), wrapped)
        .map_err(|_| WrapError::InvalidKey)?;

    if raw.len() != KEY_SIZE {
        return Err(WrapError::InvalidKey);
    }

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&raw);
    Ok(SymmetricKey::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::fixtures::{alice, bob};

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let key = SymmetricKey::generate();

        let wrapped = wrap_key(&key, alice().public_key()).unwrap();
        let unwrapped = unwrap_key(&wrapped, alice().private_key()).unwrap();

        assert_eq!(key.as_bytes(), unwrapped.as_bytes());
    }

    #[test]
    fn test_wrapped_size_is_fixed() {
        let key = SymmetricKey::generate();
        let wrapped = wrap_key(&key, bob().public_key()).unwrap();
        assert_eq!(wrapped.len(), 256);
    }

    #[test]
    fn test_wrapping_is_randomized() {
        let key = SymmetricKey::generate();
        let first = wrap_key(&key, alice().public_key()).unwrap();
        let second = wrap_key(&key, alice().public_key()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_wrong_private_key_fails() {
        let key = SymmetricKey::generate();
        let wrapped = wrap_key(&key, alice().public_key()).unwrap();

        let result = unwrap_key(&wrapped, bob().private_key());
        assert!(matches!(result, Err(WrapError::InvalidKey)));
    }

    #[test]
    fn test_garbage_fails_as_invalid_key() {
        let result = unwrap_key(&[0x5Au8; 256], alice().private_key());
        assert!(matches!(result, Err(WrapError::InvalidKey)));

        let result = unwrap_key(&[1, 2, 3], alice().private_key());
        assert!(matches!(result, Err(WrapError::InvalidKey)));
    }
}
