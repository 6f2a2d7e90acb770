//! Key generation and the compact `"<nickname>:<base64 DER>"` key format.
//!
//! Public keys are exported as SubjectPublicKeyInfo DER, private keys as
//! PKCS#8 DER. The nickname is a label only; it is not bound to the key
//! material and is never checked on import.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use thiserror::Error;

/// RSA modulus size in bits. The header's wrapped-key field is sized for it.
pub const RSA_BITS: usize = 2048;

/// Size in bytes of an RSA-OAEP ciphertext under [`RSA_BITS`].
pub const WRAPPED_KEY_SIZE: usize = RSA_BITS / 8;

/// Nickname used when none is given.
pub const DEFAULT_NICKNAME: &str = "ANON";

/// Separator between nickname and key material.
const SEPARATOR: char = ':';

/// Errors that can occur while generating, parsing or storing keys.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Key string is empty")]
    Empty,

    #[error("Invalid key format: expected \"<nickname>:<base64>\"")]
    MissingSeparator,

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Invalid public key DER: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key DER: {0}")]
    InvalidPrivateKey(String),

    #[error("Unsupported RSA modulus: expected {expected} bits, got {got}")]
    UnsupportedModulus { expected: usize, got: usize },

    #[error("Key generation failed: {0}")]
    GenerationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A recipient's RSA-OAEP public key together with its nickname.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    nickname: String,
    key: RsaPublicKey,
}

/// An RSA-OAEP private key together with its nickname.
#[derive(Clone)]
pub struct PrivateKey {
    nickname: String,
    key: RsaPrivateKey,
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Don't expose private key in debug output
        f.debug_struct("PrivateKey")
            .field("nickname", &self.nickname)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// A freshly generated key pair.
#[derive(Clone, Debug)]
pub struct KeyPair {
    public: PublicKey,
    private: PrivateKey,
}

impl KeyPair {
    /// Generates a new RSA-2048 key pair labelled with `nickname`.
    ///
    /// An empty nickname falls back to [`DEFAULT_NICKNAME`].
    pub fn generate(nickname: &str) -> Result<Self, KeyError> {
        let nickname = match nickname.trim() {
            "" => DEFAULT_NICKNAME.to_string(),
            nick => nick.to_string(),
        };

        let key = RsaPrivateKey::new(&mut OsRng, RSA_BITS)
            .map_err(|e| KeyError::GenerationFailed(e.to_string()))?;
        let public = RsaPublicKey::from(&key);

        Ok(Self {
            public: PublicKey {
                nickname: nickname.clone(),
                key: public,
            },
            private: PrivateKey { nickname, key },
        })
    }

    /// Returns the public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Returns the private half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Saves the key pair as `{base_path}.pub` and `{base_path}.key`.
    ///
    /// Each file holds the compact string followed by a newline. The private
    /// key file is restricted to the owner on Unix.
    pub fn save_to_files(&self, base_path: &Path) -> Result<(), KeyError> {
        let pub_path = base_path.with_extension("pub");
        let key_path = base_path.with_extension("key");

        fs::write(&pub_path, format!("{}\n", self.public.to_compact()?))?;
        fs::write(&key_path, format!("{}\n", self.private.to_compact()?))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&key_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&key_path, perms)?;
        }

        Ok(())
    }
}

impl PublicKey {
    /// Parses a compact public key string.
    pub fn parse(input: &str) -> Result<Self, KeyError> {
        let (nickname, der) = split_compact(input)?;
        let key = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        check_modulus(&key)?;
        Ok(Self { nickname, key })
    }

    /// The cosmetic nickname.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// The underlying RSA key.
    pub fn rsa(&self) -> &RsaPublicKey {
        &self.key
    }

    /// SubjectPublicKeyInfo DER encoding.
    pub fn to_der(&self) -> Result<Vec<u8>, KeyError> {
        let doc = self
            .key
            .to_public_key_der()
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        Ok(doc.as_bytes().to_vec())
    }

    /// Serializes to `"<nickname>:<base64 SPKI DER>"`.
    pub fn to_compact(&self) -> Result<String, KeyError> {
        Ok(format!("{}{}{}", self.nickname, SEPARATOR, BASE64.encode(self.to_der()?)))
    }
}

impl PrivateKey {
    /// Parses a compact private key string.
    pub fn parse(input: &str) -> Result<Self, KeyError> {
        let (nickname, der) = split_compact(input)?;
        let key = RsaPrivateKey::from_pkcs8_der(&der)
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        check_modulus(&key.to_public_key())?;
        Ok(Self { nickname, key })
    }

    /// The cosmetic nickname.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// The underlying RSA key.
    pub fn rsa(&self) -> &RsaPrivateKey {
        &self.key
    }

    /// Derives the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            nickname: self.nickname.clone(),
            key: self.key.to_public_key(),
        }
    }

    /// Serializes to `"<nickname>:<base64 PKCS#8 DER>"`.
    pub fn to_compact(&self) -> Result<String, KeyError> {
        let doc = self
            .key
            .to_pkcs8_der()
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        Ok(format!(
            "{}{}{}",
            self.nickname,
            SEPARATOR,
            BASE64.encode(doc.as_bytes())
        ))
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Loads a public key from a file containing its compact string.
pub fn load_public_key(path: &Path) -> Result<PublicKey, KeyError> {
    PublicKey::parse(&fs::read_to_string(path)?)
}

/// Loads a private key from a file containing its compact string.
pub fn load_private_key(path: &Path) -> Result<PrivateKey, KeyError> {
    PrivateKey::parse(&fs::read_to_string(path)?)
}

/// Splits `"<nickname>:<base64>"` at the last separator and decodes the DER.
///
/// Base64 never contains `:`, so nicknames may.
fn split_compact(input: &str) -> Result<(String, Vec<u8>), KeyError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(KeyError::Empty);
    }

    let (nickname, encoded) = input
        .rsplit_once(SEPARATOR)
        .ok_or(KeyError::MissingSeparator)?;

    let der = BASE64.decode(encoded.trim())?;
    Ok((nickname.to_string(), der))
}

fn check_modulus(key: &RsaPublicKey) -> Result<(), KeyError> {
    let got = key.size() * 8;
    if got != RSA_BITS {
        return Err(KeyError::UnsupportedModulus {
            expected: RSA_BITS,
            got,
        });
    }
    Ok(())
}
