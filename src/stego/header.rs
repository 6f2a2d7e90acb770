//! The fixed 273-byte header at the start of every carrier.
//!
//! Layout (big-endian):
//!
//! | offset | size | field            |
//! |--------|------|------------------|
//! | 0      | 4    | payload length   |
//! | 4      | 1    | bits per channel |
//! | 5      | 12   | AES-GCM IV       |
//! | 17     | 256  | wrapped AES key  |
//!
//! The header is always written at one bit per R,G,B channel, sequentially
//! from pixel 0, regardless of the payload density. There is no version byte
//! and no magic number.

use crate::crypto::keys::WRAPPED_KEY_SIZE;
use crate::crypto::symmetric::IV_SIZE;

use super::{StegoError, CHANNELS, COLOR_CHANNELS};

/// Header size in bytes.
pub const HEADER_SIZE: usize = 4 + 1 + IV_SIZE + WRAPPED_KEY_SIZE;

/// Header size in channel slots (one bit each).
pub const HEADER_BITS: usize = HEADER_SIZE * 8;

/// Decoded header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Ciphertext length in bytes (tag included).
    pub payload_len: u32,
    /// Payload density in bits per channel.
    pub bpc: u8,
    /// AES-GCM IV.
    pub iv: [u8; IV_SIZE],
    /// RSA-OAEP wrapped AES key.
    pub wrapped_key: [u8; WRAPPED_KEY_SIZE],
}

impl Header {
    /// Serializes to exactly [`HEADER_SIZE`] bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.payload_len.to_be_bytes());
        out[4] = self.bpc;
        out[5..5 + IV_SIZE].copy_from_slice(&self.iv);
        out[5 + IV_SIZE..].copy_from_slice(&self.wrapped_key);
        out
    }

    /// Parses a header. Any 273 bytes are accepted; field values are not
    /// validated here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StegoError> {
        if bytes.len() != HEADER_SIZE {
            return Err(StegoError::InvalidHeaderSize(bytes.len()));
        }

        let payload_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let bpc = bytes[4];

        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&bytes[5..5 + IV_SIZE]);

        let mut wrapped_key = [0u8; WRAPPED_KEY_SIZE];
        wrapped_key.copy_from_slice(&bytes[5 + IV_SIZE..]);

        Ok(Self {
            payload_len,
            bpc,
            iv,
            wrapped_key,
        })
    }
}

/// Byte offset of the channel holding header bit `bit`.
fn header_channel(bit: usize) -> usize {
    (bit / COLOR_CHANNELS) * CHANNELS + bit % COLOR_CHANNELS
}

/// Writes the header into the LSBs of the first header pixels.
///
/// `pixels` is a raw RGBA buffer; it must hold at least the header pixels.
pub fn write_header(pixels: &mut [u8], header: &Header) -> Result<(), StegoError> {
    check_room(pixels)?;

    for (i, byte) in header.to_bytes().iter().enumerate() {
        for bit in 0..8 {
            let value = (byte >> (7 - bit)) & 1;
            let p = header_channel(i * 8 + bit);
            pixels[p] = (pixels[p] & 0xFE) | value;
        }
    }

    Ok(())
}

/// Reads the header back from a raw RGBA buffer.
pub fn read_header(pixels: &[u8]) -> Result<Header, StegoError> {
    check_room(pixels)?;

    let mut bytes = [0u8; HEADER_SIZE];
    for (i, byte) in bytes.iter_mut().enumerate() {
        for bit in 0..8 {
            *byte = (*byte << 1) | (pixels[header_channel(i * 8 + bit)] & 1);
        }
    }

    Header::from_bytes(&bytes)
}

fn check_room(pixels: &[u8]) -> Result<(), StegoError> {
    let needed = header_channel(HEADER_BITS - 1) + 1;
    if pixels.len() < needed {
        return Err(StegoError::CarrierTooSmall {
            pixels: pixels.len() / CHANNELS,
            needed: needed.div_ceil(CHANNELS),
        });
    }
    Ok(())
}
