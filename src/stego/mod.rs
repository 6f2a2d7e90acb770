//! LSB steganography over RGBA pixel buffers.
//!
//! - [`header`]: the fixed 273-byte header, written at 1 bit per channel
//! - [`scheduler`]: key-derived jittered placement of payload bits
//! - [`capacity`]: density selection and carrier sizing
//! - [`carrier`]: cover loading, scaling and flattening
//! - [`lsb`]: payload embedding and extraction
//! - [`progress`]: progress reporting for long loops

pub mod capacity;
pub mod carrier;
pub mod header;
pub mod lsb;
pub mod progress;
pub mod scheduler;

use thiserror::Error;

pub use capacity::{plan, CapacityPlan};
pub use carrier::Carrier;
pub use header::{read_header, write_header, Header, HEADER_BITS, HEADER_SIZE};
pub use lsb::{embed, extract};
pub use progress::{NoProgress, ProgressEvent, ProgressSink, Stage};
pub use scheduler::{JitteredStride, Mulberry32, UnitRng};

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// Channels that carry data (R, G, B). Alpha is never written.
pub const COLOR_CHANNELS: usize = 3;

/// Pixels occupied by the header.
pub const HEADER_PIXELS: usize = HEADER_BITS.div_ceil(COLOR_CHANNELS);

/// First pixel of the payload region. One pixel is left untouched after the
/// header.
pub const PAYLOAD_START_PIXEL: usize = HEADER_PIXELS + 1;

/// Smallest supported payload density.
pub const MIN_BPC: u8 = 1;

/// Largest supported payload density.
pub const MAX_BPC: u8 = 3;

/// Errors raised while embedding or extracting.
#[derive(Error, Debug)]
pub enum StegoError {
    #[error("Not enough room: {writes_needed} writes needed, {available_slots} slots available")]
    CapacityExceeded {
        available_slots: usize,
        writes_needed: usize,
    },

    #[error("Carrier too small: {pixels} pixels, need at least {needed}")]
    CarrierTooSmall { pixels: usize, needed: usize },

    #[error("Invalid header size: {0} bytes")]
    InvalidHeaderSize(usize),

    #[error("Unsupported bits per channel: {0}")]
    InvalidDensity(u8),

    #[error("Header declares {header} payload bytes but {payload} were given")]
    LengthMismatch { header: usize, payload: usize },

    #[error("Image load error: {0}")]
    ImageLoadError(String),

    #[error("Image save error: {0}")]
    ImageSaveError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Validates a payload density.
pub fn check_bpc(bpc: u8) -> Result<u8, StegoError> {
    if (MIN_BPC..=MAX_BPC).contains(&bpc) {
        Ok(bpc)
    } else {
        Err(StegoError::InvalidDensity(bpc))
    }
}

/// Number of payload slots (channels) available in a carrier of `pixels`.
pub fn available_slots(pixels: usize) -> usize {
    pixels.saturating_sub(PAYLOAD_START_PIXEL) * COLOR_CHANNELS
}
