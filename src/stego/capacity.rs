//! Density selection and carrier sizing.
//!
//! The planner picks the lowest bits-per-channel density that keeps the
//! carrier within the pixel budget, and grows the carrier (keeping its aspect
//! ratio, with a 10% area margin) when the cover is too small.

use log::debug;

use super::{
    available_slots, check_bpc, StegoError, COLOR_CHANNELS, MAX_BPC, MIN_BPC, PAYLOAD_START_PIXEL,
};

/// Area margin applied when a cover has to grow.
const GROWTH_MARGIN: f64 = 1.1;

/// Outcome of capacity planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPlan {
    /// Payload density in bits per channel.
    pub bpc: u8,
    /// Carrier width in pixels.
    pub width: u32,
    /// Carrier height in pixels.
    pub height: u32,
    /// True when the carrier differs in size from the cover.
    pub resized: bool,
    /// Minimum number of pixels the payload needs at `bpc`.
    pub required_pixels: u64,
}

impl CapacityPlan {
    /// Total pixels of the planned carrier.
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Number of writes needed to store `payload_len` bytes at `bpc`.
pub fn writes_needed(payload_len: usize, bpc: u8) -> usize {
    (payload_len * 8).div_ceil(usize::from(bpc))
}

/// Minimum carrier pixels for `payload_len` bytes at `bpc`, header included.
pub fn required_pixels(payload_len: usize, bpc: u8) -> u64 {
    let payload_pixels = writes_needed(payload_len, bpc).div_ceil(COLOR_CHANNELS);
    (PAYLOAD_START_PIXEL + payload_pixels) as u64
}

/// Plans density and carrier size for a ciphertext of `payload_len` bytes.
///
/// `forced_bpc` skips the density search. Fails when the payload does not fit
/// even at the chosen density in the larger of the budget and the cover.
pub fn plan(
    payload_len: usize,
    cover_width: u32,
    cover_height: u32,
    max_pixels: u64,
    forced_bpc: Option<u8>,
) -> Result<CapacityPlan, StegoError> {
    if cover_width == 0 || cover_height == 0 {
        return Err(StegoError::CarrierTooSmall {
            pixels: 0,
            needed: PAYLOAD_START_PIXEL,
        });
    }

    let bpc = match forced_bpc {
        Some(bpc) => check_bpc(bpc)?,
        None => (MIN_BPC..=MAX_BPC)
            .find(|&bpc| required_pixels(payload_len, bpc) <= max_pixels)
            .unwrap_or(MAX_BPC),
    };

    let required = required_pixels(payload_len, bpc);
    let cover_pixels = u64::from(cover_width) * u64::from(cover_height);
    let ceiling = max_pixels.max(cover_pixels);

    if required > ceiling {
        return Err(StegoError::CapacityExceeded {
            available_slots: available_slots(ceiling as usize),
            writes_needed: writes_needed(payload_len, bpc),
        });
    }

    let (width, height, resized) = if cover_pixels < required {
        let (w, h) = grow(cover_width, cover_height, required);
        (w, h, true)
    } else {
        (cover_width, cover_height, false)
    };

    debug!(
        "Capacity plan: {} bytes at {} bpc, {} pixels required, carrier {}x{}{}",
        payload_len,
        bpc,
        required,
        width,
        height,
        if resized { " (resized)" } else { "" }
    );

    Ok(CapacityPlan {
        bpc,
        width,
        height,
        resized,
        required_pixels: required,
    })
}

/// New dimensions with the cover's aspect ratio and at least `required`
/// pixels plus the growth margin.
fn grow(width: u32, height: u32, required: u64) -> (u32, u32) {
    let ratio = f64::from(width) / f64::from(height);
    let area = required as f64 * GROWTH_MARGIN;

    let w = (area * ratio).sqrt().ceil().max(1.0);
    let h = (area / w).ceil().max(1.0);

    (w as u32, h as u32)
}
