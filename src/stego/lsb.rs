//! Variable-density LSB embedding and extraction.
//!
//! The header goes first at 1 bit per channel (see [`super::header`]). The
//! payload follows from [`PAYLOAD_START_PIXEL`] on, `bpc` bits per write, at
//! the slots chosen by a [`JitteredStride`] schedule. A slot is one R, G or B
//! channel; slot `s` lives in pixel `PAYLOAD_START_PIXEL + s / 3`, channel
//! `s % 3`. Bits are taken MSB-first; a trailing partial group is padded with
//! zeros on the low side.

use log::debug;

use super::capacity::writes_needed;
use super::header::{write_header, Header};
use super::progress::{ProgressEvent, ProgressSink, Stage};
use super::scheduler::JitteredStride;
use super::{
    available_slots, check_bpc, Carrier, StegoError, CHANNELS, COLOR_CHANNELS, PAYLOAD_START_PIXEL,
};

/// Byte offset in the RGBA buffer of payload slot `slot`.
fn slot_offset(slot: usize) -> usize {
    (PAYLOAD_START_PIXEL + slot / COLOR_CHANNELS) * CHANNELS + slot % COLOR_CHANNELS
}

/// Splits a byte slice into `bpc`-bit groups, MSB-first.
struct BitGroups<'a> {
    data: &'a [u8],
    bpc: usize,
    pos: usize,
}

impl<'a> BitGroups<'a> {
    fn new(data: &'a [u8], bpc: u8) -> Self {
        Self {
            data,
            bpc: usize::from(bpc),
            pos: 0,
        }
    }
}

impl Iterator for BitGroups<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let total = self.data.len() * 8;
        if self.pos >= total {
            return None;
        }

        let mut group = 0u8;
        for bit in self.pos..self.pos + self.bpc {
            let value = if bit < total {
                (self.data[bit / 8] >> (7 - bit % 8)) & 1
            } else {
                0
            };
            group = (group << 1) | value;
        }
        self.pos += self.bpc;

        Some(group)
    }
}

/// Emits a byte-progress event each time another `chunk` bytes are done.
struct ChunkReporter<'a> {
    sink: &'a mut dyn ProgressSink,
    chunk: usize,
    total: usize,
    next_mark: usize,
}

impl<'a> ChunkReporter<'a> {
    fn new(sink: &'a mut dyn ProgressSink, chunk: usize, total: usize) -> Self {
        let chunk = chunk.max(1);
        Self {
            sink,
            chunk,
            total,
            next_mark: chunk,
        }
    }

    fn advance(&mut self, done: usize) {
        if done >= self.next_mark && done < self.total {
            self.sink.report(ProgressEvent::Bytes {
                done,
                total: self.total,
            });
            self.next_mark = (done / self.chunk + 1) * self.chunk;
        }
    }

    fn finish(&mut self) {
        self.sink.report(ProgressEvent::Bytes {
            done: self.total,
            total: self.total,
        });
    }
}

/// Writes `header` and `payload` into `carrier`.
///
/// `payload` must be exactly `header.payload_len` bytes. Capacity is checked
/// before the first pixel is touched, so on error the carrier is unchanged.
pub fn embed(
    carrier: &mut Carrier,
    header: &Header,
    payload: &[u8],
    seed: u32,
    yield_chunk: usize,
    progress: &mut dyn ProgressSink,
) -> Result<(), StegoError> {
    let bpc = check_bpc(header.bpc)?;
    if payload.len() != header.payload_len as usize {
        return Err(StegoError::LengthMismatch {
            header: header.payload_len as usize,
            payload: payload.len(),
        });
    }

    let slots = available_slots(carrier.pixel_count());
    let writes = writes_needed(payload.len(), bpc);
    let schedule = JitteredStride::from_seed(seed, slots, writes)?;

    debug!(
        "Embedding {} bytes: {} writes over {} slots, step {}",
        payload.len(),
        writes,
        slots,
        schedule.step()
    );

    progress.report(ProgressEvent::Stage(Stage::EmbeddingHeader));
    write_header(carrier.pixels_mut(), header)?;

    progress.report(ProgressEvent::Stage(Stage::EmbeddingPayload));
    let mask = 0xFFu8 ^ ((1u8 << bpc) - 1);
    let pixels = carrier.pixels_mut();
    let mut reporter = ChunkReporter::new(progress, yield_chunk, payload.len());

    for (n, (slot, group)) in schedule.zip(BitGroups::new(payload, bpc)).enumerate() {
        let p = slot_offset(slot);
        pixels[p] = (pixels[p] & mask) | group;
        reporter.advance((n + 1) * usize::from(bpc) / 8);
    }
    reporter.finish();

    Ok(())
}

/// Reads the payload described by `header` out of `carrier`.
///
/// Fails with [`StegoError::InvalidDensity`] or
/// [`StegoError::CapacityExceeded`] when the header describes a layout the
/// carrier cannot hold.
pub fn extract(
    carrier: &Carrier,
    header: &Header,
    seed: u32,
    yield_chunk: usize,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<u8>, StegoError> {
    let bpc = check_bpc(header.bpc)?;
    let len = header.payload_len as usize;

    let slots = available_slots(carrier.pixel_count());
    let writes = writes_needed(len, bpc);
    let schedule = JitteredStride::from_seed(seed, slots, writes)?;

    debug!(
        "Extracting {} bytes: {} reads over {} slots, step {}",
        len,
        writes,
        slots,
        schedule.step()
    );

    progress.report(ProgressEvent::Stage(Stage::ExtractingPayload));
    let pixels = carrier.pixels();
    let value_mask = (1u8 << bpc) - 1;
    let mut reporter = ChunkReporter::new(progress, yield_chunk, len);

    let mut out = Vec::with_capacity(len);
    let mut buffer = 0u8;
    let mut buffered = 0usize;

    'reads: for slot in schedule {
        let group = pixels[slot_offset(slot)] & value_mask;
        for i in (0..bpc).rev() {
            buffer = (buffer << 1) | ((group >> i) & 1);
            buffered += 1;
            if buffered == 8 {
                out.push(buffer);
                buffer = 0;
                buffered = 0;
                reporter.advance(out.len());
                if out.len() == len {
                    break 'reads;
                }
            }
        }
    }
    reporter.finish();

    Ok(out)
}
