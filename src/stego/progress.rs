//! Progress reporting.
//!
//! Encoding and decoding are synchronous. Long loops hand events to a
//! [`ProgressSink`] every configured chunk so a caller can keep a UI alive.

use std::fmt;
use std::sync::mpsc::Sender;

/// Pipeline stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compressing,
    Encrypting,
    PreparingCanvas { bpc: u8 },
    EmbeddingHeader,
    EmbeddingPayload,
    EncodingPng,
    ReadingHeader,
    UnwrappingKey,
    ExtractingPayload,
    Decrypting,
    Unpacking,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Compressing => write!(f, "Compressing payload"),
            Stage::Encrypting => write!(f, "Encrypting"),
            Stage::PreparingCanvas { bpc } => write!(f, "Preparing canvas ({} bpc)", bpc),
            Stage::EmbeddingHeader => write!(f, "Embedding header"),
            Stage::EmbeddingPayload => write!(f, "Embedding payload"),
            Stage::EncodingPng => write!(f, "Encoding PNG"),
            Stage::ReadingHeader => write!(f, "Reading header"),
            Stage::UnwrappingKey => write!(f, "Unwrapping key"),
            Stage::ExtractingPayload => write!(f, "Extracting payload"),
            Stage::Decrypting => write!(f, "Decrypting"),
            Stage::Unpacking => write!(f, "Unpacking"),
        }
    }
}

/// A single progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A new stage started.
    Stage(Stage),
    /// `done` of `total` payload bytes processed in the current stage.
    Bytes { done: usize, total: usize },
}

/// Receiver of progress events.
pub trait ProgressSink {
    fn report(&mut self, event: ProgressEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _event: ProgressEvent) {}
}

impl<F: FnMut(ProgressEvent)> ProgressSink for F {
    fn report(&mut self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for Sender<ProgressEvent> {
    fn report(&mut self, event: ProgressEvent) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |e: ProgressEvent| seen.push(e);
            sink.report(ProgressEvent::Stage(Stage::Encrypting));
            sink.report(ProgressEvent::Bytes { done: 1, total: 2 });
        }
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ProgressEvent::Stage(Stage::Encrypting));
    }

    #[test]
    fn test_channel_sink() {
        let (mut tx, rx) = mpsc::channel();
        tx.report(ProgressEvent::Stage(Stage::Unpacking));
        assert_eq!(rx.recv().unwrap(), ProgressEvent::Stage(Stage::Unpacking));

        drop(rx);
        // Must not panic once the receiver is gone
        tx.report(ProgressEvent::Stage(Stage::Decrypting));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(
            Stage::PreparingCanvas { bpc: 2 }.to_string(),
            "Preparing canvas (2 bpc)"
        );
    }
}
