//! Single-entry ZIP container for the hidden payload.
//!
//! The payload is stored as one DEFLATE entry at maximum compression, so the
//! decrypted blob can also be opened with any ordinary unzip tool. Text
//! messages use the [`TEXT_ENTRY_NAME`] sentinel.

use std::io::{Cursor, Read, Write};

use thiserror::Error;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entry name marking the payload as a text message.
pub const TEXT_ENTRY_NAME: &str = "message.txt";

/// Maximum DEFLATE level.
const DEFLATE_LEVEL: i32 = 9;

/// Upper bound of the DEFLATE expansion ratio.
const MAX_INFLATE_RATIO: u64 = 1032;

/// Archive errors.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Archive creation failed: {0}")]
    PackFailed(String),

    #[error("Archive is corrupt: {0}")]
    Corrupt(String),

    #[error("Archive contains no entries")]
    Empty,
}

impl From<ZipError> for ArchiveError {
    fn from(e: ZipError) -> Self {
        ArchiveError::Corrupt(e.to_string())
    }
}

/// The single logical entry of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name (original file name, or [`TEXT_ENTRY_NAME`]).
    pub name: String,
    /// Uncompressed entry content.
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    /// True when the entry carries a text message.
    pub fn is_text(&self) -> bool {
        self.name == TEXT_ENTRY_NAME
    }
}

/// Packs `bytes` as the only entry of a new ZIP archive.
pub fn pack(name: &str, bytes: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(DEFLATE_LEVEL));

    writer
        .start_file(name, options)
        .map_err(|e| ArchiveError::PackFailed(e.to_string()))?;
    writer
        .write_all(bytes)
        .map_err(|e| ArchiveError::PackFailed(e.to_string()))?;

    let cursor = writer
        .finish()
        .map_err(|e| ArchiveError::PackFailed(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Unpacks the first entry. Any further entries are ignored.
pub fn unpack(data: &[u8]) -> Result<ArchiveEntry, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    if archive.len() == 0 {
        return Err(ArchiveError::Empty);
    }

    let mut file = archive.by_index(0)?;
    let name = file.name().to_string();

    let declared = file.size();

    // The declared size is untrusted; cap the preallocation by what the
    // archive could possibly inflate to.
    let hint = declared.min(data.len() as u64 * MAX_INFLATE_RATIO);
    let mut bytes = Vec::with_capacity(usize::try_from(hint).unwrap_or(0));
    file.read_to_end(&mut bytes)
        .map_err(|e| ArchiveError::Corrupt(e.to_string()))?;

    if bytes.len() as u64 != declared {
        return Err(ArchiveError::Corrupt(format!(
            "entry declares {} bytes but holds {}",
            declared,
            bytes.len()
        )));
    }

    Ok(ArchiveEntry { name, bytes })
}
