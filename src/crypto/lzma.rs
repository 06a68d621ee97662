//! LZMA (xz) compression and extraction.

use std::io::Read;

use xz2::read::{XzDecoder, XzEncoder};

use crate::error::{Error, Result};

pub const PRESET: u32 = 9;

/// Compress bytes at the given xz preset.
///
/// # Errors
///
/// Errors if the encoder fails mid-stream.
pub fn compress(data: &[u8], preset: u32) -> Result<Vec<u8>> {
    let mut compressed = Vec::new();
    XzEncoder::new(data, preset)
        .read_to_end(&mut compressed)
        .map_err(|reason| Error::Io(reason.to_string()))?;
    Ok(compressed)
}

/// Extract an xz stream.
///
/// # Errors
///
/// Errors with an opaque integrity failure if the stream is not valid
/// xz.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut extracted = Vec::new();
    XzDecoder::new(data)
        .read_to_end(&mut extracted)
        .map_err(|_| Error::Integrity)?;
    Ok(extracted)
}
