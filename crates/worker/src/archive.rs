//! Archive codec: gzip, then standard base64 so archives stay text-safe.
//!
//! Both directions are CPU-bound; async callers should run them on the
//! blocking pool.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("gzip failed: {0}")]
    Gzip(#[from] std::io::Error),

    #[error("Archive is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Archive does not contain UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Compress `text` into an archive body.
pub fn compress(text: &str) -> Result<String, ArchiveError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let gzipped = encoder.finish()?;
    Ok(STANDARD.encode(gzipped))
}

/// Restore the exact text an archive body was created from.
pub fn decompress(encoded: &str) -> Result<String, ArchiveError> {
    let gzipped = STANDARD.decode(encoded.trim())?;
    let mut decoder = GzDecoder::new(gzipped.as_slice());
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}
