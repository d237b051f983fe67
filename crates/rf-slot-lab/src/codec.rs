//! Compact text encoding for reel bytes (gzip, then standard base64)

use std::io::{Read, Write};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};

use rf_core::{RfError, RfResult};

/// Compress `bytes` with gzip and base64-encode the result
pub fn encode_gzip_base64(bytes: &[u8]) -> RfResult<String> {
    let mut encoder = GzEncoder::new(
        Vec::with_capacity(bytes.len() / 4 + 32),
        Compression::default(),
    );
    encoder
        .write_all(bytes)
        .map_err(|e| RfError::Codec(format!("gzip write failed: {e}")))?;
    let compressed = encoder
        .finish()
        .map_err(|e| RfError::Codec(format!("gzip finish failed: {e}")))?;
    Ok(STANDARD.encode(compressed))
}

/// Reverse [`encode_gzip_base64`]
///
/// Surrounding whitespace is ignored. Bad base64 or a payload that is not a
/// complete gzip stream is a [`RfError::Codec`].
pub fn decode_gzip_base64(encoded: &str) -> RfResult<Vec<u8>> {
    let compressed = STANDARD
        .decode(encoded.trim())
        .map_err(|e| RfError::Codec(format!("invalid base64: {e}")))?;
    if compressed.is_empty() {
        return Err(RfError::Codec("empty payload".into()));
    }

    let mut bytes = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut bytes)
        .map_err(|e| RfError::Codec(format!("invalid gzip stream: {e}")))?;
    Ok(bytes)
}
