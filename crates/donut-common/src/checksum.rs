//! Checksum and digest utilities for donut
//!
//! Shards are verified with crc32c; whole objects carry a streaming MD5
//! digest for S3 ETag compatibility. The expected digest supplied by a
//! client arrives base64-encoded (the `Content-MD5` header form) and is
//! normalized here to lowercase hex.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{Error, Result};

/// Quick crc32c computation
#[inline]
#[must_use]
pub fn compute_crc32c(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// Quick crc32c verification
#[inline]
#[must_use]
pub fn verify_crc32c(data: &[u8], expected: u32) -> bool {
    crc32c::crc32c(data) == expected
}

/// Streaming MD5 digest over an object payload
pub struct Md5Digest {
    context: md5::Context,
}

impl Md5Digest {
    /// Create a new digest calculator
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: md5::Context::new(),
        }
    }

    /// Feed more payload bytes into the digest
    pub fn update(&mut self, data: &[u8]) {
        self.context.consume(data);
    }

    /// Finalize and return the digest as lowercase hex
    #[must_use]
    pub fn finalize_hex(self) -> String {
        hex_encode(&self.context.compute().0)
    }
}

impl Default for Md5Digest {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a client-supplied expected MD5.
///
/// The value arrives base64-encoded; blank input disables the check and
/// yields `None`. Anything that fails to decode, or that does not
/// decode to a 16-byte digest, is rejected before any I/O happens.
pub fn expected_md5_to_hex(expected: &str) -> Result<Option<String>> {
    let trimmed = expected.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let raw = BASE64
        .decode(trimmed)
        .map_err(|e| Error::invalid_argument(format!("invalid expected md5: {e}")))?;
    if raw.len() != 16 {
        return Err(Error::invalid_argument(format!(
            "invalid expected md5 length: {}",
            raw.len()
        )));
    }
    Ok(Some(hex_encode(&raw)))
}

/// Hex encode bytes (lowercase)
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";
    let mut result = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        result.push(HEX_CHARS[(byte >> 4) as usize] as char);
        result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
    }
    result
}
