//! Payload encoding and decoding.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use wasmscript_types::EncodingPolicy;

use crate::error::{PayloadError, PayloadResult};

/// gzip level used when the configuration does not name one.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 9;

/// Payload text ready to be spliced into a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedPayload {
    /// Standard-alphabet base64 text.
    pub text: String,
    pub policy: EncodingPolicy,
    /// Length of the original binary payload in bytes.
    pub raw_len: usize,
}

impl EncodedPayload {
    /// Encode `bytes` under `policy` at the given gzip level.
    pub fn new(bytes: &[u8], policy: EncodingPolicy, level: u32) -> PayloadResult<Self> {
        Ok(Self {
            text: encode_with_level(bytes, policy, level)?,
            policy,
            raw_len: bytes.len(),
        })
    }

    /// The payload as a double-quoted JavaScript string literal.
    ///
    /// Base64 text contains no quotes or backslashes, so no escaping is needed.
    pub fn literal(&self) -> String {
        format!("\"{}\"", self.text)
    }

    /// Decode back to the original bytes.
    pub fn decode(&self) -> PayloadResult<Vec<u8>> {
        decode(&self.text, self.policy)
    }
}

/// Encode `bytes` as text under `policy`, compressing at the default level.
pub fn encode(bytes: &[u8], policy: EncodingPolicy) -> PayloadResult<String> {
    encode_with_level(bytes, policy, DEFAULT_COMPRESSION_LEVEL)
}

/// Encode `bytes` as text under `policy`.
///
/// `level` is the gzip level (0–9) and is ignored for [`EncodingPolicy::Plain`].
pub fn encode_with_level(bytes: &[u8], policy: EncodingPolicy, level: u32) -> PayloadResult<String> {
    match policy {
        EncodingPolicy::Plain => Ok(STANDARD.encode(bytes)),
        EncodingPolicy::Compressed => {
            let compressed = gzip(bytes, level)?;
            Ok(STANDARD.encode(compressed))
        }
    }
}

/// Decode text produced by [`encode`] under the same `policy`.
pub fn decode(text: &str, policy: EncodingPolicy) -> PayloadResult<Vec<u8>> {
    let bytes = STANDARD.decode(text)?;
    match policy {
        EncodingPolicy::Plain => Ok(bytes),
        EncodingPolicy::Compressed => gunzip(&bytes),
    }
}

/// gzip with a fixed header (no file name, mtime 0) so output is reproducible.
fn gzip(bytes: &[u8], level: u32) -> PayloadResult<Vec<u8>> {
    if level > 9 {
        return Err(PayloadError::InvalidLevel(level));
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(bytes).map_err(PayloadError::Compression)?;
    encoder.finish().map_err(PayloadError::Compression)
}

fn gunzip(bytes: &[u8]) -> PayloadResult<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(PayloadError::Decompression)?;
    Ok(out)
}
