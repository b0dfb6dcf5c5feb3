//! Payload error types.

use thiserror::Error;

/// Errors that can occur while encoding, decoding or inspecting a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Encoded text is not valid standard base64.
    #[error("invalid base64 payload text: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The compressor failed.
    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),

    /// The decoded bytes are not a valid gzip stream.
    #[error("decompression failed: {0}")]
    Decompression(#[source] std::io::Error),

    /// The payload was required to be a WebAssembly module and is not.
    #[error("payload is not a WebAssembly module: {0}")]
    NotWasm(String),

    /// Compression level outside 0–9.
    #[error("compression level {0} is out of range (expected 0-9)")]
    InvalidLevel(u32),
}

/// Payload result type alias.
pub type PayloadResult<T> = Result<T, PayloadError>;
