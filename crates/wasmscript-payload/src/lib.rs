//! wasmscript payload codec.
//!
//! Turns the compiled binary payload into text that can sit inside a
//! JavaScript string literal, and back:
//!
//! ```text
//! Plain:       bytes → base64
//! Compressed:  bytes → gzip → base64
//! ```
//!
//! `decode(encode(b, p), p) == b` holds for every byte sequence `b` and
//! every [`EncodingPolicy`]. Encoded text only uses the standard base64
//! alphabet, so it never needs escaping inside a quoted literal.
//!
//! [`inspect`] reads module metadata for logging and reports without ever
//! rejecting a payload; [`require_module`] is the strict variant.

pub mod encode;
pub mod error;
pub mod inspect;

pub use encode::{decode, encode, encode_with_level, EncodedPayload, DEFAULT_COMPRESSION_LEVEL};
pub use error::{PayloadError, PayloadResult};
pub use inspect::{inspect, require_module, ModuleSummary};
pub use wasmscript_types::EncodingPolicy;
