//! Shared types for wasmscript.
//!
//! This crate defines the source spans, diagnostics, and bundling policy
//! enums shared by the tokenizer, the payload encoder, and the bundler.

mod error;
mod policy;
mod span;

pub use error::{
    Diagnostic, DiagnosticCategory, Diagnostics, ErrorCode, Severity, MAX_DIAGNOSTICS,
};
pub use policy::{EncodingPolicy, MissingTokenMode, ParsePolicyError, SplicePolicy};
pub use span::{SourceFile, Span};
