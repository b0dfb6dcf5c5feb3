//! Build report: what a bundling run produced.

use std::fmt::Write;

use serde::Serialize;
use sha2::{Digest, Sha256};
use wasmscript_payload::ModuleSummary;
use wasmscript_types::{Diagnostic, EncodingPolicy, SplicePolicy};

/// Summary of one bundle, serializable as JSON for build tooling.
#[derive(Debug, Clone, Serialize)]
pub struct BundleReport {
    /// Where the bundle was written, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    pub splice: SplicePolicy,
    pub encoding: EncodingPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub shims: Vec<String>,
    /// Size of the binary payload.
    pub payload_bytes: usize,
    /// Size of the payload text embedded in the bundle.
    pub encoded_bytes: usize,
    pub bundle_bytes: usize,
    /// Lowercase hex SHA-256 of the bundle.
    pub sha256: String,
    /// Present when the payload is a WebAssembly module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleSummary>,
    /// Tokens and shim imports that were absent and skipped (lenient mode).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    /// Unresolved exports tolerated in lenient mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Diagnostic>,
}

impl BundleReport {
    /// Pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Payload text size relative to the payload, e.g. `1.33`.
    pub fn expansion(&self) -> f64 {
        if self.payload_bytes == 0 {
            return 0.0;
        }
        self.encoded_bytes as f64 / self.payload_bytes as f64
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for b in digest {
        // Writing to a String cannot fail.
        let _ = write!(hex, "{b:02x}");
    }
    hex
}
