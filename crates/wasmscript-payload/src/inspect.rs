//! Read-only inspection of the binary payload.
//!
//! The bundler treats the payload as opaque bytes. Inspection only adds
//! information for logs and the build report; [`require_module`] is used when
//! the configuration asks for a hard check.

use serde::Serialize;
use wasmparser::{Encoding, Parser, Payload};

use crate::error::{PayloadError, PayloadResult};

const WASM_MAGIC: &[u8; 4] = b"\0asm";

/// What a payload module looks like from the outside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    /// Binary format version from the header.
    pub version: u16,
    /// Number of sections, custom sections included.
    pub section_count: usize,
    /// Distinct import module names, in first-seen order (`gojs`, `env`, ...).
    pub import_modules: Vec<String>,
    pub exports: Vec<String>,
    pub custom_sections: Vec<String>,
}

/// Summarize `bytes` if they form a well-formed WebAssembly module.
///
/// Returns `None` for anything else, including an empty payload.
pub fn inspect(bytes: &[u8]) -> Option<ModuleSummary> {
    summarize(bytes).ok()
}

/// Like [`inspect`], but explains why the payload is not a module.
pub fn require_module(bytes: &[u8]) -> PayloadResult<ModuleSummary> {
    summarize(bytes)
}

fn summarize(bytes: &[u8]) -> PayloadResult<ModuleSummary> {
    if bytes.len() < 8 || &bytes[..4] != WASM_MAGIC {
        return Err(PayloadError::NotWasm(
            "missing \\0asm magic header".to_string(),
        ));
    }

    let mut summary = ModuleSummary::default();
    for payload in Parser::new(0).parse_all(bytes) {
        let payload = payload.map_err(|e| PayloadError::NotWasm(e.to_string()))?;

        if payload.as_section().is_some() {
            summary.section_count += 1;
        }

        match payload {
            Payload::Version { num, encoding, .. } => {
                if encoding != Encoding::Module {
                    return Err(PayloadError::NotWasm(
                        "component binaries are not supported".to_string(),
                    ));
                }
                summary.version = num;
            }
            Payload::ImportSection(reader) => {
                for import in reader {
                    let import = import.map_err(|e| PayloadError::NotWasm(e.to_string()))?;
                    if !summary.import_modules.iter().any(|m| m == import.module) {
                        summary.import_modules.push(import.module.to_string());
                    }
                }
            }
            Payload::ExportSection(reader) => {
                for export in reader {
                    let export = export.map_err(|e| PayloadError::NotWasm(e.to_string()))?;
                    summary.exports.push(export.name.to_string());
                }
            }
            Payload::CustomSection(reader) => {
                summary.custom_sections.push(reader.name().to_string());
            }
            _ => {}
        }
    }

    Ok(summary)
}
