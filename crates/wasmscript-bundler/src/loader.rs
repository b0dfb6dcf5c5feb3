//! Artifact and asset loading.

use std::path::Path;

use tracing::debug;
use wasmscript_payload::{inspect, require_module, ModuleSummary};

use crate::assets::AssetProvider;
use crate::error::{BundleError, BundleResult};

/// Read the binary payload at `path`.
pub fn load_artifact(path: &Path) -> BundleResult<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| BundleError::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "loaded artifact");
    Ok(bytes)
}

/// Fetch one shim or template by logical name.
pub fn load_asset(assets: &dyn AssetProvider, name: &str) -> BundleResult<String> {
    let text = assets.fetch(name)?;
    debug!(asset = name, bytes = text.len(), "loaded asset");
    Ok(text)
}

/// Summarize the payload if it is a module.
///
/// With `require_wasm` anything else is an error; otherwise the payload stays
/// opaque and `None` is returned.
pub fn inspect_payload(bytes: &[u8], require_wasm: bool) -> BundleResult<Option<ModuleSummary>> {
    let summary = if require_wasm {
        Some(require_module(bytes)?)
    } else {
        inspect(bytes)
    };
    match &summary {
        Some(module) => debug!(
            version = module.version,
            sections = module.section_count,
            imports = ?module.import_modules,
            exports = ?module.exports,
            "payload is a WebAssembly module"
        ),
        None => debug!("payload is not a WebAssembly module, embedding as opaque bytes"),
    }
    Ok(summary)
}
