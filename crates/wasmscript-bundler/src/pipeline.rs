//! The bundling pipeline.
//!
//! ```text
//! artifact → load → inspect → encode ─┐
//! assets ──→ fetch → normalize ───────┴→ splice → write
//! ```
//!
//! Every read happens before any processing, and the write happens only after
//! everything else succeeded.

use std::path::Path;

use tracing::{debug, info, warn};
use wasmscript_payload::EncodedPayload;
use wasmscript_types::{Diagnostic, MissingTokenMode, SplicePolicy};

use crate::assets::AssetProvider;
use crate::config::BundleConfig;
use crate::error::{BundleError, BundleResult, ConfigError, SpliceError};
use crate::loader::{inspect_payload, load_artifact, load_asset};
use crate::normalize::normalize;
use crate::report::{sha256_hex, BundleReport};
use crate::splice::{inject_shims, prelude, static_imports, substitute_token, Shim};
use crate::writer::write_bundle;

/// A bundle held in memory.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub text: String,
    pub report: BundleReport,
}

/// Bundle the artifact at `path` and replace it with the script.
///
/// # Errors
///
/// Any [`BundleError`]. On error the artifact is left as it was.
pub fn bundle_file(
    path: &Path,
    config: &BundleConfig,
    assets: &dyn AssetProvider,
) -> BundleResult<BundleReport> {
    config.validate()?;
    info!(
        artifact = %path.display(),
        splice = %config.splice,
        encoding = %config.encoding(),
        "bundling"
    );

    let payload = load_artifact(path)?;
    let Bundle { text, mut report } = bundle(&payload, config, assets)?;
    write_bundle(path, text.as_bytes())?;

    report.artifact = Some(path.display().to_string());
    info!(
        artifact = %path.display(),
        payload_bytes = report.payload_bytes,
        bundle_bytes = report.bundle_bytes,
        sha256 = %report.sha256,
        "bundle written"
    );
    Ok(report)
}

/// Bundle `payload` in memory.
///
/// # Errors
///
/// Any [`BundleError`] except [`BundleError::Io`].
pub fn bundle(
    payload: &[u8],
    config: &BundleConfig,
    assets: &dyn AssetProvider,
) -> BundleResult<Bundle> {
    config.validate()?;
    let mode = config.missing_token;
    let encoding = config.encoding();
    let module = inspect_payload(payload, config.require_wasm)?;

    // ── Fetch ────────────────────────────────────────────────────────────
    let template = match config.template() {
        Some(name) if config.splice.uses_template() => {
            let text = load_asset(assets, &name)?;
            Some((name, text))
        }
        _ => None,
    };
    let shim_names = config.shims();
    let sources = shim_names
        .iter()
        .map(|name| load_asset(assets, name).map(|text| (name.as_str(), text)))
        .collect::<BundleResult<Vec<_>>>()?;

    // ── Encode & normalize ───────────────────────────────────────────────
    let encoded = EncodedPayload::new(payload, encoding, config.compression_level)?;
    debug!(
        payload_bytes = encoded.raw_len,
        encoded_bytes = encoded.text.len(),
        %encoding,
        "encoded payload"
    );

    // Shims and template alike must end up free of module syntax.
    let mut warnings = Vec::new();
    let mut shims = Vec::with_capacity(sources.len());
    for (name, source) in sources {
        let text = normalize_asset(name, &source, mode, &mut warnings)?;
        let imports = static_imports(name, &text)?;
        tolerate(imports, mode, &mut warnings, |imports| SpliceError::UnresolvedImports {
            asset: name.to_string(),
            imports,
        })?;
        shims.push(Shim::new(name, text));
    }
    let template = match template {
        Some((name, text)) => {
            let text = normalize_asset(&name, &text, mode, &mut warnings)?;
            Some((name, text))
        }
        None => None,
    };

    // ── Splice ───────────────────────────────────────────────────────────
    let mut skipped = Vec::new();
    let text = match config.splice {
        SplicePolicy::TemplatedImport => {
            let (name, template) = require_template(config, template)?;
            let literal = encoded.literal();
            let substituted =
                substitute_token(&name, &template, &config.payload_token, &literal, mode)?;
            if substituted.is_skipped() {
                skipped.push(config.payload_token.clone());
            }
            let injected = inject_shims(&name, &substituted.into_text(), &shims, mode)?;
            skipped.extend(injected.skipped);
            tolerate(injected.unresolved, mode, &mut warnings, |imports| {
                SpliceError::UnresolvedImports {
                    asset: name.clone(),
                    imports,
                }
            })?;
            injected.text
        }
        SplicePolicy::TokenConstant => {
            let (name, template) = require_template(config, template)?;
            let imports = static_imports(&name, &template)?;
            tolerate(imports, mode, &mut warnings, |imports| SpliceError::UnresolvedImports {
                asset: name.clone(),
                imports,
            })?;
            let substituted =
                substitute_token(&name, &template, &config.payload_token, &encoded.text, mode)?;
            if substituted.is_skipped() {
                skipped.push(config.payload_token.clone());
            }
            substituted.into_text()
        }
        SplicePolicy::Prelude => prelude(&config.prelude_constant, &encoded.literal(), &shims),
    };

    let report = BundleReport {
        artifact: None,
        splice: config.splice,
        encoding,
        template: config
            .splice
            .uses_template()
            .then(|| config.template())
            .flatten(),
        shims: shim_names,
        payload_bytes: payload.len(),
        encoded_bytes: encoded.text.len(),
        bundle_bytes: text.len(),
        sha256: sha256_hex(text.as_bytes()),
        module,
        skipped,
        warnings,
    };
    debug!(
        bundle_bytes = report.bundle_bytes,
        expansion = report.expansion(),
        "spliced bundle"
    );

    Ok(Bundle { text, report })
}

fn require_template(
    config: &BundleConfig,
    template: Option<(String, String)>,
) -> BundleResult<(String, String)> {
    template.ok_or_else(|| {
        ConfigError::Invalid(format!("{} needs a template", config.splice)).into()
    })
}

/// Rewrite the exports of one asset, applying `mode` to what is left.
fn normalize_asset(
    name: &str,
    source: &str,
    mode: MissingTokenMode,
    warnings: &mut Vec<Diagnostic>,
) -> BundleResult<String> {
    let normalized = normalize(name, source).map_err(BundleError::Normalize)?;
    tolerate(normalized.unresolved, mode, warnings, |exports| {
        SpliceError::UnresolvedExports {
            asset: name.to_string(),
            exports,
        }
    })?;
    Ok(normalized.text)
}

/// Module syntax left in the bundle: fatal in strict mode, warnings otherwise.
fn tolerate(
    unresolved: Vec<Diagnostic>,
    mode: MissingTokenMode,
    warnings: &mut Vec<Diagnostic>,
    error: impl FnOnce(Vec<Diagnostic>) -> SpliceError,
) -> BundleResult<()> {
    if unresolved.is_empty() {
        return Ok(());
    }
    match mode {
        MissingTokenMode::Error => Err(error(unresolved).into()),
        MissingTokenMode::Ignore => {
            for diagnostic in &unresolved {
                warn!("{diagnostic}");
            }
            warnings.extend(unresolved);
            Ok(())
        }
    }
}
