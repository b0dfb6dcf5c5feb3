//! `wasmscript`: replace a WebAssembly artifact with a self-contained script.
//!
//! ```text
//! wasmscript main.wasm --asset-root "$(go env GOROOT)/lib/wasm"
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wasmscript_bundler::{bundle_file, BundleConfig, DirAssets, EmbeddedAssets, LayeredAssets};
use wasmscript_types::{EncodingPolicy, MissingTokenMode, SplicePolicy};

/// Bundle a WebAssembly artifact and its runtime glue into one plain script.
///
/// The artifact is replaced in place.
#[derive(Debug, Parser)]
#[command(name = "wasmscript")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// WebAssembly artifact to bundle (overwritten with the script)
    artifact: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Splice policy: templated-import, token-constant or prelude
    #[arg(long)]
    policy: Option<SplicePolicy>,

    /// Payload encoding: plain or compressed
    #[arg(long)]
    encoding: Option<EncodingPolicy>,

    /// Directory holding the runtime shims (searched before the built-in assets)
    #[arg(long, env = "WASMSCRIPT_ASSET_ROOT")]
    asset_root: Option<PathBuf>,

    /// Shim asset name, in splice order (repeatable)
    #[arg(long = "shim", value_name = "NAME")]
    shims: Vec<String>,

    /// Template asset name
    #[arg(long, value_name = "NAME")]
    template: Option<String>,

    /// Placeholder text replaced by the payload
    #[arg(long, value_name = "TOKEN")]
    payload_token: Option<String>,

    /// Name of the payload constant (prelude policy)
    #[arg(long, value_name = "NAME")]
    prelude_constant: Option<String>,

    /// gzip level for the compressed encoding (0-9)
    #[arg(long, value_name = "LEVEL")]
    compression_level: Option<u32>,

    /// Skip absent tokens and tolerate unresolved exports
    #[arg(long)]
    lenient: bool,

    /// Fail unless the artifact is a WebAssembly module
    #[arg(long)]
    require_wasm: bool,

    /// Write the build report as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,wasmscript=debug"
    } else {
        "warn,wasmscript=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let assets = assets(cli.asset_root.as_deref());

    let report = bundle_file(&cli.artifact, &config, &assets)
        .with_context(|| format!("failed to bundle {}", cli.artifact.display()))?;

    for skipped in &report.skipped {
        warn!(%skipped, "absent from the template, skipped");
    }

    if let Some(path) = &cli.report {
        let json = report.to_json().context("failed to serialize the build report")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!(report = %path.display(), "report written");
    }
    Ok(())
}

/// Configuration file (or defaults), then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<BundleConfig> {
    let mut config = match &cli.config {
        Some(path) => BundleConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BundleConfig::default(),
    };

    if let Some(policy) = cli.policy {
        if policy != config.splice {
            // Policy-specific choices from the file do not carry over.
            config = BundleConfig {
                splice: policy,
                encoding: None,
                shims: None,
                template: None,
                ..config
            };
        }
    }
    if let Some(encoding) = cli.encoding {
        config.encoding = Some(encoding);
    }
    if !cli.shims.is_empty() {
        config.shims = Some(cli.shims.clone());
    }
    if let Some(template) = &cli.template {
        config.template = Some(template.clone());
    }
    if let Some(token) = &cli.payload_token {
        config.payload_token = token.clone();
    }
    if let Some(constant) = &cli.prelude_constant {
        config.prelude_constant = constant.clone();
    }
    if let Some(level) = cli.compression_level {
        config.compression_level = level;
    }
    if cli.lenient {
        config.missing_token = MissingTokenMode::Ignore;
    }
    if cli.require_wasm {
        config.require_wasm = true;
    }

    config.validate()?;
    Ok(config)
}

/// The asset root if given, then the built-in templates.
fn assets(root: Option<&Path>) -> LayeredAssets {
    let layered = LayeredAssets::new();
    let layered = match root {
        Some(root) => layered.layer(DirAssets::new(root)),
        None => layered,
    };
    layered.layer(EmbeddedAssets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("wasmscript").chain(args.iter().copied()))
            .unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_without_flags() {
        let cli = parse(&["main.wasm"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config, BundleConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "main.wasm",
            "--policy",
            "prelude",
            "--encoding",
            "compressed",
            "--shim",
            "wasm_exec.js",
            "--shim",
            "start.js",
            "--prelude-constant",
            "BIN",
            "--compression-level",
            "1",
            "--lenient",
            "--require-wasm",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.splice, SplicePolicy::Prelude);
        assert_eq!(config.encoding(), EncodingPolicy::Compressed);
        assert_eq!(config.shims(), vec!["wasm_exec.js", "start.js"]);
        assert_eq!(config.prelude_constant, "BIN");
        assert_eq!(config.compression_level, 1);
        assert_eq!(config.missing_token, MissingTokenMode::Ignore);
        assert!(config.require_wasm);
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wasmscript.toml");
        std::fs::write(
            &path,
            "splice = \"templated-import\"\ntemplate = \"custom.js\"\npayload_token = \"@@P@@\"\n",
        )
        .unwrap();
        let config_arg = path.to_str().unwrap();

        let cli = parse(&["main.wasm", "--config", config_arg]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.template.as_deref(), Some("custom.js"));
        assert_eq!(config.payload_token, "@@P@@");

        // Switching policy drops the file's template but keeps the token.
        let cli = parse(&["main.wasm", "--config", config_arg, "--policy", "prelude"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.splice, SplicePolicy::Prelude);
        assert_eq!(config.template, None);
        assert_eq!(config.payload_token, "@@P@@");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = Cli::try_parse_from(["wasmscript", "main.wasm", "--policy", "inline"])
            .unwrap_err();
        assert!(err.to_string().contains("templated-import"));
    }

    #[test]
    fn encoding_override_must_suit_the_policy() {
        let cli = parse(&["main.wasm", "--policy", "prelude", "--encoding", "plain"]);
        let err = resolve_config(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("compressed"));

        let cli = parse(&["main.wasm", "--encoding", "compressed"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn invalid_override_is_reported() {
        let cli = parse(&["main.wasm", "--payload-token", "PAYLOAD"]);
        let err = resolve_config(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("base64"));
    }

    #[test]
    fn run_bundles_and_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("main.wasm");
        std::fs::write(&artifact, [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00]).unwrap();
        let report = dir.path().join("report.json");

        let cli = parse(&[
            artifact.to_str().unwrap(),
            "--policy",
            "token-constant",
            "--report",
            report.to_str().unwrap(),
        ]);
        run(&cli).unwrap();

        let script = std::fs::read_to_string(&artifact).unwrap();
        assert!(script.contains("\"AGFzbQEAAAA=\""));
        let json = std::fs::read_to_string(&report).unwrap();
        assert!(json.contains("\"splice\": \"token-constant\""));
    }

    #[test]
    fn run_fails_without_runtime_shim() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("main.wasm");
        std::fs::write(&artifact, b"\0asm\x01\0\0\0").unwrap();

        let cli = parse(&[
            artifact.to_str().unwrap(),
            "--asset-root",
            dir.path().to_str().unwrap(),
        ]);
        let err = run(&cli).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("failed to bundle"));
        assert!(message.contains("wasm_exec.js"));
        assert_eq!(std::fs::read(&artifact).unwrap(), b"\0asm\x01\0\0\0");
    }
}
