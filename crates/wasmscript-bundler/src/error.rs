//! Bundler error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use wasmscript_payload::PayloadError;
use wasmscript_types::{Diagnostic, Diagnostics};

/// Failure to fetch a shim or template by logical name.
#[derive(Debug, Error)]
pub enum AssetError {
    /// No provider knows the name.
    #[error("asset not found: {0}")]
    NotFound(String),

    /// The asset exists but could not be read.
    #[error("failed to read asset {name}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    /// The asset is not UTF-8 text.
    #[error("asset {0} is not valid UTF-8")]
    InvalidUtf8(String),

    /// The name would resolve outside the asset root.
    #[error("asset name {0:?} escapes the asset root")]
    OutsideRoot(String),
}

/// A designated token or import line broke the exactly-once contract.
#[derive(Debug, Error)]
pub enum SpliceError {
    /// The token is absent from the text it must appear in.
    #[error("{token:?} not found in {asset}")]
    MissingToken { token: String, asset: String },

    /// The token appears more than once.
    #[error("{token:?} appears {count} times in {asset} (expected exactly once)")]
    DuplicateToken {
        token: String,
        asset: String,
        count: usize,
    },

    /// A shim keeps export forms a plain script cannot carry.
    #[error("{asset}: {} export(s) cannot be rewritten for a plain script, first: {}", .exports.len(), first_of(.exports))]
    UnresolvedExports {
        asset: String,
        exports: Vec<Diagnostic>,
    },

    /// A static `import` is left over that no shim replaces.
    #[error("{asset}: {} static import(s) match no shim, first: {}", .imports.len(), first_of(.imports))]
    UnresolvedImports {
        asset: String,
        imports: Vec<Diagnostic>,
    },
}

fn first_of(exports: &[Diagnostic]) -> String {
    exports.first().map(ToString::to_string).unwrap_or_default()
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but violates a rule.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Any failure of a bundling run.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Reading the artifact or writing the bundle failed.
    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Splice(#[from] SpliceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A shim or template could not be tokenized.
    #[error("cannot normalize: {0}")]
    Normalize(Diagnostics),
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Bundler result type alias.
pub type BundleResult<T> = Result<T, BundleError>;
