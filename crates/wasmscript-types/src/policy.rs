//! Bundling policies.
//!
//! A build picks one [`SplicePolicy`] and one [`EncodingPolicy`]; every
//! combination runs through the same pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How payload bytes become embeddable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingPolicy {
    /// Standard base64 of the raw bytes.
    Plain,
    /// gzip, then standard base64.
    Compressed,
}

/// How the encoded payload and the shims are combined into the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplicePolicy {
    /// Template whose shim `import` lines are replaced by the shims and whose
    /// payload token is replaced by a quoted literal.
    TemplatedImport,
    /// Template whose payload token is replaced in place by the raw payload text.
    TokenConstant,
    /// A one-line payload constant prepended to the shims; no template.
    Prelude,
}

impl SplicePolicy {
    /// Encoding used when the configuration does not name one.
    pub fn default_encoding(self) -> EncodingPolicy {
        match self {
            Self::TemplatedImport | Self::TokenConstant => EncodingPolicy::Plain,
            Self::Prelude => EncodingPolicy::Compressed,
        }
    }

    /// Whether this policy splices into a template.
    pub fn uses_template(self) -> bool {
        !matches!(self, Self::Prelude)
    }
}

/// What happens when a designated token or import line is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingTokenMode {
    /// Absent tokens and unresolved exports abort the build.
    #[default]
    Error,
    /// Absent tokens are skipped and unresolved exports only warn.
    Ignore,
}

/// An unrecognised policy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParsePolicyError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl FromStr for EncodingPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "compressed" => Ok(Self::Compressed),
            _ => Err(ParsePolicyError {
                kind: "encoding",
                value: s.to_string(),
                expected: "plain, compressed",
            }),
        }
    }
}

impl FromStr for SplicePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "templated-import" => Ok(Self::TemplatedImport),
            "token-constant" => Ok(Self::TokenConstant),
            "prelude" => Ok(Self::Prelude),
            _ => Err(ParsePolicyError {
                kind: "splice policy",
                value: s.to_string(),
                expected: "templated-import, token-constant, prelude",
            }),
        }
    }
}

impl fmt::Display for EncodingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Compressed => write!(f, "compressed"),
        }
    }
}

impl fmt::Display for SplicePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TemplatedImport => write!(f, "templated-import"),
            Self::TokenConstant => write!(f, "token-constant"),
            Self::Prelude => write!(f, "prelude"),
        }
    }
}
