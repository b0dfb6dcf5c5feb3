//! Bundle configuration.
//!
//! ```toml
//! splice = "templated-import"
//! encoding = "plain"
//! shims = ["wasm_exec.js"]
//! template = "bootstrap.js"
//! payload_token = "__WASM_PAYLOAD__"
//! prelude_constant = "WASM_PAYLOAD"
//! missing_token = "error"
//! require_wasm = false
//! compression_level = 9
//! ```
//!
//! `encoding`, `shims` and `template` default per splice policy when absent.

use std::path::Path;

use serde::{Deserialize, Serialize};
use wasmscript_payload::DEFAULT_COMPRESSION_LEVEL;
use wasmscript_types::{EncodingPolicy, MissingTokenMode, SplicePolicy};

use crate::error::{BundleError, BundleResult, ConfigError};

/// Default placeholder for the payload in templates.
pub const DEFAULT_PAYLOAD_TOKEN: &str = "__WASM_PAYLOAD__";

/// Default name of the payload constant written by the prelude policy.
pub const DEFAULT_PRELUDE_CONSTANT: &str = "WASM_PAYLOAD";

/// Runtime shim shipped by the Go toolchain.
pub const GO_RUNTIME_SHIM: &str = "wasm_exec.js";

/// Everything a bundling run needs besides the payload and the assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleConfig {
    /// How payload and shims are combined.
    #[serde(default = "default_splice")]
    pub splice: SplicePolicy,

    /// Payload encoding. `None` picks the splice policy's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<EncodingPolicy>,

    /// Shim asset names, in splice order. `None` picks the policy's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shims: Option<Vec<String>>,

    /// Template asset name. `None` picks the policy's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default = "default_payload_token")]
    pub payload_token: String,

    #[serde(default = "default_prelude_constant")]
    pub prelude_constant: String,

    /// What to do when a token or import line is absent.
    #[serde(default)]
    pub missing_token: MissingTokenMode,

    /// Reject payloads that are not WebAssembly modules.
    #[serde(default)]
    pub require_wasm: bool,

    /// gzip level for [`EncodingPolicy::Compressed`] (0–9).
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

fn default_splice() -> SplicePolicy {
    SplicePolicy::TemplatedImport
}

fn default_payload_token() -> String {
    DEFAULT_PAYLOAD_TOKEN.to_string()
}

fn default_prelude_constant() -> String {
    DEFAULT_PRELUDE_CONSTANT.to_string()
}

fn default_compression_level() -> u32 {
    DEFAULT_COMPRESSION_LEVEL
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self::for_policy(default_splice())
    }
}

impl BundleConfig {
    /// Defaults for `splice`.
    pub fn for_policy(splice: SplicePolicy) -> Self {
        Self {
            splice,
            encoding: None,
            shims: None,
            template: None,
            payload_token: default_payload_token(),
            prelude_constant: default_prelude_constant(),
            missing_token: MissingTokenMode::default(),
            require_wasm: false,
            compression_level: default_compression_level(),
        }
    }

    /// Parse TOML text. The result is not validated.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file. The result is not validated.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Io`] if the file cannot be read and
    /// [`BundleError::Config`] if it does not parse.
    pub fn load<P: AsRef<Path>>(path: P) -> BundleResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| BundleError::io(path, e))?;
        Ok(Self::from_toml_str(&contents)?)
    }

    // ── Effective values ─────────────────────────────────────────────────

    pub fn encoding(&self) -> EncodingPolicy {
        self.encoding
            .unwrap_or_else(|| self.splice.default_encoding())
    }

    pub fn shims(&self) -> Vec<String> {
        match &self.shims {
            Some(shims) => shims.clone(),
            None => match self.splice {
                SplicePolicy::TemplatedImport => vec![GO_RUNTIME_SHIM.to_string()],
                SplicePolicy::TokenConstant => Vec::new(),
                SplicePolicy::Prelude => {
                    vec![GO_RUNTIME_SHIM.to_string(), "prelude_start.js".to_string()]
                }
            },
        }
    }

    pub fn template(&self) -> Option<String> {
        if let Some(template) = &self.template {
            return Some(template.clone());
        }
        match self.splice {
            SplicePolicy::TemplatedImport => Some("bootstrap.js".to_string()),
            SplicePolicy::TokenConstant => Some("bootstrap_inline.js".to_string()),
            SplicePolicy::Prelude => None,
        }
    }

    pub fn is_lenient(&self) -> bool {
        self.missing_token == MissingTokenMode::Ignore
    }

    // ── Validation ───────────────────────────────────────────────────────

    /// Check the configuration before any file is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        if self.payload_token.is_empty() {
            return invalid("payload_token must not be empty".to_string());
        }
        if self.payload_token.chars().all(is_base64_char) {
            return invalid(format!(
                "payload_token {:?} uses only base64 characters and could occur in the payload",
                self.payload_token
            ));
        }
        if !is_identifier(&self.prelude_constant) {
            return invalid(format!(
                "prelude_constant {:?} is not a JavaScript identifier",
                self.prelude_constant
            ));
        }
        if self.compression_level > 9 {
            return invalid(format!(
                "compression_level must be 0-9, got {}",
                self.compression_level
            ));
        }

        let shims = self.shims();
        if shims.iter().any(|s| s.is_empty()) {
            return invalid("shim names must not be empty".to_string());
        }
        match self.splice {
            SplicePolicy::TemplatedImport if shims.is_empty() => {
                return invalid("templated-import needs at least one shim".to_string());
            }
            SplicePolicy::TokenConstant if !shims.is_empty() => {
                return invalid(format!(
                    "token-constant does not splice shims, but {} configured",
                    shims.join(", ")
                ));
            }
            _ => {}
        }
        if self.splice.uses_template() && self.template().is_none_or(|t| t.is_empty()) {
            return invalid(format!("{} needs a template", self.splice));
        }
        if self.splice == SplicePolicy::Prelude && self.template.is_some() {
            return invalid("prelude does not use a template".to_string());
        }

        // The shipped templates and start shim each decode one encoding.
        let encoding = self.encoding();
        if self.splice == SplicePolicy::Prelude && encoding != EncodingPolicy::Compressed {
            return invalid(format!("prelude needs the compressed encoding, got {encoding}"));
        }
        if self.splice.uses_template()
            && self.template.is_none()
            && encoding == EncodingPolicy::Compressed
        {
            return invalid(format!(
                "the default {} template only decodes plain payloads; name a template that decompresses",
                self.splice
            ));
        }

        Ok(())
    }
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
}

/// ASCII JavaScript identifier that is not a reserved word.
fn is_identifier(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
        "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for",
        "function", "if", "import", "in", "instanceof", "let", "new", "null", "return", "static",
        "super", "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while",
        "with", "yield",
    ];
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !RESERVED.contains(&name)
}
