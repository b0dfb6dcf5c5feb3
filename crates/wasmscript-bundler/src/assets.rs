//! Asset providers: where shims and templates come from.
//!
//! The pipeline never opens a shim or template by path. It asks an
//! [`AssetProvider`] for a logical name (`wasm_exec.js`, `bootstrap.js`) and
//! the provider decides where that lives.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::AssetError;

/// Resolves logical asset names to UTF-8 text.
pub trait AssetProvider {
    /// Fetch the asset called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::NotFound`] if this provider has no such asset,
    /// or another [`AssetError`] if it exists but cannot be used.
    fn fetch(&self, name: &str) -> Result<String, AssetError>;
}

impl<T: AssetProvider + ?Sized> AssetProvider for &T {
    fn fetch(&self, name: &str) -> Result<String, AssetError> {
        (**self).fetch(name)
    }
}

impl<T: AssetProvider + ?Sized> AssetProvider for Box<T> {
    fn fetch(&self, name: &str) -> Result<String, AssetError> {
        (**self).fetch(name)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// DirAssets
// ══════════════════════════════════════════════════════════════════════════════

/// Assets stored under a toolchain directory.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `name` onto the root, refusing names that could leave it.
    fn resolve(&self, name: &str) -> Result<PathBuf, AssetError> {
        let relative = Path::new(name);
        let stays_inside = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !stays_inside {
            return Err(AssetError::OutsideRoot(name.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetProvider for DirAssets {
    fn fetch(&self, name: &str) -> Result<String, AssetError> {
        let path = self.resolve(name)?;
        let bytes = std::fs::read(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => AssetError::NotFound(name.to_string()),
            _ => AssetError::Io {
                name: name.to_string(),
                source,
            },
        })?;
        String::from_utf8(bytes).map_err(|_| AssetError::InvalidUtf8(name.to_string()))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// MemoryAssets
// ══════════════════════════════════════════════════════════════════════════════

/// Assets held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    entries: BTreeMap<String, String>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryAssets::insert`].
    pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(name.into(), text.into());
    }
}

impl AssetProvider for MemoryAssets {
    fn fetch(&self, name: &str) -> Result<String, AssetError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// EmbeddedAssets
// ══════════════════════════════════════════════════════════════════════════════

/// Templates and shims compiled into the binary.
const EMBEDDED: &[(&str, &str)] = &[
    (
        "bootstrap.js",
        include_str!("../../../assets/bootstrap.js"),
    ),
    (
        "bootstrap_inline.js",
        include_str!("../../../assets/bootstrap_inline.js"),
    ),
    (
        "prelude_start.js",
        include_str!("../../../assets/prelude_start.js"),
    ),
];

/// The default templates and the prelude start shim shipped with wasmscript.
///
/// The language runtime shim (`wasm_exec.js`) is not embedded; it belongs to
/// the toolchain that produced the module.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedAssets;

impl EmbeddedAssets {
    /// Names of every embedded asset.
    pub fn names() -> impl Iterator<Item = &'static str> {
        EMBEDDED.iter().map(|(name, _)| *name)
    }
}

impl AssetProvider for EmbeddedAssets {
    fn fetch(&self, name: &str) -> Result<String, AssetError> {
        EMBEDDED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, text)| (*text).to_string())
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// LayeredAssets
// ══════════════════════════════════════════════════════════════════════════════

/// Ordered fallback over several providers.
///
/// The first layer that has the name wins. Only [`AssetError::NotFound`]
/// falls through to the next layer; any other error is returned as is.
#[derive(Default)]
pub struct LayeredAssets {
    layers: Vec<Box<dyn AssetProvider>>,
}

impl LayeredAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer with lower priority than the existing ones.
    pub fn layer(mut self, provider: impl AssetProvider + 'static) -> Self {
        self.layers.push(Box::new(provider));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl AssetProvider for LayeredAssets {
    fn fetch(&self, name: &str) -> Result<String, AssetError> {
        for layer in &self.layers {
            match layer.fetch(name) {
                Err(AssetError::NotFound(_)) => continue,
                other => return other,
            }
        }
        Err(AssetError::NotFound(name.to_string()))
    }
}
