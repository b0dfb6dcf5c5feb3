//! wasmscript bundler: turns a WebAssembly artifact into a self-contained
//! plain script.
//!
//! ```text
//! .wasm → Loader → Encoder ─┐
//! assets → Shim Loader → Normalizer ─┴→ Splicer → Writer → .wasm (now a script)
//! ```
//!
//! Entry points: [`bundle_file`] for the whole pipeline, [`bundle`] for the
//! in-memory core.

pub mod assets;
pub mod config;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod splice;
pub mod writer;

pub use assets::{AssetProvider, DirAssets, EmbeddedAssets, LayeredAssets, MemoryAssets};
pub use config::{BundleConfig, DEFAULT_PAYLOAD_TOKEN, DEFAULT_PRELUDE_CONSTANT};
pub use error::{AssetError, BundleError, BundleResult, ConfigError, SpliceError};
pub use normalize::{normalize, Normalized};
pub use pipeline::{bundle, bundle_file, Bundle};
pub use report::BundleReport;
pub use wasmscript_types::{EncodingPolicy, MissingTokenMode, SplicePolicy};
