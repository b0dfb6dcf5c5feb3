//! Splicer: combines the encoded payload, the normalized shims and the
//! template into one script.
//!
//! Every designated token or import line must appear exactly once. With
//! [`MissingTokenMode::Ignore`] an absent one is skipped with a warning; a
//! repeated one is always an error.

use std::ops::Range;

use tracing::warn;
use wasmscript_lexer::{Token, TokenKind};
use wasmscript_types::{Diagnostic, ErrorCode, MissingTokenMode, SourceFile, Span};

use crate::error::{BundleError, BundleResult, ConfigError, SpliceError};
use crate::normalize::{apply_edits, tokenize};

/// A normalized shim ready to be spliced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shim {
    /// Logical asset name (`wasm_exec.js`).
    pub name: String,
    pub text: String,
}

impl Shim {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// The last path segment of the asset name.
    pub fn file_name(&self) -> &str {
        file_name(&self.name)
    }
}

/// Outcome of one substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    Replaced(String),
    /// Token absent and the mode allowed it; text unchanged.
    Skipped(String),
}

impl Substitution {
    pub fn into_text(self) -> String {
        match self {
            Self::Replaced(text) | Self::Skipped(text) => text,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Token substitution
// ══════════════════════════════════════════════════════════════════════════════

/// Replace the single occurrence of `token` in `text` with `replacement`.
///
/// `asset` names `text` in errors.
///
/// # Errors
///
/// [`SpliceError::DuplicateToken`] if `token` occurs more than once, and
/// [`SpliceError::MissingToken`] if it is absent under
/// [`MissingTokenMode::Error`].
pub fn substitute_token(
    asset: &str,
    text: &str,
    token: &str,
    replacement: &str,
    mode: MissingTokenMode,
) -> Result<Substitution, SpliceError> {
    let positions: Vec<usize> = text.match_indices(token).map(|(at, _)| at).collect();
    match positions.as_slice() {
        [] => missing(asset, token, mode).map(|()| Substitution::Skipped(text.to_string())),
        [at] => {
            let mut out = String::with_capacity(text.len() - token.len() + replacement.len());
            out.push_str(&text[..*at]);
            out.push_str(replacement);
            out.push_str(&text[at + token.len()..]);
            Ok(Substitution::Replaced(out))
        }
        many => Err(SpliceError::DuplicateToken {
            token: token.to_string(),
            asset: asset.to_string(),
            count: many.len(),
        }),
    }
}

fn missing(asset: &str, token: &str, mode: MissingTokenMode) -> Result<(), SpliceError> {
    match mode {
        MissingTokenMode::Error => Err(SpliceError::MissingToken {
            token: token.to_string(),
            asset: asset.to_string(),
        }),
        MissingTokenMode::Ignore => {
            warn!(asset, token, "token not found, leaving text unchanged");
            Ok(())
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Import injection
// ══════════════════════════════════════════════════════════════════════════════

/// A static `import` statement found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// Module specifier without quotes (`./wasm_exec.js`).
    pub specifier: String,
    /// Byte range from `import` through the optional `;`.
    pub range: Range<usize>,
    pub line: u32,
    pub span: Span,
}

impl ImportStatement {
    pub fn file_name(&self) -> &str {
        file_name(&self.specifier)
    }
}

/// Find the top-level static imports of `source`.
///
/// Dynamic `import(...)` and `import.meta` are not statements and are
/// skipped.
///
/// # Errors
///
/// [`BundleError::Normalize`] when the template cannot be tokenized.
pub fn find_imports(asset: &str, source: &str) -> BundleResult<Vec<ImportStatement>> {
    let file = SourceFile::new(asset, source);
    let tokens = tokenize(&file).map_err(BundleError::Normalize)?;

    let mut imports = Vec::new();
    let mut depth: usize = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => depth = depth.saturating_sub(1),
            TokenKind::Import if depth == 0 => {
                if let Some(import) = read_import(&tokens, i) {
                    imports.push(import);
                }
            }
            _ => {}
        }
    }
    Ok(imports)
}

fn read_import(tokens: &[Token], at: usize) -> Option<ImportStatement> {
    let start = &tokens[at];
    let mut i = at + 1;
    match tokens.get(i)?.kind {
        TokenKind::LParen | TokenKind::Dot => return None,
        TokenKind::StringLiteral(_) => {}
        _ => {
            // Bindings up to `from`.
            while tokens.get(i)?.kind != TokenKind::From {
                if matches!(
                    tokens[i].kind,
                    TokenKind::Semicolon | TokenKind::Import | TokenKind::Eof
                ) {
                    return None;
                }
                i += 1;
            }
            i += 1;
        }
    }

    let TokenKind::StringLiteral(specifier) = &tokens.get(i)?.kind else {
        return None;
    };
    let mut last = tokens[i].span;
    if let Some(semi) = tokens.get(i + 1).filter(|t| t.kind == TokenKind::Semicolon) {
        last = semi.span;
    }
    let span = start.span.merge(last);

    Some(ImportStatement {
        specifier: specifier.clone(),
        range: span.range(),
        line: span.line,
        span,
    })
}

/// Result of [`inject_shims`].
#[derive(Debug, Clone)]
pub struct Injected {
    pub text: String,
    /// Shims whose import line was absent.
    pub skipped: Vec<String>,
    /// Imports left in place because no shim matches them (W203 warnings).
    pub unresolved: Vec<Diagnostic>,
}

/// Replace each shim's import statement in `template` with the shim text.
///
/// A shim matches the import whose specifier has the same file name
/// (`import { Go } from "./wasm_exec.js";` matches `misc/wasm/wasm_exec.js`).
/// Imports that match no shim are left in place and reported in
/// [`Injected::unresolved`]; the caller decides whether they are fatal.
///
/// # Errors
///
/// [`SpliceError::DuplicateToken`] when a shim matches several imports,
/// [`SpliceError::MissingToken`] when it matches none under
/// [`MissingTokenMode::Error`], and [`BundleError::Normalize`] when the
/// template cannot be tokenized.
pub fn inject_shims(
    asset: &str,
    template: &str,
    shims: &[Shim],
    mode: MissingTokenMode,
) -> BundleResult<Injected> {
    for (i, shim) in shims.iter().enumerate() {
        if let Some(earlier) = shims[..i].iter().find(|s| s.file_name() == shim.file_name()) {
            return Err(ConfigError::Invalid(format!(
                "shims {} and {} share a file name",
                earlier.name, shim.name
            ))
            .into());
        }
    }

    let imports = find_imports(asset, template)?;

    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut skipped = Vec::new();
    for shim in shims {
        let matching: Vec<&ImportStatement> = imports
            .iter()
            .filter(|import| import.file_name() == shim.file_name())
            .collect();
        match matching.as_slice() {
            [] => {
                missing(asset, &import_token(shim), mode)?;
                skipped.push(shim.name.clone());
            }
            [import] => edits.push((import.range.clone(), shim.text.clone())),
            many => {
                return Err(SpliceError::DuplicateToken {
                    token: import_token(shim),
                    asset: asset.to_string(),
                    count: many.len(),
                }
                .into())
            }
        }
    }

    let leftover = imports
        .iter()
        .filter(|import| !shims.iter().any(|s| s.file_name() == import.file_name()));
    let unresolved = import_diagnostics(asset, template, leftover);

    edits.sort_by_key(|(range, _)| range.start);
    Ok(Injected {
        text: apply_edits(template, &edits),
        skipped,
        unresolved,
    })
}

/// Every static import of `source`, as W203 warnings.
///
/// A plain script cannot carry them, so anything left after splicing is
/// reported.
///
/// # Errors
///
/// [`BundleError::Normalize`] when `source` cannot be tokenized.
pub fn static_imports(asset: &str, source: &str) -> BundleResult<Vec<Diagnostic>> {
    let imports = find_imports(asset, source)?;
    Ok(import_diagnostics(asset, source, imports.iter()))
}

fn import_diagnostics<'a>(
    asset: &str,
    source: &str,
    imports: impl Iterator<Item = &'a ImportStatement>,
) -> Vec<Diagnostic> {
    let file = SourceFile::new(asset, source);
    imports
        .map(|import| {
            Diagnostic::new(
                asset,
                ErrorCode::STATIC_IMPORT,
                format!("static import of {:?} matches no shim", import.specifier),
                import.span,
                file.line(import.line).unwrap_or(""),
            )
            .warning()
            .with_suggestion("list the imported module as a shim")
        })
        .collect()
}

fn import_token(shim: &Shim) -> String {
    format!("import ... \"{}\"", shim.file_name())
}

// ══════════════════════════════════════════════════════════════════════════════
// Prelude
// ══════════════════════════════════════════════════════════════════════════════

/// `const <constant> = <literal>;` followed by the shims in order.
///
/// A `#!` line at the start of the first shim stays first.
pub fn prelude(constant: &str, literal: &str, shims: &[Shim]) -> String {
    let declaration = format!("const {constant} = {literal};\n");
    let body_len: usize = shims.iter().map(|s| s.text.len() + 1).sum();
    let mut out = String::with_capacity(declaration.len() + body_len);

    let mut rest = shims.iter();
    match rest.next() {
        Some(first) if first.text.starts_with("#!") => {
            let (hashbang, body) = match first.text.find('\n') {
                Some(nl) => first.text.split_at(nl + 1),
                None => (first.text.as_str(), ""),
            };
            out.push_str(hashbang);
            if !hashbang.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&declaration);
            push_line_terminated(&mut out, body);
        }
        Some(first) => {
            out.push_str(&declaration);
            push_line_terminated(&mut out, &first.text);
        }
        None => out.push_str(&declaration),
    }
    for shim in rest {
        push_line_terminated(&mut out, &shim.text);
    }
    out
}

fn push_line_terminated(out: &mut String, text: &str) {
    out.push_str(text);
    if !text.is_empty() && !text.ends_with('\n') {
        out.push('\n');
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_exactly_once() {
        let out = substitute_token("t.js", "a TOKEN b", "TOKEN", "X", MissingTokenMode::Error)
            .unwrap();
        assert_eq!(out, Substitution::Replaced("a X b".to_string()));
    }

    #[test]
    fn substitute_missing_and_duplicate() {
        let err = substitute_token("t.js", "a b", "TOKEN", "X", MissingTokenMode::Error)
            .unwrap_err();
        assert!(matches!(err, SpliceError::MissingToken { .. }));

        let out = substitute_token("t.js", "a b", "TOKEN", "X", MissingTokenMode::Ignore).unwrap();
        assert!(out.is_skipped());
        assert_eq!(out.into_text(), "a b");

        let err = substitute_token("t.js", "TOKEN TOKEN", "TOKEN", "X", MissingTokenMode::Ignore)
            .unwrap_err();
        assert!(matches!(err, SpliceError::DuplicateToken { count: 2, .. }));
    }

    #[test]
    fn file_names() {
        assert_eq!(file_name("./wasm_exec.js"), "wasm_exec.js");
        assert_eq!(file_name("misc/wasm/wasm_exec.js"), "wasm_exec.js");
        assert_eq!(file_name("wasm_exec.js"), "wasm_exec.js");
        assert_eq!(file_name("a\\b.js"), "b.js");
    }

    #[test]
    fn import_forms() {
        let source = concat!(
            "import { Go } from \"./wasm_exec.js\";\n",
            "import * as fs from './fs.js'\n",
            "import \"./side.js\";\n",
            "import Default, { a as b } from \"./d.js\";\n",
            "const m = import(\"./lazy.js\");\n",
            "const u = import.meta.url;\n",
        );
        let imports = find_imports("t.js", source).unwrap();
        assert_eq!(imports[1].span.col, 1);
        let specs: Vec<_> = imports.iter().map(|i| i.specifier.as_str()).collect();
        assert_eq!(specs, vec!["./wasm_exec.js", "./fs.js", "./side.js", "./d.js"]);
        assert_eq!(&source[imports[0].range.clone()], "import { Go } from \"./wasm_exec.js\";");
        assert_eq!(&source[imports[1].range.clone()], "import * as fs from './fs.js'");
        assert_eq!(imports[3].line, 4);
    }

    #[test]
    fn unmatched_imports_are_reported() {
        let template = "import { Go } from \"./wasm_exec.js\";\nimport { x } from \"./other.js\";\n";
        let shims = [Shim::new("wasm_exec.js", "class Go {}")];
        let out = inject_shims("t.js", template, &shims, MissingTokenMode::Error).unwrap();

        assert_eq!(out.text, "class Go {}\nimport { x } from \"./other.js\";\n");
        assert_eq!(out.unresolved.len(), 1);
        let d = &out.unresolved[0];
        assert_eq!(d.code, ErrorCode::STATIC_IMPORT);
        assert_eq!(d.span.line, 2);
        assert_eq!(d.source_line, "import { x } from \"./other.js\";");
    }

    #[test]
    fn static_imports_lists_every_import() {
        let source = "import \"./a.js\";\nconst m = import(\"./b.js\");\n";
        let found = static_imports("t.js", source).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("./a.js"));
    }

    #[test]
    fn imports_in_comments_and_blocks_are_ignored() {
        let source = "/* import { Go } from \"./wasm_exec.js\"; */\nfunction f() { }\n";
        assert!(find_imports("t.js", source).unwrap().is_empty());
    }

    #[test]
    fn prelude_after_hashbang() {
        let shims = [
            Shim::new("a.js", "#!/usr/bin/env node\nclass Go {}"),
            Shim::new("b.js", "run();\n"),
        ];
        assert_eq!(
            prelude("WASM_PAYLOAD", "\"AA==\"", &shims),
            "#!/usr/bin/env node\nconst WASM_PAYLOAD = \"AA==\";\nclass Go {}\nrun();\n"
        );
    }

    #[test]
    fn prelude_without_shims() {
        assert_eq!(prelude("P", "\"\"", &[]), "const P = \"\";\n");
    }
}
