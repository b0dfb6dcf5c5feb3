//! Export normalizer: turns module-scoped shims and templates into
//! plain-script text.
//!
//! Only `export` tokens that start a line (column 1) at brace depth 0 are
//! touched:
//!
//! | input                         | output                          |
//! |-------------------------------|---------------------------------|
//! | `export class Go {`           | `class Go {`                    |
//! | `export async function f() {` | `async function f() {`          |
//! | `export { a, b };`            | empty (newlines in the list kept) |
//! | `export default ...`          | unchanged, reported (W201)      |
//! | `export * from "m";`          | unchanged, reported (W202)      |
//! | `export { a } from "m";`      | unchanged, reported (W202)      |
//!
//! Every other byte is copied through. Rewriting is idempotent.

use std::ops::Range;

use wasmscript_lexer::{Lexer, Token, TokenKind};
use wasmscript_types::{Diagnostic, Diagnostics, ErrorCode, SourceFile, Span};

/// Shim text with its exports rewritten.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub text: String,
    /// Export forms left in place because a plain script cannot express them.
    /// Always warning severity; the caller decides whether they are fatal.
    pub unresolved: Vec<Diagnostic>,
}

impl Normalized {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Rewrite the top-level exports of `source`.
///
/// `name` only labels diagnostics.
///
/// # Errors
///
/// Returns the tokenizer's diagnostics (plus unbalanced braces) when the
/// source cannot be scanned safely: an unterminated string, template,
/// comment or regular expression.
pub fn normalize(name: &str, source: &str) -> Result<Normalized, Diagnostics> {
    let file = SourceFile::new(name, source);
    let tokens = tokenize(&file)?;

    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut unresolved = Vec::new();

    let mut depth: usize = 0;
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        match &token.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => depth = depth.saturating_sub(1),
            TokenKind::Export if depth == 0 && token.at_line_start() => {
                match rewrite_export(&file, &tokens, i) {
                    Rewrite::Edit { range, replacement, resume } => {
                        edits.push((range, replacement));
                        i = resume;
                        continue;
                    }
                    Rewrite::Keep(diagnostic) => unresolved.push(diagnostic),
                }
            }
            _ => {}
        }
        i += 1;
    }

    Ok(Normalized {
        text: apply_edits(source, &edits),
        unresolved,
    })
}

/// Tokenize and check brace balance.
pub(crate) fn tokenize(file: &SourceFile) -> Result<Vec<Token>, Diagnostics> {
    let result = Lexer::new(file).lex();
    let mut errors = result.errors;

    let mut open: Vec<Span> = Vec::new();
    for token in &result.tokens {
        match token.kind {
            TokenKind::LBrace => open.push(token.span),
            TokenKind::RBrace => {
                if open.pop().is_none() {
                    errors.push_error(brace_error(file, token.span, "Unmatched `}`"));
                }
            }
            _ => {}
        }
    }
    if let Some(span) = open.first() {
        errors.push_error(brace_error(file, *span, "Unclosed `{`"));
    }

    if errors.has_errors() {
        Err(errors)
    } else {
        Ok(result.tokens)
    }
}

fn brace_error(file: &SourceFile, span: Span, message: &str) -> Diagnostic {
    Diagnostic::new(
        &file.name,
        ErrorCode::UNBALANCED_BRACE,
        message,
        span,
        file.line(span.line).unwrap_or(""),
    )
}

// ══════════════════════════════════════════════════════════════════════════════
// Export forms
// ══════════════════════════════════════════════════════════════════════════════

enum Rewrite {
    /// Replace `range` with `replacement`, continue scanning at token `resume`.
    Edit {
        range: Range<usize>,
        replacement: String,
        resume: usize,
    },
    Keep(Diagnostic),
}

fn rewrite_export(file: &SourceFile, tokens: &[Token], at: usize) -> Rewrite {
    let export = &tokens[at];
    let Some(next) = tokens.get(at + 1) else {
        return Rewrite::Keep(unresolved(file, export.span, ErrorCode::UNRESOLVED_EXPORT, None));
    };

    match &next.kind {
        kind if kind.is_declaration_keyword() => {
            // Drop `export` and the spaces after it, keep any line break.
            let bytes = file.source.as_bytes();
            let mut end = export.span.end;
            while end < next.span.start && matches!(bytes.get(end), Some(b' ' | b'\t')) {
                end += 1;
            }
            Rewrite::Edit {
                range: export.span.start..end,
                replacement: String::new(),
                resume: at + 1,
            }
        }

        TokenKind::LBrace => {
            let Some(close) = tokens[at + 1..]
                .iter()
                .position(|t| t.kind == TokenKind::RBrace)
                .map(|offset| at + 1 + offset)
            else {
                return Rewrite::Keep(unresolved(file, export.span, ErrorCode::UNRESOLVED_EXPORT, None));
            };

            let after = tokens.get(close + 1);
            if after.is_some_and(|t| t.kind == TokenKind::From) {
                let span = export.span.merge(tokens[close].span);
                return Rewrite::Keep(unresolved(
                    file,
                    span,
                    ErrorCode::REEXPORT_FROM,
                    Some("import the bindings and declare them in the shim instead"),
                ));
            }

            let (end, resume) = match after {
                Some(t) if t.kind == TokenKind::Semicolon => (t.span.end, close + 2),
                _ => (tokens[close].span.end, close + 1),
            };
            let range = export.span.start..end;
            let newlines = "\n".repeat(file.source[range.clone()].matches('\n').count());
            Rewrite::Edit {
                range,
                replacement: newlines,
                resume,
            }
        }

        TokenKind::Default => Rewrite::Keep(unresolved(
            file,
            export.span.merge(next.span),
            ErrorCode::DEFAULT_EXPORT,
            Some("give the value a name, e.g. `const Runtime = ...`"),
        )),

        TokenKind::Star => Rewrite::Keep(unresolved(
            file,
            export.span.merge(next.span),
            ErrorCode::REEXPORT_FROM,
            Some("inline the re-exported module as its own shim"),
        )),

        _ => Rewrite::Keep(unresolved(file, export.span, ErrorCode::UNRESOLVED_EXPORT, None)),
    }
}

fn unresolved(
    file: &SourceFile,
    span: Span,
    code: ErrorCode,
    suggestion: Option<&str>,
) -> Diagnostic {
    let message = match code {
        ErrorCode::DEFAULT_EXPORT => "`export default` has no plain-script form",
        ErrorCode::REEXPORT_FROM => "re-export from another module has no plain-script form",
        _ => "unrecognized export form",
    };
    let diagnostic = Diagnostic::new(
        &file.name,
        code,
        message,
        span,
        file.line(span.line).unwrap_or(""),
    )
    .warning();
    match suggestion {
        Some(s) => diagnostic.with_suggestion(s),
        None => diagnostic,
    }
}

/// Apply non-overlapping, ascending edits to `source`.
pub(crate) fn apply_edits(source: &str, edits: &[(Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&source[cursor..range.start]);
        out.push_str(replacement);
        cursor = range.end;
    }
    out.push_str(&source[cursor..]);
    out
}
