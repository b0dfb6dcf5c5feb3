use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics stored before further ones are only counted.
pub const MAX_DIAGNOSTICS: usize = 20;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic category, determined by code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Lexical,
    Export,
}

/// Numeric diagnostic code (W100–W299).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lexical (100–199) ──
    pub const UNTERMINATED_STRING: Self = Self(100);
    pub const UNTERMINATED_TEMPLATE: Self = Self(101);
    pub const UNTERMINATED_COMMENT: Self = Self(102);
    pub const UNTERMINATED_REGEX: Self = Self(103);
    pub const UNBALANCED_BRACE: Self = Self(104);

    // ── Module syntax (200–299) ──
    pub const UNRESOLVED_EXPORT: Self = Self(200);
    pub const DEFAULT_EXPORT: Self = Self(201);
    pub const REEXPORT_FROM: Self = Self(202);
    pub const STATIC_IMPORT: Self = Self(203);

    /// Get the category for this code.
    pub fn category(self) -> DiagnosticCategory {
        match self.0 {
            200..=299 => DiagnosticCategory::Export,
            _ => DiagnosticCategory::Lexical,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

/// A structured diagnostic about a JavaScript source (shim or template).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Logical name of the source (asset name).
    pub file: String,
    pub code: ErrorCode,
    pub severity: Severity,
    pub category: DiagnosticCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create a new error-severity diagnostic.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Downgrade to a warning.
    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for Diagnostic {}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "lexical"),
            Self::Export => write!(f, "export"),
        }
    }
}

/// Collected diagnostics for one source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the [`MAX_DIAGNOSTICS`] limit.
    pub fn push_error(&mut self, error: Diagnostic) {
        if self.errors.len() < MAX_DIAGNOSTICS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Add a warning, respecting the [`MAX_DIAGNOSTICS`] limit.
    pub fn push_warning(&mut self, warning: Diagnostic) {
        if self.warnings.len() < MAX_DIAGNOSTICS {
            self.warnings.push(warning.warning());
        }
        self.total_warnings += 1;
    }

    /// Append everything from `other`.
    pub fn extend(&mut self, other: Diagnostics) {
        // Entries dropped by `other`'s own cap still count.
        let dropped_errors = other.total_errors.saturating_sub(other.errors.len());
        let dropped_warnings = other.total_warnings.saturating_sub(other.warnings.len());
        for e in other.errors {
            self.push_error(e);
        }
        for w in other.warnings {
            self.push_warning(w);
        }
        self.total_errors += dropped_errors;
        self.total_warnings += dropped_warnings;
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s)", self.total_errors)?;
        if let Some(first) = self.errors.first() {
            write!(f, ", first: {first}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_category() {
        assert_eq!(
            ErrorCode::UNTERMINATED_STRING.category(),
            DiagnosticCategory::Lexical
        );
        assert_eq!(
            ErrorCode::UNBALANCED_BRACE.category(),
            DiagnosticCategory::Lexical
        );
        assert_eq!(
            ErrorCode::DEFAULT_EXPORT.category(),
            DiagnosticCategory::Export
        );
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::UNTERMINATED_TEMPLATE), "W101");
        assert_eq!(format!("{}", ErrorCode::REEXPORT_FROM), "W202");
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::new(
            "wasm_exec.js",
            ErrorCode::UNTERMINATED_STRING,
            "Unterminated string literal",
            Span::new(10, 14, 2, 5),
            "  \"abc",
        );
        assert_eq!(
            d.to_string(),
            "wasm_exec.js:2:5: W100 [lexical] Unterminated string literal"
        );
    }

    #[test]
    fn test_diagnostic_json_serialization() {
        let d = Diagnostic::new(
            "wasm_exec.js",
            ErrorCode::DEFAULT_EXPORT,
            "`export default` cannot be expressed in a plain script",
            Span::new(0, 6, 1, 1),
            "export default Go;",
        )
        .with_suggestion("Export a named declaration instead");

        let json = serde_json::to_string_pretty(&d).unwrap();
        assert!(json.contains("\"code\""));
        assert!(json.contains("\"line\""));
        assert!(json.contains("\"column\""));
        assert!(json.contains("\"suggestion\""));

        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, d.code);
        assert_eq!(back.span, d.span);
    }

    #[test]
    fn test_diagnostics_max_limit() {
        let mut diags = Diagnostics::empty();
        for i in 0..25 {
            diags.push_error(Diagnostic::new(
                "shim.js",
                ErrorCode::UNTERMINATED_STRING,
                format!("Error {i}"),
                Span::point(i, 1, i as u32 + 1),
                "",
            ));
        }
        assert_eq!(diags.errors.len(), MAX_DIAGNOSTICS);
        assert_eq!(diags.total_errors, 25);
        assert!(diags.has_errors());
    }

    #[test]
    fn test_push_warning_downgrades_severity() {
        let mut diags = Diagnostics::empty();
        diags.push_warning(Diagnostic::new(
            "shim.js",
            ErrorCode::UNRESOLVED_EXPORT,
            "left as is",
            Span::point(0, 1, 1),
            "",
        ));
        assert!(!diags.has_errors());
        assert_eq!(diags.warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_extend_counts_dropped_entries() {
        let mut a = Diagnostics::empty();
        let mut b = Diagnostics::empty();
        for i in 0..22 {
            b.push_error(Diagnostic::new(
                "b.js",
                ErrorCode::UNTERMINATED_STRING,
                format!("e{i}"),
                Span::point(0, 1, 1),
                "",
            ));
        }
        a.extend(b);
        assert_eq!(a.total_errors, 22);
        assert_eq!(a.errors.len(), MAX_DIAGNOSTICS);
    }
}
