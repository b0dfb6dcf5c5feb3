//! Token types for the JavaScript tokenizer.
//!
//! The tokenizer only needs to be precise about the constructs that decide
//! where statements and literals begin and end, so [`TokenKind`] keeps
//! distinct kinds for module syntax, brackets and literals, and lumps every
//! other operator into [`TokenKind::Punct`].

use std::fmt;
use wasmscript_types::Span;

/// Words the tokenizer emits as dedicated keyword tokens.
///
/// Everything else (including `this`, `return`, `typeof`) is an
/// [`TokenKind::Identifier`].
pub const ALL_KEYWORDS: &[&str] = &[
    // Module syntax (5)
    "export", "import", "from", "default", "as",
    // Declarations (6)
    "class", "function", "async", "const", "let", "var",
];

/// Identifier-like words after which a `/` starts a regular expression
/// rather than a division.
pub const REGEX_PRECEDING_WORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source location (byte range plus start line/column).
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns `true` if this token is a reserved keyword.
    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }

    /// Returns `true` if this token starts in the first column of its line.
    pub fn at_line_start(&self) -> bool {
        self.span.col == 1
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Numeric literal, raw text: `42`, `0x1f`, `1e-3`, `10n`
    NumberLit(String),
    /// Quoted string literal; carries the raw text between the quotes.
    StringLiteral(String),
    /// Regular expression literal, raw text including slashes and flags.
    RegexLit(String),

    // ── Template literals ────────────────────────────────────

    /// Template literal without substitutions: `` `text` ``
    Template(String),
    /// Text before the first `${`.
    TemplateStart(String),
    /// Text between a `}` and the next `${`.
    TemplatePart(String),
    /// Text after the last `}` up to the closing backtick.
    TemplateEnd(String),
    /// The `${` that opens a substitution.
    InterpolationStart,
    /// The `}` that closes a substitution.
    InterpolationEnd,

    // ── Names ────────────────────────────────────────────────

    /// Any identifier that is not in [`ALL_KEYWORDS`].
    Identifier(String),
    /// Private class member name: `#instance`
    PrivateName(String),

    // ── Keywords ─────────────────────────────────────────────

    Export,
    Import,
    From,
    Default,
    As,
    Class,
    Function,
    Async,
    Const,
    Let,
    Var,

    // ── Punctuation ──────────────────────────────────────────

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Star,
    /// `/` or `/=` in operator position.
    Slash,
    /// Any other operator character or sequence.
    Punct(String),

    // ── Special ──────────────────────────────────────────────

    /// End of input (always the last token).
    Eof,
}

impl TokenKind {
    /// Look up a keyword by its source text.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "export" => TokenKind::Export,
            "import" => TokenKind::Import,
            "from" => TokenKind::From,
            "default" => TokenKind::Default,
            "as" => TokenKind::As,
            "class" => TokenKind::Class,
            "function" => TokenKind::Function,
            "async" => TokenKind::Async,
            "const" => TokenKind::Const,
            "let" => TokenKind::Let,
            "var" => TokenKind::Var,
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Export
                | TokenKind::Import
                | TokenKind::From
                | TokenKind::Default
                | TokenKind::As
                | TokenKind::Class
                | TokenKind::Function
                | TokenKind::Async
                | TokenKind::Const
                | TokenKind::Let
                | TokenKind::Var
        )
    }

    /// Keywords that can follow `export` in a rewritable declaration.
    pub fn is_declaration_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Class
                | TokenKind::Function
                | TokenKind::Async
                | TokenKind::Const
                | TokenKind::Let
                | TokenKind::Var
        )
    }

    /// Whether a `/` after this token is a division operator.
    pub fn ends_expression(&self) -> bool {
        match self {
            TokenKind::NumberLit(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::RegexLit(_)
            | TokenKind::Template(_)
            | TokenKind::TemplateEnd(_)
            | TokenKind::PrivateName(_)
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace => true,
            // Contextual keywords double as plain identifiers (`from / 2`).
            TokenKind::From | TokenKind::As | TokenKind::Async | TokenKind::Let => true,
            // Postfix `x++ / 2`.
            TokenKind::Punct(op) => op == "++" || op == "--",
            TokenKind::Identifier(name) => !REGEX_PRECEDING_WORDS.contains(&name.as_str()),
            _ => false,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::NumberLit(s) => write!(f, "{s}"),
            TokenKind::StringLiteral(s) => write!(f, "\"{s}\""),
            TokenKind::RegexLit(s) => write!(f, "{s}"),
            TokenKind::Template(s) => write!(f, "`{s}`"),
            TokenKind::TemplateStart(s) => write!(f, "`{s}${{"),
            TokenKind::TemplatePart(s) => write!(f, "}}{s}${{"),
            TokenKind::TemplateEnd(s) => write!(f, "}}{s}`"),
            TokenKind::InterpolationStart => write!(f, "${{"),
            TokenKind::InterpolationEnd => write!(f, "}}"),
            TokenKind::Identifier(name) => write!(f, "{name}"),
            TokenKind::PrivateName(name) => write!(f, "#{name}"),
            TokenKind::Export => write!(f, "export"),
            TokenKind::Import => write!(f, "import"),
            TokenKind::From => write!(f, "from"),
            TokenKind::Default => write!(f, "default"),
            TokenKind::As => write!(f, "as"),
            TokenKind::Class => write!(f, "class"),
            TokenKind::Function => write!(f, "function"),
            TokenKind::Async => write!(f, "async"),
            TokenKind::Const => write!(f, "const"),
            TokenKind::Let => write!(f, "let"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Punct(s) => write!(f, "{s}"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
