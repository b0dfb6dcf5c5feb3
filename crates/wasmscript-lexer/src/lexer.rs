//! JavaScript tokenizer.
//!
//! Features:
//! - String, template and regular-expression literals are single tokens, so
//!   nothing inside them is ever mistaken for code
//! - Template substitutions (`${expr}`) via a mode stack, nested to any depth
//! - Line, block and hashbang comments skipped
//! - Regex-vs-division decided by the previous significant token
//! - Error recovery: collects up to [`MAX_DIAGNOSTICS`] errors instead of
//!   stopping at the first
//!
//! Columns count bytes, not characters.

use wasmscript_types::{Diagnostic, Diagnostics, ErrorCode, SourceFile, Span, MAX_DIAGNOSTICS};

use crate::token::{Token, TokenKind};

/// Tokenizer mode: top-level code, template text, or a `${...}` substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Normal code scanning.
    Normal,
    /// Inside a template literal, scanning text until `` ` `` or `${`.
    Template,
    /// Inside a `${...}` substitution. `brace_depth` counts nested `{` so the
    /// closing `}` of the substitution can be told apart.
    Interpolation { brace_depth: u32 },
}

/// How a run of template text ended.
enum ChunkEnd {
    /// Closing backtick consumed.
    Closed,
    /// `${` consumed.
    Substitution,
    /// End of input.
    Unterminated,
}

/// The JavaScript tokenizer.
pub struct Lexer<'src> {
    source: &'src [u8],
    text: &'src str,
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, bytes).
    col: u32,
    errors: Diagnostics,
    mode_stack: Vec<Mode>,
    /// Pending tokens to emit before the next scan (used for substitutions).
    pending: Vec<Token>,
    /// A `/` at the current position is a division, not a regex.
    after_expression: bool,
    /// The previous token was `.`, so the next word is a property name.
    after_dot: bool,
}

/// Result of tokenizing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: Diagnostics,
}

impl<'src> Lexer<'src> {
    /// Create a new tokenizer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        let text = source_file.source.as_str();
        let pos = if text.starts_with('\u{feff}') { 3 } else { 0 };
        Self {
            source: text.as_bytes(),
            text,
            source_file,
            pos,
            line: 1,
            col: 1,
            errors: Diagnostics::empty(),
            mode_stack: vec![Mode::Normal],
            pending: Vec::new(),
            after_expression: false,
            after_dot: false,
        }
    }

    /// Tokenize the entire source file.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        self.skip_hashbang();

        loop {
            if self.errors.total_errors >= MAX_DIAGNOSTICS {
                break;
            }

            // Drain pending tokens first (InterpolationStart after a template chunk)
            let token = match self.pending.pop() {
                Some(pending) => pending,
                None => match self.current_mode() {
                    Mode::Normal | Mode::Interpolation { .. } => self.scan_normal(),
                    Mode::Template => self.scan_template_continuation(),
                },
            };

            self.after_expression = token.kind.ends_expression();
            self.after_dot = token.kind == TokenKind::Dot;

            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        // Ensure token stream always ends with Eof
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Mode stack helpers
    // ─────────────────────────────────────────────────────────────

    fn current_mode(&self) -> Mode {
        *self.mode_stack.last().unwrap_or(&Mode::Normal)
    }

    fn push_mode(&mut self, mode: Mode) {
        self.mode_stack.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.pos, self.line, self.col)
    }

    fn span_from(&self, start: usize, line: u32, col: u32) -> Span {
        Span::new(start, self.pos, line, col)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.text.get(start..end).unwrap_or("").to_string()
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.line).unwrap_or("").to_string();
        let err = Diagnostic::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    fn is_ident_start(ch: u8) -> bool {
        ch.is_ascii_alphabetic() || ch == b'_' || ch == b'$' || ch >= 0x80
    }

    fn is_ident_continue(ch: u8) -> bool {
        Self::is_ident_start(ch) || ch.is_ascii_digit()
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip a `#!` line at the very start of the file.
    fn skip_hashbang(&mut self) {
        if self.peek() == Some(b'#') && self.peek_at(1) == Some(b'!') {
            while let Some(ch) = self.peek() {
                if ch == b'\n' {
                    break;
                }
                self.advance();
            }
        }
    }

    /// Skip whitespace (newlines included) and comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | 0x0b | 0x0c) => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let start = self.pos;
        let (line, col) = (self.line, self.col);
        // Consume `/*`
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start, line, col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_COMMENT,
                        "Unterminated block comment",
                        span,
                    );
                    return;
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Normal-mode scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token in code (normal or substitution) mode.
    fn scan_normal(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;
        let (line, col) = (self.line, self.col);
        let Some(ch) = self.advance() else {
            if self.mode_stack.len() > 1 {
                self.emit_error(
                    ErrorCode::UNTERMINATED_TEMPLATE,
                    "Unterminated template literal substitution",
                    self.current_span(),
                );
                self.mode_stack.truncate(1);
            }
            return Token::new(TokenKind::Eof, self.current_span());
        };

        let kind = match ch {
            b'"' | b'\'' => return self.scan_string(ch, start, line, col),
            b'`' => return self.scan_template(start, line, col),
            b'0'..=b'9' => return self.scan_number(start, line, col),
            b'.' if matches!(self.peek(), Some(b'0'..=b'9')) => {
                return self.scan_number(start, line, col)
            }
            b'#' if self.peek().is_some_and(Self::is_ident_start) => {
                return self.scan_private_name(start, line, col)
            }
            c if Self::is_ident_start(c) => return self.scan_identifier(start, line, col),

            b'/' => {
                if !self.after_expression {
                    return self.scan_regex(start, line, col);
                }
                if self.peek() == Some(b'=') {
                    self.advance();
                }
                TokenKind::Slash
            }

            b'.' => {
                if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') {
                    self.advance();
                    self.advance();
                    TokenKind::Punct("...".to_string())
                } else {
                    TokenKind::Dot
                }
            }

            b'*' => match self.peek() {
                Some(next @ (b'*' | b'=')) => {
                    self.advance();
                    TokenKind::Punct(format!("*{}", next as char))
                }
                _ => TokenKind::Star,
            },

            b'+' | b'-' if self.peek() == Some(ch) => {
                self.advance();
                TokenKind::Punct(format!("{0}{0}", ch as char))
            }

            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b';' => TokenKind::Semicolon,
            b',' => TokenKind::Comma,

            b'{' => {
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    *brace_depth += 1;
                }
                TokenKind::LBrace
            }

            b'}' => {
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    if *brace_depth == 0 {
                        // This `}` ends the substitution; back to template text
                        self.pop_mode();
                        self.push_mode(Mode::Template);
                        return Token::new(
                            TokenKind::InterpolationEnd,
                            self.span_from(start, line, col),
                        );
                    }
                    *brace_depth -= 1;
                }
                TokenKind::RBrace
            }

            other => TokenKind::Punct((other as char).to_string()),
        };

        Token::new(kind, self.span_from(start, line, col))
    }

    // ─────────────────────────────────────────────────────────────
    // Numbers, identifiers, private names
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: usize, line: u32, col: u32) -> Token {
        let is_hex = self.source.get(start) == Some(&b'0')
            && matches!(self.source.get(start + 1), Some(b'x' | b'X'));

        loop {
            match self.peek() {
                Some(c) if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' => {
                    self.advance();
                }
                // Exponent sign: `1e-3`
                Some(b'+' | b'-')
                    if !is_hex && matches!(self.source.get(self.pos - 1), Some(b'e' | b'E')) =>
                {
                    self.advance();
                }
                _ => break,
            }
        }

        let text = self.slice(start, self.pos);
        Token::new(TokenKind::NumberLit(text), self.span_from(start, line, col))
    }

    fn scan_identifier(&mut self, start: usize, line: u32, col: u32) -> Token {
        // First character was already consumed
        while self.peek().is_some_and(Self::is_ident_continue) {
            self.advance();
        }

        let text = self.slice(start, self.pos);
        let keyword = if self.after_dot {
            None
        } else {
            TokenKind::from_keyword(&text)
        };
        let kind = keyword.unwrap_or(TokenKind::Identifier(text));

        Token::new(kind, self.span_from(start, line, col))
    }

    fn scan_private_name(&mut self, start: usize, line: u32, col: u32) -> Token {
        while self.peek().is_some_and(Self::is_ident_continue) {
            self.advance();
        }
        let name = self.slice(start + 1, self.pos);
        Token::new(TokenKind::PrivateName(name), self.span_from(start, line, col))
    }

    // ─────────────────────────────────────────────────────────────
    // String & regex literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a quoted string starting after the opening quote.
    fn scan_string(&mut self, quote: u8, start: usize, line: u32, col: u32) -> Token {
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    let span = self.span_from(start, line, col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "Unterminated string literal",
                        span,
                    );
                    let raw = self.slice(start + 1, self.pos);
                    return Token::new(TokenKind::StringLiteral(raw), span);
                }
                Some(c) if c == quote => {
                    let raw = self.slice(start + 1, self.pos);
                    self.advance();
                    return Token::new(
                        TokenKind::StringLiteral(raw),
                        self.span_from(start, line, col),
                    );
                }
                Some(b'\\') => {
                    // Escape, including a line continuation
                    self.advance();
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Scan a regular expression literal starting after the opening `/`.
    fn scan_regex(&mut self, start: usize, line: u32, col: u32) -> Token {
        let mut in_class = false;
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    let span = self.span_from(start, line, col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_REGEX,
                        "Unterminated regular expression literal",
                        span,
                    );
                    return Token::new(TokenKind::RegexLit(self.slice(start, self.pos)), span);
                }
                Some(b'\\') => {
                    self.advance();
                    if self.peek() != Some(b'\n') {
                        self.advance();
                    }
                }
                Some(b'[') => {
                    in_class = true;
                    self.advance();
                }
                Some(b']') => {
                    in_class = false;
                    self.advance();
                }
                Some(b'/') if !in_class => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        // Flags
        while self.peek().is_some_and(Self::is_ident_continue) {
            self.advance();
        }

        let raw = self.slice(start, self.pos);
        Token::new(TokenKind::RegexLit(raw), self.span_from(start, line, col))
    }

    // ─────────────────────────────────────────────────────────────
    // Template literals & substitutions
    // ─────────────────────────────────────────────────────────────

    /// Scan template text up to the closing backtick or the next `${`.
    fn scan_template_chunk(&mut self) -> (String, ChunkEnd) {
        let start = self.pos;
        loop {
            match self.peek() {
                None => return (self.slice(start, self.pos), ChunkEnd::Unterminated),
                Some(b'`') => {
                    let text = self.slice(start, self.pos);
                    self.advance();
                    return (text, ChunkEnd::Closed);
                }
                Some(b'\\') => {
                    self.advance();
                    self.advance();
                }
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    let text = self.slice(start, self.pos);
                    let (line, col) = (self.line, self.col);
                    let open = self.pos;
                    self.advance(); // consume '$'
                    self.advance(); // consume '{'
                    // Queue InterpolationStart so it appears after the chunk token
                    self.pending.push(Token::new(
                        TokenKind::InterpolationStart,
                        self.span_from(open, line, col),
                    ));
                    return (text, ChunkEnd::Substitution);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Scan a template literal starting after the opening backtick.
    fn scan_template(&mut self, start: usize, line: u32, col: u32) -> Token {
        let (text, end) = self.scan_template_chunk();
        let kind = match end {
            ChunkEnd::Closed => TokenKind::Template(text),
            ChunkEnd::Substitution => {
                self.push_mode(Mode::Interpolation { brace_depth: 0 });
                TokenKind::TemplateStart(text)
            }
            ChunkEnd::Unterminated => {
                let span = self.span_from(start, line, col);
                self.emit_error(
                    ErrorCode::UNTERMINATED_TEMPLATE,
                    "Unterminated template literal",
                    span,
                );
                self.mode_stack.truncate(1);
                TokenKind::Template(text)
            }
        };
        Token::new(kind, self.span_from(start, line, col))
    }

    /// Continue template text after a substitution's closing `}`.
    fn scan_template_continuation(&mut self) -> Token {
        let start = self.pos;
        let (line, col) = (self.line, self.col);
        let (text, end) = self.scan_template_chunk();
        let kind = match end {
            ChunkEnd::Closed => {
                self.pop_mode();
                TokenKind::TemplateEnd(text)
            }
            ChunkEnd::Substitution => {
                // Replace the Template mode with the next substitution
                self.pop_mode();
                self.push_mode(Mode::Interpolation { brace_depth: 0 });
                TokenKind::TemplatePart(text)
            }
            ChunkEnd::Unterminated => {
                let span = self.span_from(start, line, col);
                self.emit_error(
                    ErrorCode::UNTERMINATED_TEMPLATE,
                    "Unterminated template literal",
                    span,
                );
                self.mode_stack.truncate(1);
                TokenKind::TemplateEnd(text)
            }
        };
        Token::new(kind, self.span_from(start, line, col))
    }
}
