//! Tokenizer tests.
//!
//! Covers: keywords vs. identifiers, property names, string/template/regex
//! literals, nested template substitutions, comments and hashbang lines,
//! regex-vs-division, error recovery, spans, and the 100-iteration
//! determinism test.

use wasmscript_lexer::{Lexer, TokenKind};
use wasmscript_types::{ErrorCode, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Tokenize source text and return just the token kinds (excluding final Eof).
fn kinds(source: &str) -> Vec<TokenKind> {
    let sf = SourceFile::new("test.js", source);
    Lexer::new(&sf)
        .lex()
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

/// Tokenize and return the error codes.
fn error_codes(source: &str) -> Vec<ErrorCode> {
    let sf = SourceFile::new("test.js", source);
    Lexer::new(&sf)
        .lex()
        .errors
        .errors
        .into_iter()
        .map(|e| e.code)
        .collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

fn string(raw: &str) -> TokenKind {
    TokenKind::StringLiteral(raw.to_string())
}

fn punct(op: &str) -> TokenKind {
    TokenKind::Punct(op.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Keywords & identifiers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_module_keywords() {
    assert_eq!(
        kinds(r#"import { Go } from "./wasm_exec.js";"#),
        vec![
            TokenKind::Import,
            TokenKind::LBrace,
            ident("Go"),
            TokenKind::RBrace,
            TokenKind::From,
            string("./wasm_exec.js"),
            TokenKind::Semicolon,
        ]
    );
}

#[test]
fn test_declaration_keywords() {
    let pairs = [
        ("class", TokenKind::Class),
        ("function", TokenKind::Function),
        ("async", TokenKind::Async),
        ("const", TokenKind::Const),
        ("let", TokenKind::Let),
        ("var", TokenKind::Var),
    ];
    for (src, expected) in &pairs {
        assert_eq!(kinds(src), vec![expected.clone()], "keyword '{src}'");
        assert!(expected.is_declaration_keyword());
    }
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(kinds("exports"), vec![ident("exports")]);
    assert_eq!(kinds("classy"), vec![ident("classy")]);
    assert_eq!(kinds("$export"), vec![ident("$export")]);
}

#[test]
fn test_property_names_are_never_keywords() {
    assert_eq!(
        kinds("Uint8Array.from(x)"),
        vec![
            ident("Uint8Array"),
            TokenKind::Dot,
            ident("from"),
            TokenKind::LParen,
            ident("x"),
            TokenKind::RParen,
        ]
    );
    assert_eq!(
        kinds("instance.exports.export"),
        vec![
            ident("instance"),
            TokenKind::Dot,
            ident("exports"),
            TokenKind::Dot,
            ident("export"),
        ]
    );
}

#[test]
fn test_private_names() {
    assert_eq!(
        kinds("this.#instance"),
        vec![
            ident("this"),
            TokenKind::Dot,
            TokenKind::PrivateName("instance".to_string()),
        ]
    );
}

#[test]
fn test_non_ascii_identifier() {
    assert_eq!(kinds("const café = 1"), vec![
        TokenKind::Const,
        ident("café"),
        punct("="),
        TokenKind::NumberLit("1".to_string()),
    ]);
}

// ─────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_number_literals() {
    for src in ["42", "3.14", ".5", "0x1F", "1e-3", "2E+10", "10n", "1_000"] {
        assert_eq!(kinds(src), vec![TokenKind::NumberLit(src.to_string())], "{src}");
    }
}

#[test]
fn test_hex_number_does_not_swallow_minus() {
    assert_eq!(
        kinds("0x1e-5"),
        vec![
            TokenKind::NumberLit("0x1e".to_string()),
            punct("-"),
            TokenKind::NumberLit("5".to_string()),
        ]
    );
}

#[test]
fn test_strings_keep_raw_escapes() {
    assert_eq!(kinds(r#""a\"b""#), vec![string(r#"a\"b"#)]);
    assert_eq!(kinds(r"'it\'s'"), vec![string(r"it\'s")]);
    assert_eq!(kinds("'export { a };'"), vec![string("export { a };")]);
}

#[test]
fn test_string_line_continuation() {
    assert_eq!(kinds("'a\\\nb'"), vec![string("a\\\nb")]);
}

#[test]
fn test_plain_template() {
    assert_eq!(
        kinds("`line one\nexport class X {}`"),
        vec![TokenKind::Template("line one\nexport class X {}".to_string())]
    );
}

#[test]
fn test_template_substitutions() {
    assert_eq!(
        kinds("`${key}=${value}`"),
        vec![
            TokenKind::TemplateStart(String::new()),
            TokenKind::InterpolationStart,
            ident("key"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplatePart("=".to_string()),
            TokenKind::InterpolationStart,
            ident("value"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd(String::new()),
        ]
    );
}

#[test]
fn test_template_substitution_with_object_literal() {
    assert_eq!(
        kinds("`${ {a: 1}.a }`"),
        vec![
            TokenKind::TemplateStart(String::new()),
            TokenKind::InterpolationStart,
            TokenKind::LBrace,
            ident("a"),
            punct(":"),
            TokenKind::NumberLit("1".to_string()),
            TokenKind::RBrace,
            TokenKind::Dot,
            ident("a"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd(String::new()),
        ]
    );
}

#[test]
fn test_nested_templates() {
    let k = kinds("`a${`b${c}`}d`");
    assert_eq!(
        k,
        vec![
            TokenKind::TemplateStart("a".to_string()),
            TokenKind::InterpolationStart,
            TokenKind::TemplateStart("b".to_string()),
            TokenKind::InterpolationStart,
            ident("c"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd(String::new()),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("d".to_string()),
        ]
    );
}

#[test]
fn test_escaped_backtick_and_dollar_in_template() {
    assert_eq!(
        kinds(r"`\`\${x}`"),
        vec![TokenKind::Template(r"\`\${x}".to_string())]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Regex vs. division
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_division_after_identifier() {
    assert_eq!(
        kinds("a / b / c"),
        vec![
            ident("a"),
            TokenKind::Slash,
            ident("b"),
            TokenKind::Slash,
            ident("c"),
        ]
    );
}

#[test]
fn test_regex_after_operator() {
    assert_eq!(
        kinds(r#"x = /"[a/]"/g"#),
        vec![
            ident("x"),
            punct("="),
            TokenKind::RegexLit(r#"/"[a/]"/g"#.to_string()),
        ]
    );
}

#[test]
fn test_regex_after_return() {
    assert_eq!(
        kinds("return /'/.test(s)")[1],
        TokenKind::RegexLit("/'/".to_string())
    );
}

#[test]
fn test_division_after_paren_and_postfix() {
    assert_eq!(kinds("(a) / 2")[3], TokenKind::Slash);
    assert_eq!(kinds("i++ / 2")[2], TokenKind::Slash);
    assert_eq!(kinds("x /= 2")[1], TokenKind::Slash);
}

#[test]
fn test_division_after_contextual_keyword() {
    assert_eq!(kinds("from / 2")[1], TokenKind::Slash);
    assert_eq!(kinds("as / 2")[1], TokenKind::Slash);
    assert_eq!(kinds("async / 2")[1], TokenKind::Slash);
    assert_eq!(kinds("let / 2")[1], TokenKind::Slash);
    assert!(error_codes("const from = 4;\nconst half = from / 2;\n").is_empty());
}

// ─────────────────────────────────────────────────────────────────────
// Comments & whitespace
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        kinds("// export class A {}\n/* export { a };\n */ let a"),
        vec![TokenKind::Let, ident("a")]
    );
}

#[test]
fn test_hashbang_is_skipped() {
    assert_eq!(
        kinds("#!/usr/bin/env node\nconst x = 1;"),
        vec![
            TokenKind::Const,
            ident("x"),
            punct("="),
            TokenKind::NumberLit("1".to_string()),
            TokenKind::Semicolon,
        ]
    );
}

#[test]
fn test_hash_not_at_start_is_punct() {
    assert_eq!(kinds("a #"), vec![ident("a"), punct("#")]);
}

#[test]
fn test_byte_order_mark_is_skipped() {
    let sf = SourceFile::new("bom.js", "\u{feff}export const a = 1;");
    let result = Lexer::new(&sf).lex();
    assert_eq!(result.tokens[0].kind, TokenKind::Export);
    assert!(result.tokens[0].at_line_start());
}

#[test]
fn test_operators() {
    assert_eq!(
        kinds("a ** b *= c ... d?.e => f"),
        vec![
            ident("a"),
            punct("**"),
            ident("b"),
            punct("*="),
            ident("c"),
            punct("..."),
            ident("d"),
            punct("?"),
            TokenKind::Dot,
            ident("e"),
            punct("="),
            punct(">"),
            ident("f"),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unterminated_string_error() {
    assert_eq!(
        error_codes("const a = \"abc\nconst b = 1;"),
        vec![ErrorCode::UNTERMINATED_STRING]
    );
}

#[test]
fn test_unterminated_template_error() {
    assert_eq!(
        error_codes("const a = `abc"),
        vec![ErrorCode::UNTERMINATED_TEMPLATE]
    );
    assert_eq!(
        error_codes("const a = `abc${x"),
        vec![ErrorCode::UNTERMINATED_TEMPLATE]
    );
    assert_eq!(
        error_codes("const a = `abc${x}def"),
        vec![ErrorCode::UNTERMINATED_TEMPLATE]
    );
}

#[test]
fn test_unterminated_comment_error() {
    assert_eq!(
        error_codes("let a; /* never closed"),
        vec![ErrorCode::UNTERMINATED_COMMENT]
    );
}

#[test]
fn test_unterminated_regex_error() {
    assert_eq!(
        error_codes("x = /abc\ny"),
        vec![ErrorCode::UNTERMINATED_REGEX]
    );
}

#[test]
fn test_error_recovery_continues() {
    let sf = SourceFile::new("test.js", "'a\n'b\nlet c");
    let result = Lexer::new(&sf).lex();
    assert_eq!(result.errors.total_errors, 2);
    assert!(result
        .tokens
        .iter()
        .any(|t| t.kind == TokenKind::Let));
}

#[test]
fn test_error_carries_source_line() {
    let sf = SourceFile::new("wasm_exec.js", "ok();\nbad('x\n");
    let result = Lexer::new(&sf).lex();
    let err = &result.errors.errors[0];
    assert_eq!(err.file, "wasm_exec.js");
    assert_eq!(err.span.line, 2);
    assert_eq!(err.span.col, 5);
    assert_eq!(err.source_line, "bad('x");
}

#[test]
fn test_max_errors_cap() {
    let source = "'\n".repeat(30);
    let sf = SourceFile::new("test.js", source);
    let result = Lexer::new(&sf).lex();
    assert_eq!(result.errors.total_errors, wasmscript_types::MAX_DIAGNOSTICS);
    assert_eq!(result.tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
}

// ─────────────────────────────────────────────────────────────────────
// Stream shape & spans
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_eof_on_empty_source() {
    let sf = SourceFile::new("test.js", "");
    let result = Lexer::new(&sf).lex();
    assert_eq!(result.tokens.len(), 1);
    assert_eq!(result.tokens[0].kind, TokenKind::Eof);
}

#[test]
fn test_span_positions() {
    let src = "let a;\n  export class Go {}";
    let sf = SourceFile::new("test.js", src);
    let tokens = Lexer::new(&sf).lex().tokens;

    let export = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Export)
        .expect("export token");
    assert_eq!(export.span.line, 2);
    assert_eq!(export.span.col, 3);
    assert_eq!(export.span.text(src), "export");
    assert!(!export.at_line_start());

    let class = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Class)
        .expect("class token");
    assert_eq!(class.span.start, 16);
    assert_eq!(class.span.end, 21);
}

#[test]
fn test_string_span_covers_quotes() {
    let src = r#"from "./x.js""#;
    let sf = SourceFile::new("test.js", src);
    let tokens = Lexer::new(&sf).lex().tokens;
    assert_eq!(tokens[1].span.text(src), r#""./x.js""#);
}

#[test]
fn test_lexer_determinism_100_iterations() {
    let source = "export class Go {\n  #x = `a${b}c`;\n  run() { return /x/.test(this.#x) / 2; }\n}\n";
    let first = kinds(source);
    for i in 0..100 {
        assert_eq!(kinds(source), first, "Determinism failure at iteration {i}");
    }
}
