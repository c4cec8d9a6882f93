//! Module `scanner` implements a one‑pass lexer for the Quill language.
//!
//! It transforms source text into a flat sequence of [`Token`]s (kind + byte
//! span), skipping whitespace and `#` comments, and emitting exactly one `EOF`
//! token at the end. Lexing is all‑or‑nothing: an unterminated string or a
//! malformed number aborts the whole scan.
//!
//! # Public API
//!
//! - `scan(source) -> Result<Vec<Token>>`
//!   Scan everything, failing on the first lex error.
//!
//! - `Scanner::new(source)` + `impl Iterator`
//!   Yields `Result<Token>`; stops after the first error or after `EOF`.
//!
//! - `is_match`, `comment_length`, `string_length`, `number_length`,
//!   `other_length`
//!   The length helpers the scanner dispatches to, exposed for hosts and
//!   tests.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `+`, `-`, `*`,
//!   `/`, `;`, `:`.
//! - Two‑character operators: `!=`, `==`, `<=`, `>=`, `&&`, `||`, accepted
//!   only when followed by a separator or end of input; otherwise the single
//!   character (`!`, `=`, `<`, `>`, `&`, `|`) is emitted.
//! - String literals: `"` … `"`, may span lines; the span excludes the quotes.
//! - Numeric literals: digits with at most one fractional part.
//! - Anything else: a run of non‑separator bytes, classified afterwards as a
//!   keyword (perfect‑hash `KEYWORDS` map) or an identifier.
//!
//! # Example
//!
//! ```rust
//! use quill::scanner::scan;
//! use quill::token::TokenKind;
//!
//! let tokens = scan("var x = 1; # comment").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::VAR);
//! assert_eq!(tokens.last().unwrap().kind, TokenKind::EOF);
//! ```

use crate::error::{line_of, QuillError, Result};
use crate::token::{Token, TokenKind};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenKind> = phf_map! {
    b"class"    => TokenKind::CLASS,
    b"if"       => TokenKind::IF,
    b"else"     => TokenKind::ELSE,
    b"while"    => TokenKind::WHILE,
    b"for"      => TokenKind::FOR,
    b"nil"      => TokenKind::NIL,
    b"return"   => TokenKind::RETURN,
    b"this"     => TokenKind::THIS,
    b"base"     => TokenKind::BASE,
    b"var"      => TokenKind::VAR,
    b"function" => TokenKind::FUNCTION,
    b"true"     => TokenKind::TRUE,
    b"false"    => TokenKind::FALSE,
};

/// Bytes that terminate an identifier run and satisfy the operator boundary
/// check.
#[inline(always)]
pub fn is_separator(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'\t'
            | b'\r'
            | b'\n'
            | b'('
            | b')'
            | b'{'
            | b'}'
            | b','
            | b'.'
            | b'+'
            | b'-'
            | b'*'
            | b'/'
            | b'!'
            | b'='
            | b'<'
            | b'>'
            | b'&'
            | b'|'
            | b';'
            | b':'
            | b'#'
            | b'"'
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Length helpers. Each receives the remaining input starting at the first byte
// of the candidate lexeme.
// ─────────────────────────────────────────────────────────────────────────────

/// Does `src` start with `target`, followed by a separator or end of input?
pub fn is_match(src: &[u8], target: &[u8]) -> bool {
    if !src.starts_with(target) {
        return false;
    }

    src.len() == target.len() || is_separator(src[target.len()])
}

/// Length of a `#` comment, including its terminating newline if present.
pub fn comment_length(src: &[u8]) -> usize {
    match memchr(b'\n', src) {
        Some(pos) => pos + 1,
        None => src.len(),
    }
}

/// Length of a string literal including both quotes, or `None` when the
/// closing quote is missing.
pub fn string_length(src: &[u8]) -> Option<usize> {
    if src.len() < 2 {
        return None;
    }

    memchr(b'"', &src[1..]).map(|pos| pos + 2)
}

/// Length of a numeric literal, or `None` for a malformed number such as
/// `5.5.5` or `5..5`.
pub fn number_length(src: &[u8]) -> Option<usize> {
    let digit_at = |i: usize| src.get(i).is_some_and(u8::is_ascii_digit);
    let dot_at = |i: usize| src.get(i) == Some(&b'.');

    let mut i = 0;
    while digit_at(i) {
        i += 1;
    }

    if !dot_at(i) {
        return Some(i);
    }

    // A second '.' with a digit after it, right after the first one.
    if dot_at(i + 1) && digit_at(i + 2) {
        return None;
    }

    // A '.' belongs to the number only when a digit follows it.
    if !digit_at(i + 1) {
        return Some(i);
    }

    i += 1;
    while digit_at(i) {
        i += 1;
    }

    if dot_at(i) && digit_at(i + 1) {
        return None;
    }

    Some(i)
}

/// Length of a run of non‑separator bytes (identifier or keyword).
pub fn other_length(src: &[u8]) -> usize {
    src.iter()
        .position(|&b| is_separator(b))
        .unwrap_or(src.len())
}

/// Scan the whole of `source`. Fails on the first lex error.
pub fn scan(source: &str) -> Result<Vec<Token>> {
    info!("Scanning {} bytes", source.len());

    let tokens: Vec<Token> = Scanner::new(source).collect::<Result<Vec<_>>>()?;

    info!("Scanned {} tokens", tokens.len());

    Ok(tokens)
}

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s. Tokens hold byte spans into `src`, never text.
pub struct Scanner<'a> {
    source: &'a str,
    src: &'a [u8],  // same buffer, byte view
    curr: usize,    // index of the next unexamined byte
    finished: bool, // EOF emitted or error reported
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `source`.
    #[inline]
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            src: source.as_bytes(),
            curr: 0,
            finished: false,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    #[inline(always)]
    fn rest(&self) -> &'a [u8] {
        &self.src[self.curr..]
    }

    /// Pick the one‑ or two‑character operator starting at `curr`.
    #[inline(always)]
    fn operator(&self, pair: &[u8], double: TokenKind, single: TokenKind) -> (TokenKind, usize) {
        if is_match(self.rest(), pair) {
            (double, 2)
        } else {
            (single, 1)
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Classify the lexeme starting at `curr`. Returns `None` for comments,
    /// which are consumed but not emitted.
    fn scan_token(&mut self) -> Result<Option<Token>> {
        let start = self.curr;
        let rest = self.rest();

        let (kind, length) = match rest[0] {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => (TokenKind::LEFT_PAREN, 1),
            b')' => (TokenKind::RIGHT_PAREN, 1),
            b'{' => (TokenKind::LEFT_BRACE, 1),
            b'}' => (TokenKind::RIGHT_BRACE, 1),
            b',' => (TokenKind::COMMA, 1),
            b'.' => (TokenKind::DOT, 1),
            b'+' => (TokenKind::PLUS, 1),
            b'-' => (TokenKind::MINUS, 1),
            b'*' => (TokenKind::STAR, 1),
            b'/' => (TokenKind::SLASH, 1),
            b';' => (TokenKind::SEMICOLON, 1),
            b':' => (TokenKind::COLON, 1),

            // ── comments (# … through newline) ───────────────────────────
            b'#' => {
                self.curr += comment_length(rest);

                return Ok(None);
            }

            // ── one‑ or two‑character operators ──────────────────────────
            b'!' => self.operator(b"!=", TokenKind::BANG_EQUAL, TokenKind::BANG),
            b'=' => self.operator(b"==", TokenKind::EQUAL_EQUAL, TokenKind::EQUAL),
            b'<' => self.operator(b"<=", TokenKind::LESS_EQUAL, TokenKind::LESS),
            b'>' => self.operator(b">=", TokenKind::GREATER_EQUAL, TokenKind::GREATER),
            b'&' => self.operator(b"&&", TokenKind::AND, TokenKind::AMPERSAND),
            b'|' => self.operator(b"||", TokenKind::OR, TokenKind::PIPE),

            // ── string literal " … " ─────────────────────────────────────
            b'"' => {
                let Some(length) = string_length(rest) else {
                    return Err(QuillError::lex(
                        line_of(self.source, start),
                        "Unterminated string.",
                    ));
                };

                self.curr += length;

                // Span excludes the surrounding quotes.
                return Ok(Some(Token::new(
                    TokenKind::STRING,
                    start + 1,
                    start + length - 1,
                )));
            }

            // ── number literal (digit‑leading) ───────────────────────────
            b'0'..=b'9' => match number_length(rest) {
                Some(length) => (TokenKind::NUMBER, length),
                None => {
                    return Err(QuillError::lex(
                        line_of(self.source, start),
                        "Malformed number.",
                    ));
                }
            },

            // ── identifiers / keywords ───────────────────────────────────
            _ => {
                let length = other_length(rest);
                let kind = KEYWORDS
                    .get(&rest[..length])
                    .copied()
                    .unwrap_or(TokenKind::IDENTIFIER);

                (kind, length)
            }
        };

        self.curr += length;

        Ok(Some(Token::new(kind, start, start + length)))
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            // Skip insignificant whitespace.
            while !self.is_at_end() && matches!(self.src[self.curr], b' ' | b'\t' | b'\r' | b'\n')
            {
                self.curr += 1;
            }

            if self.is_at_end() {
                self.finished = true;

                return Some(Ok(Token::eof(self.src.len())));
            }

            match self.scan_token() {
                Ok(Some(token)) => {
                    debug!("Scanned {}", token.describe(self.source));

                    return Some(Ok(token));
                }

                // Comment consumed; keep going.
                Ok(None) => continue,

                Err(e) => {
                    self.finished = true;

                    return Some(Err(e));
                }
            }
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
