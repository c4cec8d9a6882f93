use log::debug;
use serde::Serialize;
use std::fmt;
use std::ops::Range;

use crate::error::line_of;

/// The different kinds of tokens recognized by the Quill scanner.
///
/// Tokens carry no payload: literal and identifier text is recovered by
/// slicing the source with the token's [`Span`].
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// ';'
    SEMICOLON,

    /// ':'
    COLON,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// '&'
    AMPERSAND,

    /// '&&'
    AND,

    /// '|'
    PIPE,

    /// '||'
    OR,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal; the span excludes the quotes
    STRING,

    /// A numeric literal
    NUMBER,

    /// 'class'
    CLASS,

    /// 'if'
    IF,

    /// 'else'
    ELSE,

    /// 'while'
    WHILE,

    /// 'for'
    FOR,

    /// 'nil'
    NIL,

    /// 'return'
    RETURN,

    /// 'this'
    THIS,

    /// 'base'
    BASE,

    /// 'var'
    VAR,

    /// 'function'
    FUNCTION,

    /// 'true'
    TRUE,

    /// 'false'
    FALSE,

    /// End‑of‑file marker
    EOF,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug already prints the bare variant name.
        fmt::Debug::fmt(self, f)
    }
}

/// Half‑open byte range `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A scanned token: its kind plus where it sits in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    /// The category of this token.
    pub kind: TokenKind,

    /// Byte range of the lexeme in the source.
    pub span: Span,
}

impl Token {
    /// Create a new Token with the given kind and byte range.
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        debug!("Creating new token: kind={:?}, span={}..{}", kind, start, end);

        Self {
            kind,
            span: Span::new(start, end),
        }
    }

    /// Zero‑width end marker positioned at `offset`.
    pub fn eof(offset: usize) -> Self {
        Self {
            kind: TokenKind::EOF,
            span: Span::new(offset, offset),
        }
    }

    /// The exact substring of `source` this token covers.
    ///
    /// Tokens are only meaningful against the source they were scanned from;
    /// an out‑of‑range span yields the empty string.
    #[inline]
    pub fn lexeme<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.span.range()).unwrap_or("")
    }

    /// 1‑based line of the token's first byte.
    pub fn line(&self, source: &str) -> usize {
        line_of(source, self.span.start)
    }

    /// `KIND 'lexeme'` rendering used by the `tokenize` command.
    pub fn describe(&self, source: &str) -> String {
        format!("{} '{}'", self.kind, self.lexeme(source))
    }
}
