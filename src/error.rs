//! Centralised error hierarchy for the **Quill interpreter**.
//!
//! Every stage (scanner, parser, resolver, runtime, CLI) converts its failure
//! modes into one of the variants defined here. Lex and runtime errors are
//! terminal; parse and resolve errors are collected by their stage and handed
//! back as a list.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;
use memchr::memchr_iter;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuillError {
    /// Lexical (scanner) error: malformed number or unterminated string.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error. The offending declaration is dropped.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static scope error reported by the resolver.
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error. Terminates the run.
    #[error("[line {line}] Runtime error: {message}")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl QuillError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        QuillError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        QuillError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        QuillError::Resolve { message, line }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        QuillError::Runtime { message, line }
    }

    /// The bare diagnostic text, without the line prefix.
    pub fn message(&self) -> String {
        match self {
            QuillError::Lex { message, .. }
            | QuillError::Parse { message, .. }
            | QuillError::Resolve { message, .. }
            | QuillError::Runtime { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// 1‑based line number of byte `offset` in `source`.
pub fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());

    memchr_iter(b'\n', &source.as_bytes()[..end]).count() + 1
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, QuillError>;
