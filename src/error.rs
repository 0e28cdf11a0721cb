//! Error types for encoding detection and parsing
//!
//! Strict-mode tokenizer errors carry the line and column where the parse
//! stopped. HTML mode has no fatal tag/attribute errors; its only fatal
//! condition is a byte stream too short for encoding sniffing.

use thiserror::Error;

/// Errors produced by the encoding detector and the tokenizer.
#[derive(Debug, Error)]
pub enum Error {
    /// Fewer than 4 bytes were available for encoding sniffing.
    #[error("insufficient length: at least 4 bytes are needed to sniff the encoding")]
    TruncatedStream,

    /// A sniffed or declared encoding this crate cannot decode.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// The input is not a valid byte sequence for its encoding.
    #[error("malformed {0} byte sequence")]
    MalformedInput(&'static str),

    /// Strict-mode attribute grammar violation.
    #[error("error in attribute processing (line {line}, column {column})")]
    AttributeSyntax { line: usize, column: usize },

    /// A self-closing tag was not terminated by `>`.
    #[error("expected > for tag: <{tag}/> (line {line}, column {column})")]
    ExpectedGtForTag {
        tag: String,
        line: usize,
        column: usize,
    },

    /// Strict mode reached end of input with unbalanced elements.
    #[error("missing end tag (line {line}, column {column})")]
    UnexpectedEndOfInput { line: usize, column: usize },

    /// I/O failure while draining a reader.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Line/column of a positioned parse error, if this error carries one.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Error::AttributeSyntax { line, column }
            | Error::ExpectedGtForTag { line, column, .. }
            | Error::UnexpectedEndOfInput { line, column } => Some((*line, *column)),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
