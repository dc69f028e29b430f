//! Error types for Shellbox

use thiserror::Error;

/// Result type alias using Shellbox's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Shellbox error types.
///
/// Lex and parse errors abort execution before any I/O. Filesystem errors
/// (`PathTraversal`, `AccessDenied`, `Io`) raised during redirect setup or
/// from within a builtin are caught per command and reported as an error
/// line on stderr with a non-zero exit code; they only reach the host when
/// raised outside a command context (e.g. direct [`crate::VirtualFs`] use).
#[derive(Error, Debug)]
pub enum Error {
    /// Lexical error (unterminated quote, unterminated substitution).
    #[error("lex error at {line}:{column}: {message}")]
    Lex {
        message: String,
        /// Byte offset into the source
        position: usize,
        line: usize,
        column: usize,
    },

    /// Parse error (unexpected token, missing redirect target).
    #[error("parse error: {message}")]
    Parse {
        message: String,
        /// Token index where the error was detected, when known
        position: Option<usize>,
    },

    /// A virtual path escaped the mount base.
    #[error("path traversal blocked: {0}")]
    PathTraversal(String),

    /// A permission rule denied the operation.
    #[error("access denied / {reason}: {path}")]
    AccessDenied {
        path: String,
        /// Either "excluded" or "read-only"
        reason: &'static str,
    },

    /// I/O error from the underlying byte store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A host-supplied redirect object cannot be used in this position.
    #[error("unsupported redirect object: {0}")]
    RedirectObject(String),

    /// Resource limit exceeded (substitution depth, loop iterations).
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),
}

impl Error {
    /// Build a lex error from a source position.
    pub(crate) fn lex(message: impl Into<String>, pos: crate::parser::Position) -> Self {
        Error::Lex {
            message: message.into(),
            position: pos.offset,
            line: pos.line,
            column: pos.column,
        }
    }

    /// Build a parse error without a token position.
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            position: None,
        }
    }

    /// Build a parse error at a token index.
    pub(crate) fn parse_at(message: impl Into<String>, position: usize) -> Self {
        Error::Parse {
            message: message.into(),
            position: Some(position),
        }
    }
}
