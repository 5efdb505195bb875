//! Error types for the IRC line grammar.
//!
//! Every failure is line-scoped: a [`ParseError`] describes why one line was
//! rejected and carries nothing that outlives the parse call.

use thiserror::Error;

use crate::scanner::TokenKind;

/// Convenience type alias for Results using [`ParseError`].
pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Reasons a line is rejected by the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The line ended (or hit the trailing clause) before a command token.
    #[error("missing command")]
    MissingCommand,

    /// The input ran out without a CR LF terminator.
    #[error("missing line terminator")]
    MissingTerminator,

    /// More middle parameters than the grammar allows.
    #[error("too many parameters (limit: {limit})")]
    TooManyParams {
        /// Maximum number of middle parameters.
        limit: usize,
    },

    /// A well-formed token arrived where the grammar does not allow it.
    #[error("unexpected {kind} at position {position}")]
    UnexpectedToken {
        /// Shape of the offending token.
        kind: TokenKind,
        /// Byte offset of the token in the line.
        position: usize,
    },

    /// A byte that cannot start any token (NUL, lone CR, bare LF).
    #[error("illegal byte {byte:#04x} at position {position}")]
    IllegalByte {
        /// The offending byte.
        byte: u8,
        /// Byte offset in the line.
        position: usize,
    },

    /// Bytes follow the CR LF terminator.
    #[error("data after line terminator at position {position}")]
    TrailingData {
        /// Byte offset of the first byte after the terminator.
        position: usize,
    },

    /// A token is not valid UTF-8.
    #[error("invalid UTF-8 at position {position}")]
    InvalidUtf8 {
        /// Byte offset where decoding failed.
        position: usize,
    },
}

impl ParseError {
    /// Get a static error code string for log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCommand => "missing_command",
            Self::MissingTerminator => "missing_terminator",
            Self::TooManyParams { .. } => "too_many_params",
            Self::UnexpectedToken { .. } => "unexpected_token",
            Self::IllegalByte { .. } => "illegal_byte",
            Self::TrailingData { .. } => "trailing_data",
            Self::InvalidUtf8 { .. } => "invalid_utf8",
        }
    }
}
