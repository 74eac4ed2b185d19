//! Lexical errors.

use crate::Span;

/// A fatal error raised while scanning the input.
///
/// Line and column are 1-based and point at the first character of the
/// construct that could not be scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Human readable description.
    pub message: String,
    /// Line of the offending construct.
    pub line: u32,
    /// Column of the offending construct.
    pub column: u32,
    /// Byte range of the offending construct.
    pub span: Span,
}

impl LexError {
    /// Create a new lex error.
    pub fn new(message: impl Into<String>, line: u32, column: u32, span: Span) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            span,
        }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for LexError {}
