//! A tokenizer for OpenFOAM/Caelus dictionary files.
//!
//! The tokenizer is a fail-fast scanner: comments and whitespace are consumed
//! silently, every token carries a 1-based line and column, and the first
//! malformed construct ends the stream with a [`LexError`].

mod error;
pub use error::LexError;

mod span;
pub use span::Span;

mod token;
pub use token::{Token, TokenKind};

mod tokenizer;
pub use tokenizer::Tokenizer;
