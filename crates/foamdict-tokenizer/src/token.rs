//! Token types for the dictionary tokenizer.

use crate::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `;`
    Semi,

    // Words and literals
    /// Bare word: `solver`, `div(phi,U)`, `W/m/K`
    Ident,
    /// Double quoted string, quotes included: `"constant/polyMesh"`
    String,
    /// Single quoted character constant: `'a'`
    Char,
    /// Integer constant, optional sign and C suffix: `-3`, `10UL`
    Int,
    /// Floating point constant: `1e-06`, `0.5`, `2.`
    Float,
    /// Macro reference: `$name`, `${name}`, `$.name`, `$..name`, `$:name`
    Macro,

    // Directives
    /// Hash-prefixed directive name: `#include`, `#remove`, `#eval`
    Directive,
    /// `#codeStream`
    CodeStream,
    /// `#calc`
    Calc,
    /// Foreign code block `#{ ... #}`, markers included
    CodeBlock,
    /// Brace balanced block following `#eval`: `{ ... }`
    RawBlock,

    // Keywords
    /// `List<T>` template tag
    ListType,
    /// `dimensions`
    Dimensions,
    /// `uniform`
    Uniform,
    /// `nonuniform`
    NonUniform,
    /// Bare `List`
    List,
}

impl TokenKind {
    /// Whether this token is one of the reserved keywords.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Dimensions | TokenKind::Uniform | TokenKind::NonUniform | TokenKind::List
        )
    }

    /// Whether this token can serve as a dictionary key.
    pub fn is_key(&self) -> bool {
        matches!(self, TokenKind::Ident | TokenKind::String) || self.is_keyword()
    }

    /// Whether this token is a numeric constant.
    pub fn is_number(&self) -> bool {
        matches!(self, TokenKind::Int | TokenKind::Float)
    }

    /// Short description used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Semi => "';'",
            TokenKind::Ident => "identifier",
            TokenKind::String => "string literal",
            TokenKind::Char => "character constant",
            TokenKind::Int => "integer",
            TokenKind::Float => "number",
            TokenKind::Macro => "macro reference",
            TokenKind::Directive => "directive",
            TokenKind::CodeStream => "#codeStream",
            TokenKind::Calc => "#calc",
            TokenKind::CodeBlock => "code block",
            TokenKind::RawBlock => "#eval block",
            TokenKind::ListType => "List<T>",
            TokenKind::Dimensions => "'dimensions'",
            TokenKind::Uniform => "'uniform'",
            TokenKind::NonUniform => "'nonuniform'",
            TokenKind::List => "'List'",
        }
    }
}

/// A token with its kind, span, position and source text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in the source text.
    pub span: Span,
    /// The source text of this token.
    pub text: &'src str,
    /// 1-based line of the first character.
    pub line: u32,
    /// 1-based column of the first character.
    pub column: u32,
    /// For [`TokenKind::CodeBlock`], the leading whitespace width of the line
    /// holding the closing `#}` marker. Zero for every other kind.
    pub indent: u32,
}

impl<'src> Token<'src> {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: &'src str, line: u32, column: u32) -> Self {
        Self {
            kind,
            span,
            text,
            line,
            column,
            indent: 0,
        }
    }

    /// Integer value of an [`TokenKind::Int`] token, C suffix stripped.
    ///
    /// Returns `None` for other kinds or when the literal overflows `i64`.
    pub fn int_value(&self) -> Option<i64> {
        if self.kind != TokenKind::Int {
            return None;
        }
        let digits = self.text.trim_end_matches(['u', 'U', 'l', 'L']);
        let digits = digits.strip_prefix('+').unwrap_or(digits);
        digits.parse().ok()
    }

    /// Floating point value of a numeric token, suffix stripped.
    pub fn float_value(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Float => self
                .text
                .trim_end_matches(['f', 'F', 'l', 'L'])
                .parse()
                .ok(),
            TokenKind::Int => self.int_value().map(|v| v as f64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, text: &str) -> Token<'_> {
        Token::new(kind, Span::new(0, text.len() as u32), text, 1, 1)
    }

    #[test]
    fn test_int_suffix_is_ignored() {
        assert_eq!(tok(TokenKind::Int, "10UL").int_value(), Some(10));
        assert_eq!(tok(TokenKind::Int, "-3").int_value(), Some(-3));
        assert_eq!(tok(TokenKind::Int, "+7ll").int_value(), Some(7));
    }

    #[test]
    fn test_float_value() {
        assert_eq!(tok(TokenKind::Float, "1e-06").float_value(), Some(1e-6));
        assert_eq!(tok(TokenKind::Float, "2.").float_value(), Some(2.0));
        assert_eq!(tok(TokenKind::Float, "0.5f").float_value(), Some(0.5));
        assert_eq!(tok(TokenKind::Int, "4").float_value(), Some(4.0));
        assert_eq!(tok(TokenKind::Ident, "four").float_value(), None);
    }

    #[test]
    fn test_keys() {
        assert!(TokenKind::Ident.is_key());
        assert!(TokenKind::String.is_key());
        assert!(TokenKind::Uniform.is_key());
        assert!(!TokenKind::Macro.is_key());
        assert!(!TokenKind::Int.is_key());
    }
}
