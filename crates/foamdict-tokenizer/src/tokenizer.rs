//! Tokenizer for OpenFOAM/Caelus dictionary files.

use crate::{LexError, Span, Token, TokenKind};
use tracing::trace;

/// Callback invoked with every lexical error before it is returned.
type ErrorHandler<'src> = Box<dyn FnMut(&LexError) + 'src>;

/// A tokenizer that produces tokens from dictionary source text.
///
/// The tokenizer is an iterator over `Result<Token, LexError>`. After the
/// first error it yields `None`: there is no recovery.
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
    /// Current 1-based line.
    line: u32,
    /// Byte offset of the first character of the current line.
    line_start: u32,
    /// Set after an `#eval` directive: a following `{` opens a raw block.
    eval_pending: bool,
    /// Set after end of input or the first error.
    done: bool,
    on_error: Option<ErrorHandler<'src>>,
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
            line: 1,
            line_start: 0,
            eval_pending: false,
            done: false,
            on_error: None,
        }
    }

    /// Install a callback that observes lexical errors.
    ///
    /// The callback runs once, with the error that ends the stream, before the
    /// error is handed to the consumer.
    pub fn with_error_handler(mut self, handler: impl FnMut(&LexError) + 'src) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Get the current byte position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Get the current 1-based line.
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// 1-based column of the current position.
    #[inline]
    fn column(&self) -> u32 {
        self.pos - self.line_start + 1
    }

    /// Peek at the next character without consuming it.
    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at the nth character (0-indexed) without consuming.
    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    /// Advance by one character and return it.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    /// Advance by n bytes, keeping line tracking exact.
    fn advance_by(&mut self, n: usize) {
        let skipped = &self.remaining[..n];
        for (offset, byte) in skipped.bytes().enumerate() {
            if byte == b'\n' {
                self.line += 1;
                self.line_start = self.pos + offset as u32 + 1;
            }
        }
        self.pos += n as u32;
        self.remaining = &self.remaining[n..];
    }

    /// Rewind to an earlier position on the current line.
    fn rewind_to(&mut self, pos: u32) {
        debug_assert!(pos >= self.line_start && pos <= self.pos);
        self.pos = pos;
        self.remaining = &self.source[pos as usize..];
    }

    /// Check if the remaining text starts with the given prefix.
    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Create a token from the given start position to current position.
    fn token(&self, kind: TokenKind, start: u32, line: u32, column: u32) -> Token<'src> {
        let span = Span::new(start, self.pos);
        let text = &self.source[start as usize..self.pos as usize];
        trace!("Token {:?} at {}:{}: {:?}", kind, line, column, text);
        Token::new(kind, span, text, line, column)
    }

    fn error(&self, message: impl Into<String>, start: u32, line: u32, column: u32) -> LexError {
        LexError::new(message, line, column, Span::new(start, self.pos.max(start)))
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    self.advance();
                }
                Some('/') if self.starts_with("//") => {
                    let end = self.remaining.find('\n').unwrap_or(self.remaining.len());
                    self.advance_by(end);
                }
                Some('/') if self.starts_with("/*") => {
                    let (start, line, column) = (self.pos, self.line, self.column());
                    match self.remaining[2..].find("*/") {
                        Some(end) => self.advance_by(end + 4),
                        None => {
                            self.advance_by(self.remaining.len());
                            return Err(self.error(
                                "Unmatched multi-line comment",
                                start,
                                line,
                                column,
                            ));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Get the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Result<Token<'src>, LexError>> {
        if let Err(e) = self.skip_trivia() {
            return Some(Err(e));
        }
        let c = self.peek()?;

        let start = self.pos;
        let (line, column) = (self.line, self.column());

        if std::mem::take(&mut self.eval_pending) && c == '{' {
            return Some(self.tokenize_raw_block(start, line, column));
        }

        let single = |tok: &mut Self, kind: TokenKind| -> Result<Token<'src>, LexError> {
            tok.advance();
            Ok(tok.token(kind, start, line, column))
        };

        let result = match c {
            '(' => single(self, TokenKind::LParen),
            ')' => single(self, TokenKind::RParen),
            '[' => single(self, TokenKind::LBracket),
            ']' => single(self, TokenKind::RBracket),
            '{' => single(self, TokenKind::LBrace),
            '}' => single(self, TokenKind::RBrace),
            ';' => single(self, TokenKind::Semi),

            '"' => self.tokenize_string(start, line, column),
            '\'' => self.tokenize_char(start, line, column),

            '#' if self.peek_nth(1) == Some('{') => self.tokenize_code_block(start, line, column),
            '#' if matches!(self.peek_nth(1), Some(c) if is_directive_char(c)) => {
                Ok(self.tokenize_directive(start, line, column))
            }

            '$' => self.tokenize_macro(start, line, column),

            _ if self.at_number_start() => Ok(self.tokenize_number(start, line, column)),

            'L' if self.list_type_len().is_some() => {
                let len = self.list_type_len().unwrap_or_default();
                self.advance_by(len);
                Ok(self.token(TokenKind::ListType, start, line, column))
            }

            _ if is_ident_start(c) => Ok(self.tokenize_ident(start, line, column)),

            _ => {
                self.advance();
                Err(self.error(format!("Illegal character {c:?}"), start, line, column))
            }
        };
        Some(result)
    }

    /// Length of a `List<T>` tag at the current position.
    fn list_type_len(&self) -> Option<usize> {
        let rest = self.remaining.strip_prefix("List<")?;
        let name_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        (name_len > 0 && rest[name_len..].starts_with('>')).then_some(5 + name_len + 1)
    }

    /// Whether a numeric literal starts at the current position.
    fn at_number_start(&self) -> bool {
        let mut chars = self.remaining.chars();
        let mut c = chars.next();
        if matches!(c, Some('+' | '-')) {
            c = chars.next();
        }
        match c {
            Some(d) if d.is_ascii_digit() => true,
            Some('.') => matches!(chars.next(), Some(d) if d.is_ascii_digit()),
            _ => false,
        }
    }

    /// Consume a run of ASCII digits, returning how many were consumed.
    fn eat_digits(&mut self) -> usize {
        let n = self
            .remaining
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.remaining.len());
        self.advance_by(n);
        n
    }

    fn tokenize_number(&mut self, start: u32, line: u32, column: u32) -> Token<'src> {
        if matches!(self.peek(), Some('+' | '-')) {
            self.advance();
        }
        let int_digits = self.eat_digits();
        let mut is_float = false;

        if self.peek() == Some('.') {
            let digit_follows = matches!(self.peek_nth(1), Some(d) if d.is_ascii_digit());
            if int_digits > 0 || digit_follows {
                self.advance();
                self.eat_digits();
                is_float = true;
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent = match self.peek_nth(1) {
                Some(d) if d.is_ascii_digit() => true,
                Some('+' | '-') => matches!(self.peek_nth(2), Some(d) if d.is_ascii_digit()),
                _ => false,
            };
            if exponent {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.eat_digits();
                is_float = true;
            }
        }

        if is_float {
            if matches!(self.peek(), Some('f' | 'F' | 'l' | 'L')) {
                self.advance();
            }
            self.token(TokenKind::Float, start, line, column)
        } else {
            // C integer suffixes: u, l, ul, ll, ull and their capitalizations.
            let mut suffix = 0;
            while suffix < 3 && matches!(self.peek(), Some('u' | 'U' | 'l' | 'L')) {
                self.advance();
                suffix += 1;
            }
            self.token(TokenKind::Int, start, line, column)
        }
    }

    /// Scan word characters, stopping at delimiters, whitespace and comments.
    ///
    /// Parentheses are allowed inside words (`div(phi,U)`) as long as they
    /// balance; a word that leaves a `(` open is cut back to that `(`.
    fn scan_word(&mut self) {
        let mut depth = 0u32;
        let mut first_open = None;
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' | '"' | ';' | '{' | '}' | '[' | ']' => break,
                '/' if matches!(self.peek_nth(1), Some('/' | '*')) => break,
                '(' => {
                    if depth == 0 {
                        first_open = Some(self.pos);
                    }
                    depth += 1;
                }
                ')' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
        if depth > 0 {
            if let Some(open) = first_open {
                self.rewind_to(open);
            }
        }
    }

    fn tokenize_ident(&mut self, start: u32, line: u32, column: u32) -> Token<'src> {
        self.scan_word();
        let text = &self.source[start as usize..self.pos as usize];
        let kind = keyword(text).unwrap_or(TokenKind::Ident);
        self.token(kind, start, line, column)
    }

    fn tokenize_directive(&mut self, start: u32, line: u32, column: u32) -> Token<'src> {
        self.advance(); // #
        let n = self
            .remaining
            .find(|c: char| !is_directive_char(c))
            .unwrap_or(self.remaining.len());
        self.advance_by(n);
        let kind = match &self.source[start as usize + 1..self.pos as usize] {
            "codeStream" => TokenKind::CodeStream,
            "calc" => TokenKind::Calc,
            "eval" => {
                self.eval_pending = true;
                TokenKind::Directive
            }
            _ => TokenKind::Directive,
        };
        self.token(kind, start, line, column)
    }

    fn tokenize_macro(
        &mut self,
        start: u32,
        line: u32,
        column: u32,
    ) -> Result<Token<'src>, LexError> {
        self.advance(); // $
        if self.peek() == Some('{') {
            let mut depth = 0u32;
            while let Some(c) = self.peek() {
                match c {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    ' ' | '\t' | '\r' | '\n' | ';' | '"' => break,
                    _ => {}
                }
                self.advance();
                if depth == 0 {
                    return Ok(self.token(TokenKind::Macro, start, line, column));
                }
            }
            return Err(self.error("Unmatched '{' in macro reference", start, line, column));
        }

        let sigils = self
            .remaining
            .find(|c| !matches!(c, '.' | ':' | '/'))
            .unwrap_or(self.remaining.len());
        self.advance_by(sigils);
        let body_start = self.pos;
        self.scan_word();
        if self.pos == body_start && sigils == 0 {
            return Err(self.error("Illegal character '$'", start, line, column));
        }
        Ok(self.token(TokenKind::Macro, start, line, column))
    }

    fn tokenize_string(
        &mut self,
        start: u32,
        line: u32,
        column: u32,
    ) -> Result<Token<'src>, LexError> {
        self.advance(); // opening quote
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return Ok(self.token(TokenKind::String, start, line, column));
                }
                None | Some('\n') => {
                    return Err(self.error("Unmatched '\"'", start, line, column));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some(c) if is_escape_char(c) => {
                            self.advance();
                        }
                        _ => {
                            self.skip_to_line_end_or('"');
                            return Err(self.error(
                                "String contains invalid escape code",
                                start,
                                line,
                                column,
                            ));
                        }
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Advance up to and including `close`, stopping before a newline.
    fn skip_to_line_end_or(&mut self, close: char) -> bool {
        while let Some(c) = self.peek() {
            if c == '\n' {
                return false;
            }
            self.advance();
            if c == close {
                return true;
            }
        }
        false
    }

    fn tokenize_char(
        &mut self,
        start: u32,
        line: u32,
        column: u32,
    ) -> Result<Token<'src>, LexError> {
        self.advance(); // opening quote
        let valid = match self.peek() {
            None | Some('\n') => {
                return Err(self.error("Unmatched '", start, line, column));
            }
            Some('\'') => false,
            Some('\\') => {
                self.advance();
                match self.peek() {
                    Some(c) if is_escape_char(c) => {
                        self.advance();
                        true
                    }
                    _ => false,
                }
            }
            Some(_) => {
                self.advance();
                true
            }
        };

        if valid && self.peek() == Some('\'') {
            self.advance();
            return Ok(self.token(TokenKind::Char, start, line, column));
        }
        if self.skip_to_line_end_or('\'') {
            let text = &self.source[start as usize..self.pos as usize];
            Err(self.error(format!("Invalid char constant {text}"), start, line, column))
        } else {
            Err(self.error("Unmatched '", start, line, column))
        }
    }

    fn tokenize_code_block(
        &mut self,
        start: u32,
        line: u32,
        column: u32,
    ) -> Result<Token<'src>, LexError> {
        let Some(end) = self.remaining[2..].find("#}") else {
            self.advance_by(self.remaining.len());
            return Err(self.error("Unmatched code block", start, line, column));
        };
        let body = &self.remaining[..end + 2];
        let indent = match body.rfind('\n') {
            Some(nl) => body[nl + 1..]
                .chars()
                .take_while(|c| matches!(c, ' ' | '\t'))
                .count() as u32,
            None => 0,
        };
        self.advance_by(end + 4);
        let mut token = self.token(TokenKind::CodeBlock, start, line, column);
        token.indent = indent;
        Ok(token)
    }

    /// Brace balanced `{ ... }` payload of an `#eval` directive.
    fn tokenize_raw_block(
        &mut self,
        start: u32,
        line: u32,
        column: u32,
    ) -> Result<Token<'src>, LexError> {
        let mut depth = 0u32;
        while let Some(c) = self.advance() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.token(TokenKind::RawBlock, start, line, column));
                    }
                }
                _ => {}
            }
        }
        Err(self.error("Unmatched '{' in #eval block", start, line, column))
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Result<Token<'src>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Some(Ok(token)) => Some(Ok(token)),
            Some(Err(e)) => {
                self.done = true;
                if let Some(handler) = self.on_error.as_mut() {
                    handler(&e);
                }
                Some(Err(e))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Tokenizer<'_> {}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_directive_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Characters allowed after a backslash inside string and char literals.
fn is_escape_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '.' | '_' | '~' | '^' | '!' | '=' | '&' | '-' | '\\' | '?' | '\'' | '"'
        )
}

fn keyword(text: &str) -> Option<TokenKind> {
    const KEYWORDS: [(&str, TokenKind); 4] = [
        ("dimensions", TokenKind::Dimensions),
        ("uniform", TokenKind::Uniform),
        ("nonuniform", TokenKind::NonUniform),
        ("list", TokenKind::List),
    ];
    KEYWORDS
        .iter()
        .find(|(kw, _)| text.eq_ignore_ascii_case(kw))
        .map(|(_, kind)| *kind)
}
