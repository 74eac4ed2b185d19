//! Recursive descent parser for dictionary files.
//!
//! ```text
//! file        := entry*
//! entry       := key '{' entry* '}' ';'?
//!              | key CODEBLOCK ';'
//!              | 'dimensions' dimension ';'
//!              | key item* ';'
//!              | DIRECTIVE item ';'?                 -> directive_NNN
//!              | MACRO ';'?                          -> macro_NNN
//!              | INT '(' list_item* ')' ';'?         -> boundary
//! item        := number | word | word dimension item | dimension item?
//!              | list | INT list | '{' entry* '}' | MACRO
//!              | 'uniform' (number | list | MACRO)?
//!              | 'nonuniform' (LISTTYPE list | INT list)
//!              | LISTTYPE (list | INT list)
//!              | '#codeStream' '{' (key CODEBLOCK ';')* '}'
//!              | '#calc' STRING | '#eval' (RAWBLOCK | CODEBLOCK | STRING)
//!              | DIRECTIVE item
//! list_item   := item | word '{' entry* '}'
//! ```

use std::iter::Peekable;

use foamdict_tokenizer::{Span, Token, TokenKind, Tokenizer};
use foamdict_tree::{
    CodeBlock, Dict, Dimension, Dimensioned, Directive, Field, FieldKind, MacroRef, TypedList,
    Value, infer_list,
};
use tracing::{debug, trace};

use crate::{Column, ParseError};

/// Parser for one dictionary source.
///
/// Synthetic key counters live on the parser, so every parse starts from
/// `directive_000` and `macro_000`.
pub struct Parser<'src> {
    tokens: Peekable<Tokenizer<'src>>,
    source: &'src str,
    source_name: String,
    /// Line of the last consumed token, reported for errors at end of input.
    last_line: u32,
    directive_counter: usize,
    macro_counter: usize,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source.
    pub fn new(source: &'src str, source_name: impl Into<String>) -> Self {
        Self {
            tokens: Tokenizer::new(source).peekable(),
            source,
            source_name: source_name.into(),
            last_line: 1,
            directive_counter: 0,
            macro_counter: 0,
        }
    }

    /// Parse the whole source into a dictionary.
    pub fn parse(mut self) -> Result<Dict, ParseError> {
        debug!("parsing {}", self.source_name);
        self.parse_entries(false)
    }

    /// Parse only the leading `FoamFile { ... }` header.
    ///
    /// Returns `None` when the source does not start with a header. Nothing
    /// after the header is read, so the source may be a truncated prefix of a
    /// larger file.
    pub fn parse_header(mut self) -> Result<Option<Dict>, ParseError> {
        match self.peek()? {
            Some(t) if t.kind == TokenKind::Ident && t.text == "FoamFile" => {}
            _ => return Ok(None),
        }
        self.advance()?;
        if !self.at(TokenKind::LBrace)? {
            return Ok(None);
        }
        self.advance()?;
        let header = self.parse_entries(true)?;
        Ok(Some(header))
    }

    fn lex_error(&self, error: foamdict_tokenizer::LexError) -> ParseError {
        ParseError::from_lex(error, self.source_name.clone())
    }

    fn peek(&mut self) -> Result<Option<Token<'src>>, ParseError> {
        match self.tokens.peek() {
            None => Ok(None),
            Some(Ok(token)) => Ok(Some(token.clone())),
            Some(Err(e)) => {
                let e = e.clone();
                Err(self.lex_error(e))
            }
        }
    }

    fn at(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        Ok(self.peek()?.is_some_and(|t| t.kind == kind))
    }

    fn advance(&mut self) -> Result<Token<'src>, ParseError> {
        match self.tokens.next() {
            Some(Ok(token)) => {
                self.last_line = token.line;
                Ok(token)
            }
            Some(Err(e)) => Err(self.lex_error(e)),
            None => Err(self.eof_error("Premature end of input")),
        }
    }

    /// Consume the next token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> Result<Option<Token<'src>>, ParseError> {
        if self.at(kind)? {
            self.advance().map(Some)
        } else {
            Ok(None)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        match self.peek()? {
            Some(t) if t.kind == kind => self.advance(),
            Some(t) => Err(self.unexpected(&t, kind.describe())),
            None => Err(self.eof_error(format!("expected {}", kind.describe()))),
        }
    }

    fn error_at(&self, token: &Token<'_>, message: impl Into<String>) -> ParseError {
        ParseError::new(
            message,
            self.source_name.clone(),
            token.line,
            Column::At(token.column),
            token.span,
        )
    }

    /// Integer or float value of a numeric token. Literals outside the range
    /// of `i64` or `f64` are errors.
    fn number(&self, token: &Token<'_>) -> Result<Value, ParseError> {
        let value = match token.kind {
            TokenKind::Int => token.int_value().map(Value::Int),
            _ => token
                .float_value()
                .filter(|x| x.is_finite())
                .map(Value::Float),
        };
        value.ok_or_else(|| self.error_at(token, "number out of range"))
    }

    fn unexpected(&self, token: &Token<'_>, expected: &str) -> ParseError {
        self.error_at(token, format!("expected {expected}, found {}", found(token)))
    }

    fn eof_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(
            message,
            self.source_name.clone(),
            self.last_line,
            Column::Eof,
            Span::empty(self.source.len() as u32),
        )
    }

    /// Parse entries up to end of input, or up to and including `}`.
    fn parse_entries(&mut self, nested: bool) -> Result<Dict, ParseError> {
        let mut dict = Dict::new();
        loop {
            let Some(token) = self.peek()? else {
                if nested {
                    return Err(self.eof_error("expected '}'"));
                }
                return Ok(dict);
            };

            match token.kind {
                TokenKind::RBrace if nested => {
                    self.advance()?;
                    return Ok(dict);
                }
                TokenKind::Directive => {
                    let directive = self.parse_directive()?;
                    self.eat(TokenKind::Semi)?;
                    let key = format!("directive_{:03}", self.directive_counter);
                    self.directive_counter += 1;
                    trace!("{key}: {}", directive.name);
                    dict.insert(key, Value::Directive(directive));
                }
                TokenKind::Macro => {
                    self.advance()?;
                    self.eat(TokenKind::Semi)?;
                    let key = format!("macro_{:03}", self.macro_counter);
                    self.macro_counter += 1;
                    trace!("{key}: {}", token.text);
                    dict.insert(key, Value::Macro(MacroRef::standalone(token.text)));
                }
                TokenKind::Int => {
                    let list = self.parse_counted_list()?;
                    self.eat(TokenKind::Semi)?;
                    trace!("boundary list");
                    dict.insert("boundary", Value::Boundary(Box::new(list)));
                }
                kind if kind.is_key() => {
                    let (key, value) = self.parse_keyed_entry()?;
                    trace!("entry {key}: {}", value.kind_name());
                    dict.insert(key, value);
                }
                _ => return Err(self.unexpected(&token, "a keyword")),
            }
        }
    }

    fn parse_keyed_entry(&mut self) -> Result<(String, Value), ParseError> {
        let key = self.advance()?;

        if key.kind == TokenKind::Dimensions && self.at(TokenKind::LBracket)? {
            let dims = self.parse_dimension()?;
            self.expect(TokenKind::Semi)?;
            return Ok((key.text.to_string(), Value::Dimension(dims)));
        }

        let Some(next) = self.peek()? else {
            return Err(self.eof_error(format!("expected a value for '{}'", key.text)));
        };
        let value = match next.kind {
            TokenKind::LBrace => {
                self.advance()?;
                let dict = self.parse_entries(true)?;
                self.eat(TokenKind::Semi)?;
                Value::Dict(dict)
            }
            TokenKind::CodeBlock => {
                self.advance()?;
                self.expect(TokenKind::Semi)?;
                Value::Code(code_block(&next))
            }
            TokenKind::Semi => {
                self.advance()?;
                Value::Empty
            }
            _ => self.parse_value_items()?,
        };
        Ok((key.text.to_string(), value))
    }

    /// Items following a keyword, up to and including the closing `;`.
    fn parse_value_items(&mut self) -> Result<Value, ParseError> {
        let mut items = Vec::new();
        loop {
            // `key word { ... }` may end at the closing brace.
            if matches!(items.last(), Some(Value::Dict(_))) {
                self.eat(TokenKind::Semi)?;
                break;
            }
            let Some(t) = self.peek()? else {
                return Err(self.eof_error("expected ';'"));
            };
            match t.kind {
                TokenKind::Semi => {
                    self.advance()?;
                    break;
                }
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    return Err(self.unexpected(&t, "';'"));
                }
                _ => items.push(self.parse_item(false)?),
            }
        }
        Ok(match items.len() {
            0 => Value::Empty,
            1 => items.pop().unwrap_or(Value::Empty),
            _ => Value::Multi(items),
        })
    }

    /// A single value.
    fn parse_item(&mut self, in_list: bool) -> Result<Value, ParseError> {
        let Some(token) = self.peek()? else {
            return Err(self.eof_error("expected a value"));
        };

        match token.kind {
            TokenKind::Int | TokenKind::Float => {
                self.advance()?;
                if token.kind == TokenKind::Int && self.at(TokenKind::LParen)? {
                    return self.finish_counted_list(&token);
                }
                self.number(&token)
            }
            TokenKind::Ident
            | TokenKind::String
            | TokenKind::Char
            | TokenKind::List
            | TokenKind::Dimensions => {
                self.advance()?;
                if self.at(TokenKind::LBracket)? {
                    let dims = self.parse_dimension()?;
                    let value = self.parse_item(in_list)?;
                    return Ok(Value::Dimensioned(Dimensioned {
                        name: token.text.to_string(),
                        dims,
                        value: Box::new(value),
                    }));
                }
                if in_list && token.kind != TokenKind::Char && self.eat(TokenKind::LBrace)?.is_some() {
                    let dict = self.parse_entries(true)?;
                    let mut wrapper = Dict::new();
                    wrapper.insert(token.text, Value::Dict(dict));
                    return Ok(Value::Dict(wrapper));
                }
                Ok(Value::word(token.text))
            }
            TokenKind::LBracket => {
                let dims = self.parse_dimension()?;
                if self.at(TokenKind::Semi)? || self.at(TokenKind::RParen)? {
                    return Ok(Value::Dimension(dims));
                }
                let value = self.parse_item(in_list)?;
                Ok(Value::Dimensioned(Dimensioned {
                    name: String::new(),
                    dims,
                    value: Box::new(value),
                }))
            }
            TokenKind::LParen => self.parse_list(),
            TokenKind::LBrace => {
                self.advance()?;
                Ok(Value::Dict(self.parse_entries(true)?))
            }
            TokenKind::Macro => {
                self.advance()?;
                Ok(Value::Macro(MacroRef::new(token.text)))
            }
            TokenKind::Uniform => self.parse_uniform(),
            TokenKind::NonUniform => self.parse_nonuniform(),
            TokenKind::ListType => self.parse_typed_list(),
            TokenKind::CodeStream => self.parse_code_stream(),
            TokenKind::Calc => {
                self.advance()?;
                let expr = self.expect(TokenKind::String)?;
                Ok(Value::Calc(expr.text.to_string()))
            }
            TokenKind::Directive if token.text == "#eval" => {
                self.advance()?;
                match self.peek()? {
                    Some(t)
                        if matches!(
                            t.kind,
                            TokenKind::RawBlock | TokenKind::CodeBlock | TokenKind::String
                        ) =>
                    {
                        self.advance()?;
                        Ok(Value::Eval(t.text.to_string()))
                    }
                    Some(t) => Err(self.unexpected(&t, "an expression after #eval")),
                    None => Err(self.eof_error("expected an expression after #eval")),
                }
            }
            TokenKind::Directive => {
                let directive = self.parse_directive()?;
                Ok(Value::Directive(Directive {
                    standalone: false,
                    ..directive
                }))
            }
            TokenKind::CodeBlock => {
                self.advance()?;
                Ok(Value::Code(code_block(&token)))
            }
            _ => Err(self.unexpected(&token, "a value")),
        }
    }

    /// `DIRECTIVE payload`
    fn parse_directive(&mut self) -> Result<Directive, ParseError> {
        let name = self.advance()?;
        let payload = match self.peek()? {
            Some(t) if t.kind == TokenKind::LParen => self.parse_list()?,
            Some(t)
                if matches!(
                    t.kind,
                    TokenKind::String | TokenKind::Ident | TokenKind::Int | TokenKind::Macro
                ) || t.kind.is_keyword() =>
            {
                self.parse_item(false)?
            }
            Some(t) => return Err(self.unexpected(&t, &format!("an argument for {}", name.text))),
            None => return Err(self.eof_error(format!("expected an argument for {}", name.text))),
        };
        Ok(Directive::new(name.text, payload))
    }

    /// `( list_item* )`, type inferred.
    fn parse_list(&mut self) -> Result<Value, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut items = Vec::new();
        loop {
            match self.peek()? {
                Some(t) if t.kind == TokenKind::RParen => {
                    self.advance()?;
                    break;
                }
                Some(_) => items.push(self.parse_item(true)?),
                None => return Err(self.eof_error("expected ')'")),
            }
        }
        Ok(infer_list(items))
    }

    /// `INT ( list_item* )`. The count is advisory; the items decide.
    fn parse_counted_list(&mut self) -> Result<Value, ParseError> {
        let count = self.expect(TokenKind::Int)?;
        self.finish_counted_list(&count)
    }

    fn finish_counted_list(&mut self, count: &Token<'_>) -> Result<Value, ParseError> {
        let list = self.parse_list()?;
        let declared = count.int_value().unwrap_or(-1);
        let actual = match &list {
            Value::Array(a) => a.len(),
            Value::List(items) => items.len(),
            _ => 0,
        };
        if declared != actual as i64 {
            debug!(
                "{}:{}: list declares {declared} items but has {actual}",
                self.source_name, count.line
            );
        }
        Ok(list)
    }

    /// `[ INT{5|7} ]` or `[ alias ]`
    fn parse_dimension(&mut self) -> Result<Dimension, ParseError> {
        let open = self.expect(TokenKind::LBracket)?;
        let mut exponents = Vec::new();
        let mut alias = Vec::new();
        loop {
            let Some(t) = self.peek()? else {
                return Err(self.eof_error("expected ']'"));
            };
            match t.kind {
                TokenKind::RBracket => {
                    self.advance()?;
                    break;
                }
                TokenKind::Int if alias.is_empty() => {
                    self.advance()?;
                    let exponent = t
                        .int_value()
                        .and_then(|v| i32::try_from(v).ok())
                        .ok_or_else(|| self.error_at(&t, "dimension exponent out of range"))?;
                    exponents.push(exponent);
                }
                TokenKind::Ident if exponents.is_empty() => {
                    self.advance()?;
                    alias.push(t.text);
                }
                _ => return Err(self.unexpected(&t, "a dimension exponent or ']'")),
            }
        }

        if !alias.is_empty() {
            return Ok(Dimension::Alias(alias.join(" ")));
        }
        Dimension::from_exponents(&exponents).ok_or_else(|| {
            self.error_at(
                &open,
                format!(
                    "dimension set must have 5 or 7 exponents, found {}",
                    exponents.len()
                ),
            )
        })
    }

    /// `uniform` followed by a scalar, vector, tensor or macro.
    fn parse_uniform(&mut self) -> Result<Value, ParseError> {
        let keyword = self.advance()?;
        let Some(next) = self.peek()? else {
            return Err(self.eof_error("expected a value after 'uniform'"));
        };
        let value = match next.kind {
            TokenKind::Semi => return Ok(Value::word(keyword.text)),
            TokenKind::Int | TokenKind::Float => {
                self.advance()?;
                self.number(&next)?
            }
            TokenKind::Macro => {
                self.advance()?;
                Value::Macro(MacroRef::new(next.text))
            }
            TokenKind::LParen => {
                let list = self.parse_list()?;
                match &list {
                    Value::Array(a) if a.ndim() == 1 && matches!(a.len(), 3 | 6 | 9) => list,
                    _ => {
                        return Err(self.error_at(
                            &next,
                            "uniform value must be a scalar or have 3, 6 or 9 components",
                        ));
                    }
                }
            }
            _ => return Err(self.unexpected(&next, "a uniform value")),
        };
        Ok(Value::Field(Field {
            kind: FieldKind::Uniform,
            value: Box::new(value),
        }))
    }

    /// `nonuniform` followed by a `List<T>` or a counted list.
    fn parse_nonuniform(&mut self) -> Result<Value, ParseError> {
        self.advance()?;
        let value = match self.peek()? {
            Some(t) if t.kind == TokenKind::ListType => self.parse_typed_list()?,
            Some(t) if t.kind == TokenKind::Int => self.parse_counted_list()?,
            Some(t) => return Err(self.unexpected(&t, "List<T> or a counted list")),
            None => return Err(self.eof_error("expected List<T> or a counted list")),
        };
        Ok(Value::Field(Field {
            kind: FieldKind::NonUniform,
            value: Box::new(value),
        }))
    }

    /// `List<T>` followed by a plain or counted list.
    fn parse_typed_list(&mut self) -> Result<Value, ParseError> {
        let tag = self.expect(TokenKind::ListType)?;
        let value = match self.peek()? {
            Some(t) if t.kind == TokenKind::Int => self.parse_counted_list()?,
            Some(t) if t.kind == TokenKind::LParen => self.parse_list()?,
            Some(t) => return Err(self.unexpected(&t, "a list")),
            None => return Err(self.eof_error("expected a list")),
        };
        Ok(Value::TypedList(TypedList {
            tag: tag.text.to_string(),
            value: Box::new(value),
        }))
    }

    /// `#codeStream { label #{ ... #}; ... }`
    fn parse_code_stream(&mut self) -> Result<Value, ParseError> {
        self.expect(TokenKind::CodeStream)?;
        self.expect(TokenKind::LBrace)?;
        let mut blocks = Vec::new();
        loop {
            let Some(t) = self.peek()? else {
                return Err(self.eof_error("expected '}'"));
            };
            if t.kind == TokenKind::RBrace {
                self.advance()?;
                break;
            }
            if !t.kind.is_key() {
                return Err(self.unexpected(&t, "a code label"));
            }
            self.advance()?;
            let block = self.expect(TokenKind::CodeBlock)?;
            self.expect(TokenKind::Semi)?;
            blocks.push((t.text.to_string(), code_block(&block)));
        }
        Ok(Value::CodeStream(blocks))
    }
}


fn code_block(token: &Token<'_>) -> CodeBlock {
    CodeBlock {
        text: token.text.to_string(),
        indent: token.indent,
    }
}

fn found(token: &Token<'_>) -> String {
    match token.kind {
        TokenKind::LParen
        | TokenKind::RParen
        | TokenKind::LBracket
        | TokenKind::RBracket
        | TokenKind::LBrace
        | TokenKind::RBrace
        | TokenKind::Semi => token.kind.describe().to_string(),
        kind => format!("{} '{}'", kind.describe(), token.text),
    }
}

#[cfg(test)]
mod tests;
