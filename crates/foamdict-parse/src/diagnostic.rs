//! Parse errors and their diagnostic rendering.

use ariadne::{Color, Label, Report, ReportKind, Source};
use foamdict_tokenizer::{LexError, Span};

/// Column of a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// 1-based column of the offending token.
    At(u32),
    /// The input ended before the grammar was satisfied.
    Eof,
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Column::At(c) => write!(f, "{c}"),
            Column::Eof => f.write_str("EOF"),
        }
    }
}

/// A grammar violation or a lexical error, with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// Name of the source (usually a file path) used in messages.
    pub source_name: String,
    /// 1-based line.
    pub line: u32,
    pub column: Column,
    /// Byte range of the offending token in the source.
    pub span: Span,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(
        message: impl Into<String>,
        source_name: impl Into<String>,
        line: u32,
        column: Column,
        span: Span,
    ) -> Self {
        Self {
            message: message.into(),
            source_name: source_name.into(),
            line,
            column,
            span,
        }
    }

    /// Wrap a lexical error.
    pub fn from_lex(error: LexError, source_name: impl Into<String>) -> Self {
        Self::new(
            error.message,
            source_name,
            error.line,
            Column::At(error.column),
            error.span,
        )
    }

    /// Whether the error was raised at end of input.
    pub fn is_eof(&self) -> bool {
        self.column == Column::Eof
    }

    /// Render this error with ariadne.
    ///
    /// Returns a string containing the formatted error message with source context.
    pub fn render(&self, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| self.to_string())
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, source: &str, writer: W) {
        let filename = self.source_name.as_str();
        let end = source.len();
        let range = (self.span.start as usize).min(end)..(self.span.end as usize).min(end);
        let label = if self.is_eof() {
            "input ends here"
        } else {
            "unexpected here"
        };

        let mut report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(&self.message)
            .with_label(
                Label::new((filename, range))
                    .with_message(label)
                    .with_color(Color::Red),
            );
        if self.message.starts_with("expected ';'") {
            report = report.with_help("every keyword entry ends with ';'");
        }
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.source_name, self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}
