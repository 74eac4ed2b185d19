use std::path::PathBuf;

use foamdict_parse::{IncludeError, ParseError};
use foamdict_tree::ExpandError;

/// Errors from loading or writing a case file.
#[derive(Debug)]
pub enum CaseError {
    /// The file does not exist.
    NotFound { path: PathBuf },
    /// Reading or writing failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(ParseError),
    Include(IncludeError),
    Expand(ExpandError),
    /// Only the header of the file was loaded, so writing it back would
    /// drop its body.
    HeaderOnly { path: PathBuf },
}

impl std::fmt::Display for CaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseError::NotFound { path } => write!(f, "cannot find file: {}", path.display()),
            CaseError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            CaseError::Parse(e) => write!(f, "{e}"),
            CaseError::Include(e) => write!(f, "{e}"),
            CaseError::Expand(e) => write!(f, "{e}"),
            CaseError::HeaderOnly { path } => write!(
                f,
                "{}: only the header was loaded, refusing to overwrite the file",
                path.display()
            ),
        }
    }
}

impl std::error::Error for CaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaseError::Io { source, .. } => Some(source),
            CaseError::Parse(e) => Some(e),
            CaseError::Include(e) => Some(e),
            CaseError::Expand(e) => Some(e),
            CaseError::NotFound { .. } | CaseError::HeaderOnly { .. } => None,
        }
    }
}

impl From<ParseError> for CaseError {
    fn from(e: ParseError) -> Self {
        CaseError::Parse(e)
    }
}

impl From<IncludeError> for CaseError {
    fn from(e: IncludeError) -> Self {
        CaseError::Include(e)
    }
}

impl From<ExpandError> for CaseError {
    fn from(e: ExpandError) -> Self {
        CaseError::Expand(e)
    }
}

/// A field assignment rejected by a file's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The file has no field by this name.
    UnknownField { file: String, field: String },
    /// The value is not one of the field's options.
    InvalidOption {
        file: String,
        field: String,
        value: String,
        allowed: Vec<String>,
    },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::UnknownField { file, field } => {
                write!(f, "{file}: unknown field '{field}'")
            }
            SchemaError::InvalidOption {
                file,
                field,
                value,
                allowed,
            } => write!(
                f,
                "{file}: invalid option '{value}' for '{field}', valid options are: {}",
                allowed.join(", ")
            ),
        }
    }
}

impl std::error::Error for SchemaError {}
