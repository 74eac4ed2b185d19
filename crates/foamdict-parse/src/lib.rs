//! Parser for OpenFOAM/Caelus dictionary files.
//!
//! [`parse`] turns source text into a [`Dict`]. Directives, macro references
//! and code blocks are kept as values; [`Includer`] splices `#include`d files
//! in afterwards, and macro expansion lives on [`Dict`] itself.

mod diagnostic;
mod include;
mod parser;

pub use diagnostic::{Column, ParseError};
pub use foamdict_tree::Dict;
pub use include::{
    EtcDirs, EtcResolver, FileSystem, IncludeError, Includer, MemoryFileSystem, NoEtc,
    OsFileSystem, expand_includes,
};
pub use parser::Parser;

/// Parse a dictionary source.
///
/// `source_name` is used in error messages, usually the file path.
pub fn parse(source: &str, source_name: &str) -> Result<Dict, ParseError> {
    Parser::new(source, source_name).parse()
}

/// Parse only the `FoamFile` header at the start of a source.
pub fn parse_header(source: &str, source_name: &str) -> Result<Option<Dict>, ParseError> {
    Parser::new(source, source_name).parse_header()
}
