//! Pretty-printer for OpenFOAM/Caelus dictionary files.
//!
//! [`render`] writes a [`Dict`] in the conventional layout: keys aligned per
//! scope, nested dictionaries in indented brace blocks, lists in parentheses.
//! [`render_file`] wraps that in the banner, header and EOF comment lines of a
//! complete file.

mod file;
mod inline;
mod options;
mod writer;

pub use file::{Banner, EOF_LINE, SEPARATOR, render_file};
pub use inline::{format_dimension, format_float, inline};
pub use options::FormatOptions;
pub use writer::DictWriter;

use foamdict_tree::Dict;

/// Render a document body.
pub fn render(doc: &Dict, options: &FormatOptions) -> String {
    let mut w = DictWriter::with_options(options.clone());
    w.write_document(doc.iter());
    w.finish_string()
}

/// Render a document body with default options.
pub fn render_default(doc: &Dict) -> String {
    render(doc, &FormatOptions::default())
}
