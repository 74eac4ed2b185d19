//! Whole-file output: banner, `FoamFile` header, separator, body, EOF line.

use foamdict_tree::{Dict, Value};
use tracing::debug;

use crate::{DictWriter, FormatOptions};

/// Line between the header and the body.
pub const SEPARATOR: &str =
    "// * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * //";

/// Last line of every file.
pub const EOF_LINE: &str =
    "// ************************************************************************* //";

/// The comment block at the top of a generated file.
#[derive(Debug, Clone)]
pub struct Banner {
    pub version: String,
    pub timestamp: String,
}

impl Banner {
    pub fn new(version: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Banner for this crate's version, stamped with the local time.
    pub fn now() -> Self {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Self::new(env!("CARGO_PKG_VERSION"), timestamp)
    }

    pub fn render(&self) -> String {
        format!(
            "/*---------------------------------------------------------------------------*\\\n \
             * foamdict {}\n \
             *\n \
             * Auto-generated on: {}\n\
             \\*---------------------------------------------------------------------------*/\n",
            self.version, self.timestamp
        )
    }
}

/// Render a complete dictionary file.
///
/// The header is `header` when given, otherwise the document's own
/// `FoamFile` entry, if any. `FoamFile` is never repeated in the body.
pub fn render_file(
    doc: &Dict,
    header: Option<&Dict>,
    banner: &Banner,
    options: &FormatOptions,
) -> String {
    let header = header.or_else(|| doc.get("FoamFile").and_then(Value::as_dict));
    let mut w = DictWriter::with_options(options.clone());
    w.write_str(&banner.render());
    w.write_str("\n");
    if let Some(header) = header {
        w.write_document([("FoamFile", &Value::Dict(header.clone()))]);
    }
    w.write_str(SEPARATOR);
    w.write_str("\n\n");
    let body: Vec<_> = doc.iter().filter(|(k, _)| *k != "FoamFile").collect();
    debug!("rendering {} entries", body.len());
    w.write_document(body);
    w.write_str(EOF_LINE);
    w.write_str("\n");
    w.finish_string()
}
