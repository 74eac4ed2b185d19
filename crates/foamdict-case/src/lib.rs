//! Case files: one dictionary file of an OpenFOAM/Caelus case, loaded from
//! and written back to disk.
//!
//! [`DictFile`] keeps the `FoamFile` header apart from the entries, refuses to
//! parse oversized files beyond their header, and checks the known fields of
//! the standard files (`controlDict`, `fvSchemes`, ...) against [`schema`]
//! tables.

mod dict_file;
mod error;
mod options;
pub mod schema;

pub use dict_file::{DictFile, LoadStatus, default_header};
pub use error::{CaseError, SchemaError};
pub use foamdict_tree::MacroPolicy;
pub use options::LoadOptions;
