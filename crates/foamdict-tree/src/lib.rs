//! Document tree for OpenFOAM/Caelus dictionary files.
//!
//! A parsed file is a [`Dict`]: an insertion-ordered mapping whose values are
//! [`Value`]s. Tree rewriting passes that need no I/O live here too: recursive
//! merge, macro expansion and `#remove` processing.

mod array;
mod dict;
mod expand;
mod value;

pub use array::{Array, ArrayData, Number, infer_list};
pub use dict::Dict;
pub use expand::{ExpandError, MacroPolicy};
pub use value::{
    CodeBlock, Dimension, Dimensioned, Directive, Field, FieldKind, MacroRef, TypedList, Value,
};
