//! Value types for dictionary documents.
//!
//! Plain data is represented by the scalar variants, [`Dict`], numeric
//! [`Array`]s and raw lists. Everything the dialect expresses with special
//! syntax (dimensions, directives, macro references, code blocks, field
//! declarations and so on) has its own variant so it can be written back
//! faithfully.

use crate::{Array, Dict};

/// A dictionary value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A keyword with no value: `p;`
    Empty,
    /// A boolean. Parsed files keep `on`/`yes`/`true` as words; booleans come
    /// from programmatic construction and are written as `on`/`off`.
    Bool(bool),
    /// An integer constant.
    Int(i64),
    /// A floating point constant.
    Float(f64),
    /// A bare word, quoted string or character constant, kept verbatim
    /// (quotes included).
    Word(String),
    /// A nested dictionary.
    Dict(Dict),
    /// A numeric array produced by list type inference.
    Array(Array),
    /// A heterogeneous list that could not be turned into an array.
    List(Vec<Value>),
    /// A physical dimension set: `[0 2 -1 0 0 0 0]` or `[m^2/s]`.
    Dimension(Dimension),
    /// A dimensioned value: `nu [0 2 -1 0 0 0 0] 1e-05`.
    Dimensioned(Dimensioned),
    /// A keyword-less directive: `#include "file"`, `#remove (a b)`.
    Directive(Directive),
    /// `#calc "expr"`; the expression text is kept verbatim, quotes included.
    Calc(String),
    /// `#eval {expr}` / `#eval "expr"` / `#eval #{expr#}`, kept verbatim.
    Eval(String),
    /// `#codeStream { label #{ ... #}; ... }`
    CodeStream(Vec<(String, CodeBlock)>),
    /// A single code statement: `code #{ ... #};`
    Code(CodeBlock),
    /// A macro reference, resolved only by macro expansion.
    Macro(MacroRef),
    /// A field declaration: `uniform (0 0 0)`, `nonuniform List<scalar> ...`.
    Field(Field),
    /// A `List<T>` literal.
    TypedList(TypedList),
    /// A keyless leading `N ( ... )` list, as found in `polyMesh/boundary`.
    Boundary(Box<Value>),
    /// Several values after one keyword: `Gauss linear corrected`.
    Multi(Vec<Value>),
}

/// Exponents over the seven base units: mass, length, time, temperature,
/// quantity, current and luminous intensity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dimension {
    /// Explicit exponents. Five-unit input is padded with zeros.
    Units([i32; 7]),
    /// A named unit expression such as `W/m/K`.
    Alias(String),
}

impl Dimension {
    /// Names of the base units, in exponent order.
    pub const BASE_UNITS: [&'static str; 7] = [
        "mass",
        "length",
        "time",
        "temperature",
        "quantity",
        "current",
        "luminous_intensity",
    ];

    /// Build a dimension from five or seven exponents.
    pub fn from_exponents(exponents: &[i32]) -> Option<Self> {
        if exponents.len() != 5 && exponents.len() != 7 {
            return None;
        }
        let mut units = [0; 7];
        units[..exponents.len()].copy_from_slice(exponents);
        Some(Dimension::Units(units))
    }

    /// The dimensionless set.
    pub fn dimensionless() -> Self {
        Dimension::Units([0; 7])
    }
}

/// A named, dimensioned quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimensioned {
    /// Optional leading name; empty when the entry omits it.
    pub name: String,
    pub dims: Dimension,
    pub value: Box<Value>,
}

/// A directive entry such as `#include "file"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Directive name including the `#`.
    pub name: String,
    pub payload: Box<Value>,
    /// A keyword-less entry. `false` when the directive is the value of a
    /// keyword, as in `mode #inputMode merge;`.
    pub standalone: bool,
}

impl Directive {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload: Box::new(payload),
            standalone: true,
        }
    }

    /// A directive written as the value of a keyword.
    pub fn keyed(name: impl Into<String>, payload: Value) -> Self {
        Self {
            standalone: false,
            ..Self::new(name, payload)
        }
    }

    /// Whether this directive pulls in another file.
    pub fn is_include(&self) -> bool {
        matches!(
            self.name.as_str(),
            "#include" | "#includeIfPresent" | "#includeEtc"
        )
    }
}

/// A foreign code block, markers included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Block text from `#{` through `#}`.
    pub text: String,
    /// Leading whitespace width of the closing `#}` line in the source.
    /// Continuation lines are written relative to it.
    pub indent: u32,
}

/// A macro reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroRef {
    /// Reference text including the sigil: `$a`, `${a}`, `$..a`, `$:a.b`.
    pub text: String,
    /// A keyword-less entry whose referenced dictionary is spliced into the
    /// enclosing scope, rather than the value of a keyword.
    pub standalone: bool,
}

impl MacroRef {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            standalone: false,
        }
    }

    pub fn standalone(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            standalone: true,
        }
    }
}

/// Kind of a field declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Uniform,
    NonUniform,
}

impl FieldKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            FieldKind::Uniform => "uniform",
            FieldKind::NonUniform => "nonuniform",
        }
    }
}

/// A `uniform` or `nonuniform` field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub kind: FieldKind,
    pub value: Box<Value>,
}

/// A `List<T>` literal: the tag and the inferred contents.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedList {
    /// The tag as written, e.g. `List<vector>`.
    pub tag: String,
    pub value: Box<Value>,
}

impl Value {
    /// Create a bare word.
    pub fn word(text: impl Into<String>) -> Self {
        Value::Word(text.into())
    }

    /// Create a double quoted string.
    pub fn string(text: &str) -> Self {
        Value::Word(format!("\"{text}\""))
    }

    /// Get the text of a word or macro reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Word(w) => Some(w),
            Value::Macro(m) => Some(&m.text),
            _ => None,
        }
    }

    /// Get the text of a word with surrounding double quotes removed.
    pub fn as_unquoted(&self) -> Option<&str> {
        let text = self.as_str()?;
        Some(
            text.strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .unwrap_or(text),
        )
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get a numeric value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get a boolean, accepting the switch words the solvers accept.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Word(w) => match w.as_str() {
                "on" | "yes" | "true" | "y" | "t" => Some(true),
                "off" | "no" | "false" | "n" | "f" | "none" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Multi(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_directive(&self) -> Option<&Directive> {
        match self {
            Value::Directive(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_macro(&self) -> Option<&MacroRef> {
        match self {
            Value::Macro(m) => Some(m),
            _ => None,
        }
    }

    /// Whether this is a plain integer or float.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Whether this entry is written without its keyword.
    pub fn is_keyless(&self) -> bool {
        match self {
            Value::Boundary(_) => true,
            Value::Directive(d) => d.standalone,
            Value::Macro(m) => m.standalone,
            _ => false,
        }
    }

    /// A short name for the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Word(_) => "word",
            Value::Dict(_) => "dictionary",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Dimension(_) => "dimension",
            Value::Dimensioned(_) => "dimensioned value",
            Value::Directive(_) => "directive",
            Value::Calc(_) => "#calc",
            Value::Eval(_) => "#eval",
            Value::CodeStream(_) => "#codeStream",
            Value::Code(_) => "code block",
            Value::Macro(_) => "macro reference",
            Value::Field(_) => "field",
            Value::TypedList(_) => "typed list",
            Value::Boundary(_) => "boundary list",
            Value::Multi(_) => "multi-token value",
        }
    }

    /// Visit this value and every value nested in it, mutably.
    ///
    /// Nested dictionaries inside lists are visited; values of a top-level
    /// `Value::Dict` are not, since dictionaries open their own scope.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Value)) {
        f(self);
        match self {
            Value::List(items) | Value::Multi(items) => {
                for item in items {
                    if let Value::Dict(d) = item {
                        for (_, v) in d.iter_mut() {
                            v.walk_mut(f);
                        }
                    } else {
                        item.walk_mut(f);
                    }
                }
            }
            Value::Dimensioned(d) => d.value.walk_mut(f),
            Value::Field(field) => field.value.walk_mut(f),
            Value::TypedList(t) => t.value.walk_mut(f),
            Value::Boundary(inner) => inner.walk_mut(f),
            _ => {}
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Word(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Word(s)
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Value::Dict(d)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}
