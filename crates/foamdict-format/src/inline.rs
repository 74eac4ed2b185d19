//! Single-line rendering of values.
//!
//! Every value has a one-line form. The writer uses it directly for scalars
//! and falls back to block layouts when a value holds dictionaries or code, or
//! when the one-line form does not fit.

use foamdict_tree::{Array, Dict, Dimension, FieldKind, Number, Value};
use tracing::warn;

/// Render a float so that it reads back as a float with the same value.
///
/// Non-finite values have no literal form. Infinities are written as the
/// largest finite value of the same sign, NaN as `0.0`.
pub fn format_float(value: f64) -> String {
    let value = if value.is_nan() {
        warn!("writing NaN as 0.0");
        0.0
    } else if value.is_infinite() {
        warn!("writing {value} as the largest finite float");
        f64::MAX.copysign(value)
    } else {
        value
    };
    format!("{value:?}")
}

/// `[0 2 -1 0 0 0 0]` or `[m^2/s]`
pub fn format_dimension(dims: &Dimension) -> String {
    match dims {
        Dimension::Units(units) => {
            let exponents: Vec<String> = units.iter().map(i32::to_string).collect();
            format!("[{}]", exponents.join(" "))
        }
        Dimension::Alias(alias) => format!("[{alias}]"),
    }
}

/// `(1 2 3)`, `((1 0) (0 1))`
pub fn format_array(array: &Array) -> String {
    if array.ndim() <= 1 {
        let items: Vec<String> = array.iter().map(format_number).collect();
        return format!("({})", items.join(" "));
    }
    let rows: Vec<String> = (0..array.len())
        .filter_map(|i| array.row(i))
        .map(|row| format_array(&row))
        .collect();
    format!("({})", rows.join(" "))
}

pub fn format_number(n: Number) -> String {
    match n {
        Number::Int(i) => i.to_string(),
        Number::Float(x) => format_float(x),
    }
}

/// Number of elements a list-like value holds, as written before a counted
/// list.
pub fn list_len(value: &Value) -> usize {
    match value {
        Value::Array(a) => a.len(),
        Value::List(items) | Value::Multi(items) => items.len(),
        Value::TypedList(t) => list_len(&t.value),
        _ => 1,
    }
}

/// The one-line form of a value.
pub fn inline(value: &Value) -> String {
    match value {
        Value::Empty => String::new(),
        Value::Bool(true) => "on".to_string(),
        Value::Bool(false) => "off".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => format_float(*x),
        Value::Word(w) => w.clone(),
        Value::Dict(d) => inline_dict(d),
        Value::Array(a) => format_array(a),
        Value::List(items) if is_word_list(items) && !items.is_empty() => {
            format!("( {} )", join(items))
        }
        Value::List(items) => format!("({})", join(items)),
        Value::Dimension(dims) => format_dimension(dims),
        Value::Dimensioned(d) => {
            let value = inline(&d.value);
            if d.name.is_empty() {
                format!("{} {value}", format_dimension(&d.dims))
            } else {
                format!("{} {} {value}", d.name, format_dimension(&d.dims))
            }
        }
        Value::Directive(d) => format!("{} {}", d.name, inline(&d.payload)),
        Value::Calc(expr) => format!("#calc {expr}"),
        Value::Eval(expr) => format!("#eval {expr}"),
        Value::CodeStream(blocks) => {
            let blocks: Vec<String> = blocks
                .iter()
                .map(|(label, code)| format!("{label} {};", code.text))
                .collect();
            format!("#codeStream {{ {} }}", blocks.join(" "))
        }
        Value::Code(code) => code.text.clone(),
        Value::Macro(m) => m.text.clone(),
        Value::Field(field) => match (field.kind, field.value.as_ref()) {
            (FieldKind::Uniform, v) => format!("uniform {}", inline(v)),
            (FieldKind::NonUniform, v @ Value::TypedList(_)) => {
                format!("nonuniform {}", inline(v))
            }
            (FieldKind::NonUniform, v) => format!("nonuniform {}{}", list_len(v), inline(v)),
        },
        Value::TypedList(t) => format!("{} {}{}", t.tag, list_len(&t.value), inline(&t.value)),
        Value::Boundary(inner) => format!("{}{}", list_len(inner), inline(inner)),
        Value::Multi(items) => join(items),
    }
}

fn join(items: &[Value]) -> String {
    items.iter().map(inline).collect::<Vec<_>>().join(" ")
}

fn inline_dict(dict: &Dict) -> String {
    let mut parts = Vec::with_capacity(dict.len());
    for (key, value) in dict.iter() {
        parts.push(match value {
            Value::Dict(_) => format!("{key} {}", inline(value)),
            Value::Empty => format!("{key};"),
            v if v.is_keyless() => match v {
                Value::Directive(_) => inline(v),
                _ => format!("{};", inline(v)),
            },
            v => format!("{key} {};", inline(v)),
        });
    }
    if parts.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", parts.join(" "))
    }
}

pub fn is_word_list(items: &[Value]) -> bool {
    items.iter().all(|v| matches!(v, Value::Word(_)))
}

/// Whether a value contains anything that needs a block layout.
pub fn needs_block(value: &Value) -> bool {
    match value {
        Value::Dict(_) | Value::CodeStream(_) => true,
        Value::Code(code) => code.text.contains('\n'),
        Value::List(items) | Value::Multi(items) => items.iter().any(needs_block),
        Value::Dimensioned(d) => needs_block(&d.value),
        Value::Field(f) => needs_block(&f.value),
        Value::TypedList(t) => needs_block(&t.value),
        Value::Boundary(inner) => needs_block(inner),
        _ => false,
    }
}
