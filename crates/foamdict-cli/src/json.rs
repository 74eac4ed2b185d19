//! JSON export of dictionary documents.
//!
//! Plain data maps onto JSON directly. Values that carry a keyword (fields,
//! typed lists, dimensioned values) become `{"$tag": ..., "$payload": ...}`
//! objects; dialect-only constructs such as directives, macro references and
//! code are exported as their source text.

use foamdict_format::inline;
use foamdict_tree::{Array, Dict, Number, Value};
use serde_json::{Map, Value as Json};

pub fn dict_to_json(dict: &Dict) -> Json {
    let mut obj = Map::new();
    for (key, value) in dict.iter() {
        obj.insert(key.to_string(), value_to_json(value));
    }
    Json::Object(obj)
}

pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Empty => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(x) => float_to_json(*x),
        Value::Word(_) => Json::String(value.as_unquoted().unwrap_or_default().to_string()),
        Value::Dict(d) => dict_to_json(d),
        Value::Array(a) => array_to_json(a),
        Value::List(items) | Value::Multi(items) => {
            Json::Array(items.iter().map(value_to_json).collect())
        }
        Value::Boundary(inner) => value_to_json(inner),
        Value::Field(f) => tagged(f.kind.keyword(), value_to_json(&f.value)),
        Value::TypedList(t) => tagged(&t.tag, value_to_json(&t.value)),
        Value::Dimensioned(d) => {
            let mut obj = Map::new();
            obj.insert("$tag".to_string(), Json::from("dimensioned"));
            if !d.name.is_empty() {
                obj.insert("name".to_string(), Json::from(d.name.as_str()));
            }
            obj.insert(
                "dimensions".to_string(),
                Json::from(foamdict_format::format_dimension(&d.dims)),
            );
            obj.insert("$payload".to_string(), value_to_json(&d.value));
            Json::Object(obj)
        }
        Value::Dimension(_)
        | Value::Directive(_)
        | Value::Calc(_)
        | Value::Eval(_)
        | Value::CodeStream(_)
        | Value::Code(_)
        | Value::Macro(_) => Json::String(inline(value)),
    }
}

fn tagged(tag: &str, payload: Json) -> Json {
    let mut obj = Map::new();
    obj.insert("$tag".to_string(), Json::from(tag));
    obj.insert("$payload".to_string(), payload);
    Json::Object(obj)
}

fn array_to_json(array: &Array) -> Json {
    if array.ndim() <= 1 {
        return Json::Array(array.iter().map(number_to_json).collect());
    }
    Json::Array(
        (0..array.len())
            .filter_map(|i| array.row(i))
            .map(|row| array_to_json(&row))
            .collect(),
    )
}

fn number_to_json(n: Number) -> Json {
    match n {
        Number::Int(i) => Json::from(i),
        Number::Float(x) => float_to_json(x),
    }
}

fn float_to_json(x: f64) -> Json {
    serde_json::Number::from_f64(x).map_or(Json::Null, Json::Number)
}
