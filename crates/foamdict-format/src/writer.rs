//! Block layout of dictionaries.
//!
//! Keys in one dictionary scope are left aligned to a common column: the
//! longest key in the scope plus the tab width. Nested dictionaries open a
//! new scope with their own column.

use foamdict_tree::{Array, CodeBlock, Dict, FieldKind, Value};

use crate::FormatOptions;
use crate::inline::{format_number, inline, is_word_list, list_len, needs_block};

/// Writes dictionaries in the conventional block layout.
pub struct DictWriter {
    out: String,
    options: FormatOptions,
    /// Current indentation, in columns.
    indent: usize,
}

impl DictWriter {
    /// Create a new writer with default options.
    pub fn new() -> Self {
        Self::with_options(FormatOptions::default())
    }

    /// Create a new writer with the given options.
    pub fn with_options(options: FormatOptions) -> Self {
        Self {
            out: String::new(),
            options,
            indent: 0,
        }
    }

    /// Consume the writer and return the output.
    pub fn finish_string(self) -> String {
        self.out
    }

    /// Write a raw string to the output.
    pub fn write_str(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push(' ');
        }
    }

    fn push_indent(&mut self) {
        self.indent += self.options.tab_width;
    }

    fn pop_indent(&mut self) {
        self.indent = self.indent.saturating_sub(self.options.tab_width);
    }

    /// Write the entries of a top-level document, a blank line after each.
    pub fn write_document<'a>(&mut self, entries: impl IntoIterator<Item = (&'a str, &'a Value)>) {
        let entries: Vec<_> = entries.into_iter().collect();
        let width = self.key_width(&entries);
        for (key, value) in entries {
            self.write_entry(key, value, width);
            self.out.push('\n');
        }
    }

    /// Write the entries of a nested dictionary at the current indentation.
    pub fn write_entries(&mut self, dict: &Dict) {
        let entries: Vec<_> = dict.iter().collect();
        let width = self.key_width(&entries);
        let last = entries.len().saturating_sub(1);
        for (i, (key, value)) in entries.into_iter().enumerate() {
            self.write_entry(key, value, width);
            if i != last && matches!(value, Value::Dict(_) | Value::CodeStream(_)) {
                self.out.push('\n');
            }
        }
    }

    fn key_width(&self, entries: &[(&str, &Value)]) -> usize {
        let longest = entries
            .iter()
            .filter(|(_, v)| !v.is_keyless())
            .map(|(k, _)| k.chars().count())
            .max()
            .unwrap_or(0);
        longest + self.options.tab_width.max(1)
    }

    /// `key` padded to `width`.
    fn write_key(&mut self, key: &str, width: usize) {
        self.write_indent();
        self.out.push_str(key);
        for _ in key.chars().count()..width {
            self.out.push(' ');
        }
    }

    fn fits(&self, width: usize, text: &str) -> bool {
        self.indent + width + text.len() < self.options.max_width
    }

    /// Write one `key value;` entry, or the block form of its value.
    pub fn write_entry(&mut self, key: &str, value: &Value, width: usize) {
        match value {
            Value::Directive(d) if d.standalone => {
                self.write_indent();
                self.out.push_str(&inline(value));
                self.out.push('\n');
            }
            Value::Macro(m) if m.standalone => {
                self.write_indent();
                self.out.push_str(&m.text);
                self.out.push_str(";\n");
            }
            Value::Boundary(inner) => {
                self.write_indent();
                self.out.push_str(&list_len(inner).to_string());
                self.out.push('\n');
                self.write_list_body(inner);
                self.out.push('\n');
            }
            Value::Empty => {
                self.write_indent();
                self.out.push_str(key);
                self.out.push_str(";\n");
            }
            Value::Dict(dict) => {
                self.write_indent();
                self.out.push_str(key);
                self.out.push('\n');
                self.write_dict_block(dict);
                self.out.push('\n');
            }
            Value::Code(code) if code.text.contains('\n') => {
                self.write_indent();
                self.out.push_str(key);
                self.out.push('\n');
                self.write_code(code);
                self.out.push_str(";\n");
            }
            Value::CodeStream(blocks) => {
                self.write_key(key, width);
                self.out.push_str("#codeStream\n");
                self.write_indent();
                self.out.push_str("{\n");
                self.push_indent();
                for (i, (label, code)) in blocks.iter().enumerate() {
                    if i > 0 {
                        self.out.push('\n');
                    }
                    self.write_indent();
                    self.out.push_str(label);
                    self.out.push('\n');
                    self.write_code(code);
                    self.out.push_str(";\n");
                }
                self.pop_indent();
                self.write_indent();
                self.out.push_str("};\n");
            }
            Value::Multi(items) if matches!(items.last(), Some(Value::Dict(_))) => {
                let (dict, words) = match items.split_last() {
                    Some((Value::Dict(dict), words)) => (dict, words),
                    _ => return,
                };
                self.write_key(key, width);
                let words: Vec<String> = words.iter().map(inline).collect();
                self.out.push_str(&words.join(" "));
                self.out.push('\n');
                self.write_dict_block(dict);
                self.out.push('\n');
            }
            Value::List(items) => self.write_list_entry(key, value, items, width),
            Value::Array(array) => {
                let text = inline(value);
                if array.ndim() == 1 && self.fits(width, &text) {
                    self.write_scalar_entry(key, &text, width);
                } else {
                    self.write_indent();
                    self.out.push_str(key);
                    self.out.push('\n');
                    self.write_array_body(array);
                    self.out.push_str(";\n");
                }
            }
            Value::Field(field) if field.kind == FieldKind::NonUniform => {
                let text = inline(value);
                if self.fits(width, &text) && !needs_block(value) {
                    self.write_scalar_entry(key, &text, width);
                } else {
                    self.write_key(key, width);
                    self.out.push_str("nonuniform");
                    let body = match field.value.as_ref() {
                        Value::TypedList(t) => {
                            self.out.push(' ');
                            self.out.push_str(&t.tag);
                            t.value.as_ref()
                        }
                        other => other,
                    };
                    self.write_counted_body(body);
                }
            }
            Value::TypedList(t) => {
                let text = inline(value);
                if self.fits(width, &text) && !needs_block(value) {
                    self.write_scalar_entry(key, &text, width);
                } else {
                    self.write_key(key, width);
                    self.out.push_str(&t.tag);
                    self.write_counted_body(&t.value);
                }
            }
            _ => {
                let text = inline(value);
                self.write_scalar_entry(key, &text, width);
            }
        }
    }

    fn write_scalar_entry(&mut self, key: &str, text: &str, width: usize) {
        self.write_key(key, width);
        self.out.push_str(text);
        self.out.push_str(";\n");
    }

    /// The element count and the list body on lines of their own, closed
    /// by `;`.
    fn write_counted_body(&mut self, body: &Value) {
        self.out.push('\n');
        self.write_indent();
        self.out.push_str(&list_len(body).to_string());
        self.out.push('\n');
        self.write_list_body(body);
        self.out.push_str(";\n");
    }

    fn write_list_entry(&mut self, key: &str, value: &Value, items: &[Value], width: usize) {
        let short_words = is_word_list(items) && items.len() <= self.options.inline_word_list_max;
        if items.is_empty() || short_words {
            self.write_scalar_entry(key, &inline(value), width);
            return;
        }
        self.write_indent();
        self.out.push_str(key);
        self.out.push('\n');
        self.write_list_body(value);
        self.out.push_str(";\n");
    }

    /// `{`, the entries one level deeper, `}`. No trailing newline.
    fn write_dict_block(&mut self, dict: &Dict) {
        self.write_indent();
        self.out.push_str("{\n");
        self.push_indent();
        self.write_entries(dict);
        self.pop_indent();
        self.write_indent();
        self.out.push('}');
    }

    /// Block form of an array or list: `(`, one item or row per line, `)`.
    /// No trailing newline.
    fn write_list_body(&mut self, value: &Value) {
        match value {
            Value::Array(array) => self.write_array_body(array),
            Value::List(items) | Value::Multi(items) => {
                self.write_indent();
                self.out.push_str("(\n");
                self.push_indent();
                for item in items {
                    self.write_list_item(item);
                }
                self.pop_indent();
                self.write_indent();
                self.out.push(')');
            }
            other => {
                self.write_indent();
                self.out.push_str(&inline(other));
            }
        }
    }

    fn write_list_item(&mut self, item: &Value) {
        match item {
            Value::Dict(dict) if dict.len() == 1 => {
                if let Some((name, Value::Dict(inner))) = dict.get_index(0) {
                    self.write_indent();
                    self.out.push_str(name);
                    self.out.push('\n');
                    self.write_dict_block(inner);
                } else {
                    self.write_dict_block(dict);
                }
            }
            Value::Dict(dict) => self.write_dict_block(dict),
            Value::List(_) | Value::Array(_) => {
                let text = inline(item);
                if !needs_block(item) && self.fits(0, &text) {
                    self.write_indent();
                    self.out.push_str(&text);
                } else {
                    self.write_list_body(item);
                }
            }
            _ => {
                self.write_indent();
                self.out.push_str(&inline(item));
            }
        }
        self.out.push('\n');
    }

    /// One-dimensional arrays are wrapped to the line width; higher
    /// dimensional arrays get one row per line.
    fn write_array_body(&mut self, array: &Array) {
        self.write_indent();
        self.out.push_str("(\n");
        self.push_indent();
        if array.ndim() <= 1 {
            let mut line = String::new();
            for n in array.iter() {
                let text = format_number(n);
                let width = self.indent + line.len() + 1 + text.len();
                if !line.is_empty() && width > self.options.max_width {
                    self.write_indent();
                    self.out.push_str(&line);
                    self.out.push('\n');
                    line.clear();
                }
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(&text);
            }
            if !line.is_empty() {
                self.write_indent();
                self.out.push_str(&line);
                self.out.push('\n');
            }
        } else {
            for row in (0..array.len()).filter_map(|i| array.row(i)) {
                self.write_list_item(&Value::Array(row));
            }
        }
        self.pop_indent();
        self.write_indent();
        self.out.push(')');
    }

    /// A code block with its continuation lines re-indented relative to the
    /// current indentation. No trailing newline.
    fn write_code(&mut self, code: &CodeBlock) {
        let lines: Vec<&str> = code.text.lines().collect();
        let Some((last, rest)) = lines.split_last() else {
            return;
        };
        let Some((first, middle)) = rest.split_first() else {
            self.write_indent();
            self.out.push_str(last.trim_start());
            return;
        };
        self.write_indent();
        self.out.push_str(first.trim_start());
        self.out.push('\n');
        for line in middle {
            if line.trim().is_empty() {
                self.out.push('\n');
                continue;
            }
            self.write_indent();
            self.out.push_str(strip_indent(line, code.indent as usize));
            self.out.push('\n');
        }
        self.write_indent();
        self.out.push_str(last.trim_start());
    }
}

impl Default for DictWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove up to `width` leading blanks.
fn strip_indent(line: &str, width: usize) -> &str {
    let blanks = line
        .chars()
        .take(width)
        .take_while(|c| matches!(c, ' ' | '\t'))
        .count();
    &line[blanks..]
}
