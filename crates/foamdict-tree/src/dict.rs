//! The ordered dictionary at the heart of a document.

use indexmap::IndexMap;

use crate::Value;

/// An insertion-ordered mapping from keywords to values.
///
/// Keys are unique. Assigning to an existing key keeps its position, and
/// assigning a dictionary onto a dictionary merges the two recursively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: IndexMap<String, Value>,
}

impl Dict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Position of a key in iteration order.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.entries.get_index_of(key)
    }

    /// Entry at a position in iteration order.
    pub fn get_index(&self, index: usize) -> Option<(&str, &Value)> {
        self.entries
            .get_index(index)
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<(&str, &mut Value)> {
        self.entries
            .get_index_mut(index)
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Assign a value.
    ///
    /// A dictionary assigned over a dictionary is merged into it; anything
    /// else replaces the old value in place. New keys go to the end.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match (self.entries.get_mut(&key), value) {
            (Some(Value::Dict(existing)), Value::Dict(incoming)) => existing.merge_owned(incoming),
            (Some(slot), value) => *slot = value,
            (None, value) => {
                self.entries.insert(key, value);
            }
        }
    }

    /// Assign a value without merging, returning the previous one.
    pub fn replace(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Remove an entry, keeping the order of the remaining ones.
    pub fn pop(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Remove the entry at a position, keeping the order of the rest.
    pub fn pop_index(&mut self, index: usize) -> Option<(String, Value)> {
        self.entries.shift_remove_index(index)
    }

    /// Keep only the entries for which the predicate holds.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.entries.retain(|k, v| keep(k, v));
    }

    /// Recursively merge another dictionary into this one.
    ///
    /// Keys only in `other` are appended, nested dictionaries are merged key
    /// by key, and every other value in `other` overwrites in place. `other`
    /// is left untouched.
    pub fn merge(&mut self, other: &Dict) {
        self.merge_owned(other.clone());
    }

    fn merge_owned(&mut self, other: Dict) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Splice entries in at a position.
    ///
    /// Keys not yet present are inserted in order starting at `index`. A key
    /// already present before `index` is assigned in place (merging
    /// dictionaries); one present at or after `index` keeps its later
    /// definition. Returns the number of entries inserted.
    pub fn splice_at(&mut self, index: usize, entries: Dict) -> usize {
        let mut at = index.min(self.len());
        let mut inserted = 0;
        for (key, value) in entries.entries {
            match self.entries.get_index_of(&key) {
                Some(pos) if pos >= at => {}
                Some(_) => self.insert(key, value),
                None => {
                    self.entries.shift_insert(at, key, value);
                    at += 1;
                    inserted += 1;
                }
            }
        }
        inserted
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a value by path.
    ///
    /// A key that exists verbatim wins; otherwise the path is split at `.` or
    /// `/` into nested dictionary lookups.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if let Some(v) = self.entries.get(path) {
            return Some(v);
        }
        for (i, sep) in path.char_indices() {
            if sep != '.' && sep != '/' {
                continue;
            }
            let (head, rest) = (&path[..i], &path[i + 1..]);
            if let Some(Value::Dict(sub)) = self.entries.get(head)
                && let Some(v) = sub.get_path(rest)
            {
                return Some(v);
            }
        }
        None
    }

    /// Mutable lookup by path, with the same rules as [`Dict::get_path`].
    pub fn get_path_mut(&mut self, path: &str) -> Option<&mut Value> {
        if self.entries.contains_key(path) {
            return self.entries.get_mut(path);
        }
        let split = path.char_indices().find_map(|(i, sep)| {
            let (head, rest) = (&path[..i], &path[i + 1..]);
            let found = (sep == '.' || sep == '/')
                && matches!(self.entries.get(head), Some(Value::Dict(sub)) if sub.get_path(rest).is_some());
            found.then_some(i)
        })?;
        match self.entries.get_mut(&path[..split]) {
            Some(Value::Dict(sub)) => sub.get_path_mut(&path[split + 1..]),
            _ => None,
        }
    }

    /// Follow a sequence of keys through nested dictionaries.
    pub fn dict_at(&self, keys: &[String]) -> Option<&Dict> {
        keys.iter()
            .try_fold(self, |d, k| d.get(k).and_then(Value::as_dict))
    }

    pub fn dict_at_mut(&mut self, keys: &[String]) -> Option<&mut Dict> {
        keys.iter()
            .try_fold(self, |d, k| d.get_mut(k).and_then(Value::as_dict_mut))
    }
}

impl std::ops::Index<&str> for Dict {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        match self.entries.get(key) {
            Some(v) => v,
            None => panic!("key not found: {key}"),
        }
    }
}

impl FromIterator<(String, Value)> for Dict {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut dict = Dict::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

impl<'a> FromIterator<(&'a str, Value)> for Dict {
    fn from_iter<I: IntoIterator<Item = (&'a str, Value)>>(iter: I) -> Self {
        iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

impl IntoIterator for Dict {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: &[(&str, Value)]) -> Dict {
        entries.iter().cloned().collect()
    }

    fn keys(d: &Dict) -> Vec<&str> {
        d.keys().collect()
    }

    #[test]
    fn test_reassignment_keeps_position() {
        let mut d = dict(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
        d.insert("a", Value::Int(3));
        assert_eq!(keys(&d), vec!["a", "b"]);
        assert_eq!(d["a"], Value::Int(3));
    }

    #[test]
    fn test_insert_merges_dicts() {
        let mut d = dict(&[(
            "solver",
            Value::Dict(dict(&[("tol", Value::Float(1e-6)), ("max", Value::Int(10))])),
        )]);
        d.insert(
            "solver",
            Value::Dict(dict(&[("tol", Value::Float(1e-8)), ("smoother", "GaussSeidel".into())])),
        );
        let solver = d["solver"].as_dict().unwrap();
        assert_eq!(keys(solver), vec!["tol", "max", "smoother"]);
        assert_eq!(solver["tol"], Value::Float(1e-8));
    }

    #[test]
    fn test_merge_leaves_argument_untouched() {
        let mut a = dict(&[("x", Value::Int(1)), ("sub", Value::Dict(dict(&[("y", Value::Int(2))])))]);
        let b = dict(&[("sub", Value::Dict(dict(&[("z", Value::Int(3))]))), ("w", Value::Int(4))]);
        let before = b.clone();
        a.merge(&b);
        assert_eq!(b, before);
        assert_eq!(keys(&a), vec!["x", "sub", "w"]);
        assert_eq!(keys(a["sub"].as_dict().unwrap()), vec!["y", "z"]);
    }

    #[test]
    fn test_scalar_replaces_dict() {
        let mut a = dict(&[("sub", Value::Dict(dict(&[("y", Value::Int(2))])))]);
        a.merge(&dict(&[("sub", Value::Int(0))]));
        assert_eq!(a["sub"], Value::Int(0));
    }

    #[test]
    fn test_pop_keeps_order() {
        let mut d = dict(&[("a", Value::Int(1)), ("b", Value::Int(2)), ("c", Value::Int(3))]);
        assert_eq!(d.pop("b"), Some(Value::Int(2)));
        assert_eq!(d.pop("b"), None);
        assert_eq!(keys(&d), vec!["a", "c"]);
    }

    #[test]
    fn test_splice_at() {
        let mut d = dict(&[
            ("a", Value::Int(1)),
            ("b", Value::Int(2)),
            ("c", Value::Int(3)),
        ]);
        let incoming = dict(&[
            ("a", Value::Int(10)),
            ("x", Value::Int(20)),
            ("c", Value::Int(30)),
            ("y", Value::Int(40)),
        ]);
        let n = d.splice_at(1, incoming);
        assert_eq!(n, 2);
        assert_eq!(keys(&d), vec!["a", "x", "y", "b", "c"]);
        assert_eq!(d["a"], Value::Int(10));
        assert_eq!(d["c"], Value::Int(3));
    }

    #[test]
    fn test_paths() {
        let mut d = dict(&[(
            "outer",
            Value::Dict(dict(&[("inner", Value::Dict(dict(&[("v", Value::Int(7))])))])),
        )]);
        d.insert("a.b", Value::Int(1));
        assert_eq!(d.get_path("outer.inner.v"), Some(&Value::Int(7)));
        assert_eq!(d.get_path("outer/inner/v"), Some(&Value::Int(7)));
        assert_eq!(d.get_path("a.b"), Some(&Value::Int(1)));
        assert_eq!(d.get_path("outer.missing"), None);

        *d.get_path_mut("outer.inner.v").unwrap() = Value::Int(8);
        assert_eq!(d.get_path("outer.inner.v"), Some(&Value::Int(8)));

        let keys = vec!["outer".to_string(), "inner".to_string()];
        assert_eq!(d.dict_at(&keys).map(Dict::len), Some(1));
        assert!(d.dict_at(&["a.b".to_string()]).is_none());
    }
}
