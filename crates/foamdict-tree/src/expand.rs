//! Macro expansion and `#remove` processing.
//!
//! Expansion walks the tree depth first. At every dictionary level it keeps
//! the chain of keys leading from the root to that level; this chain is the
//! scope stack used to resolve references:
//!
//! | form              | searched scopes                          |
//! |-------------------|------------------------------------------|
//! | `$a`, `${a}`      | current scope, then each parent to root  |
//! | `$.a`             | current scope only                       |
//! | `$..a`, `$...a`   | one (two, ...) levels up                 |
//! | `$:a`, `$/a`      | root                                     |
//!
//! Names may be paths (`$sub.a`, `$sub/a`); nested references such as
//! `${${name}}` are resolved inside out.

use regex::Regex;
use tracing::{debug, warn};

use crate::{Dict, Directive, Value};

/// What to do with a macro reference that resolves to nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MacroPolicy {
    /// Log a warning and leave the reference in the tree.
    #[default]
    Warn,
    /// Abort expansion with [`ExpandError::UnresolvedMacro`].
    Fail,
}

/// Errors raised while expanding a document.
#[derive(Debug)]
pub enum ExpandError {
    /// A reference matched no entry in any searched scope.
    UnresolvedMacro { reference: String, scope: String },
    /// A keyword-less reference named something other than a dictionary.
    NotADictionary { reference: String, found: &'static str },
    /// A `#remove` pattern is not a valid regular expression.
    InvalidRemovePattern {
        pattern: String,
        source: regex::Error,
    },
}

impl std::fmt::Display for ExpandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpandError::UnresolvedMacro { reference, scope } => {
                write!(f, "unresolved macro reference {reference} in scope {scope}")
            }
            ExpandError::NotADictionary { reference, found } => write!(
                f,
                "macro reference {reference} must name a dictionary, found a {found}"
            ),
            ExpandError::InvalidRemovePattern { pattern, source } => {
                write!(f, "invalid #remove pattern {pattern}: {source}")
            }
        }
    }
}

impl std::error::Error for ExpandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExpandError::InvalidRemovePattern { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Guard against self-referential chains such as `a $b; b $a;`.
const MAX_CHAIN: usize = 32;

impl Dict {
    /// Substitute every macro reference in the document.
    ///
    /// Keyword-less references splice the entries of the dictionary they name
    /// into the enclosing dictionary at their own position. References used as
    /// values, or nested inside values, are replaced by a copy of the named
    /// value. After each dictionary level is expanded its `#remove`
    /// directives are applied.
    pub fn expand_macros(&mut self, policy: MacroPolicy) -> Result<(), ExpandError> {
        let mut scope = Vec::new();
        expand_scope(self, &mut scope, policy)
    }

    /// Apply the `#remove` directives of this level.
    ///
    /// Directives are collected and dropped first; then every key that fully
    /// matches any collected pattern is removed.
    pub fn process_removes(&mut self) -> Result<(), ExpandError> {
        let mut patterns = Vec::new();
        self.retain(|_, value| match value {
            Value::Directive(d) if d.standalone && d.name == "#remove" => {
                patterns.extend(remove_patterns(d));
                false
            }
            _ => true,
        });
        if patterns.is_empty() {
            return Ok(());
        }

        let regexes = patterns
            .into_iter()
            .map(|pattern| {
                Regex::new(&format!("^(?:{pattern})$"))
                    .map_err(|source| ExpandError::InvalidRemovePattern { pattern, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.retain(|key, _| {
            let removed = regexes.iter().any(|re| re.is_match(key));
            if removed {
                debug!("#remove drops {key}");
            }
            !removed
        });
        Ok(())
    }
}

fn remove_patterns(directive: &Directive) -> Vec<String> {
    match directive.payload.as_ref() {
        Value::List(items) | Value::Multi(items) => items
            .iter()
            .filter_map(Value::as_unquoted)
            .map(str::to_string)
            .collect(),
        other => other
            .as_unquoted()
            .map(|p| vec![p.to_string()])
            .unwrap_or_default(),
    }
}

fn scope_name(scope: &[String]) -> String {
    if scope.is_empty() {
        "<root>".to_string()
    } else {
        scope.join(".")
    }
}

fn expand_scope(
    root: &mut Dict,
    scope: &mut Vec<String>,
    policy: MacroPolicy,
) -> Result<(), ExpandError> {
    let mut index = 0;
    loop {
        let Some(current) = root.dict_at(scope) else {
            return Ok(());
        };
        let Some((key, value)) = current.get_index(index) else {
            break;
        };

        match value {
            Value::Macro(m) if m.standalone => {
                let reference = m.text.clone();
                match resolve(root, scope, &reference) {
                    Some(Value::Dict(entries)) => {
                        debug!("splicing {reference} into {}", scope_name(scope));
                        if let Some(current) = root.dict_at_mut(scope) {
                            current.pop_index(index);
                            index += current.splice_at(index, entries);
                        }
                    }
                    Some(other) => {
                        return Err(ExpandError::NotADictionary {
                            reference,
                            found: other.kind_name(),
                        });
                    }
                    None => {
                        unresolved(&reference, scope, policy)?;
                        index += 1;
                    }
                }
            }
            Value::Dict(_) => {
                scope.push(key.to_string());
                expand_scope(root, scope, policy)?;
                scope.pop();
                index += 1;
            }
            _ => {
                let mut value = value.clone();
                let mut failure = None;
                value.walk_mut(&mut |v| {
                    if failure.is_some() {
                        return;
                    }
                    if let Err(e) = substitute(root, scope, v, policy) {
                        failure = Some(e);
                    }
                });
                if let Some(e) = failure {
                    return Err(e);
                }
                if let Some((_, slot)) = root
                    .dict_at_mut(scope)
                    .and_then(|d| d.get_index_mut(index))
                {
                    *slot = value;
                }
                index += 1;
            }
        }
    }

    match root.dict_at_mut(scope) {
        Some(current) => current.process_removes(),
        None => Ok(()),
    }
}

/// Replace a keyed macro reference with a copy of what it names.
fn substitute(
    root: &Dict,
    scope: &[String],
    value: &mut Value,
    policy: MacroPolicy,
) -> Result<(), ExpandError> {
    for _ in 0..MAX_CHAIN {
        let Value::Macro(m) = value else {
            return Ok(());
        };
        match resolve(root, scope, &m.text) {
            Some(resolved) => *value = resolved,
            None => return unresolved(&m.text.clone(), scope, policy),
        }
    }
    Ok(())
}

fn unresolved(reference: &str, scope: &[String], policy: MacroPolicy) -> Result<(), ExpandError> {
    let scope = scope_name(scope);
    match policy {
        MacroPolicy::Warn => {
            warn!("unresolved macro reference {reference} in scope {scope}");
            Ok(())
        }
        MacroPolicy::Fail => Err(ExpandError::UnresolvedMacro {
            reference: reference.to_string(),
            scope,
        }),
    }
}

/// Resolve a reference to a copy of the value it names.
fn resolve(root: &Dict, scope: &[String], reference: &str) -> Option<Value> {
    let body = reference.strip_prefix('$')?;
    let name = match body.strip_prefix('{').and_then(|b| b.strip_suffix('}')) {
        Some(inner) if inner.starts_with('$') => {
            let named = resolve(root, scope, inner)?;
            named.as_unquoted()?.to_string()
        }
        Some(inner) => inner.to_string(),
        None => body.to_string(),
    };
    lookup(root, scope, &name).cloned()
}

/// Look a name up against the scope stack, honouring scope sigils.
fn lookup<'a>(root: &'a Dict, scope: &[String], name: &str) -> Option<&'a Value> {
    if let Some(rest) = name.strip_prefix(':').or_else(|| name.strip_prefix('/')) {
        return root.get_path(rest);
    }

    let dots = name.chars().take_while(|&c| c == '.').count();
    if dots > 0 {
        let rest = &name[dots..];
        let depth = scope.len().saturating_sub(dots - 1);
        return root.dict_at(&scope[..depth])?.get_path(rest);
    }

    (0..=scope.len())
        .rev()
        .filter_map(|depth| root.dict_at(&scope[..depth]))
        .find_map(|d| d.get_path(name))
}
