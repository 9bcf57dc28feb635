//! `{name}` placeholder substitution against a directory table.
//!
//! A token is `{` + identifier + `}` where the identifier matches
//! `[A-Za-z_][A-Za-z0-9_]*`. Substitution is a single left-to-right pass:
//! replacement text is never rescanned, so a table value containing a token
//! must be expanded first (see [`DirectoryTable::expand`]).

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use thesisbuild_shared::{Result, ThesisBuildError, UnresolvedPolicy};

use crate::document::SettingsDocument;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

// ---------------------------------------------------------------------------
// DirectoryTable
// ---------------------------------------------------------------------------

/// Symbolic name → path string, the substitution source for placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryTable {
    entries: BTreeMap<String, String>,
}

impl DirectoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the table from a top-level section of `doc`.
    ///
    /// An absent section yields an empty table. Every value must be a string.
    pub fn from_section(doc: &SettingsDocument, section: &str) -> Result<Self> {
        let Some(value) = doc.get(section) else {
            debug!(section, "directory section absent, using empty table");
            return Ok(Self::new());
        };

        let mapping = match value {
            Value::Mapping(m) => m,
            Value::Null => return Ok(Self::new()),
            _ => {
                return Err(ThesisBuildError::validation(format!(
                    "section '{section}' must be a mapping of name to path"
                )));
            }
        };

        let mut table = Self::new();
        for (key, value) in mapping {
            let name = key.as_str().ok_or_else(|| {
                ThesisBuildError::validation(format!(
                    "section '{section}' has a non-string key: {key:?}"
                ))
            })?;
            let path = value.as_str().ok_or_else(|| {
                ThesisBuildError::validation(format!(
                    "directory '{section}.{name}' must be a string path"
                ))
            })?;
            table.insert(name, path);
        }
        Ok(table)
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<String>) -> Option<String> {
        self.entries.insert(name.into(), path.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolve entries that reference other entries (`data: "{repo}/data"`).
    ///
    /// Unknown tokens are kept. Entries still referencing table keys once
    /// expansion settles, or after `len()` passes, form a cycle and fail
    /// with a validation error.
    pub fn expand(&self) -> Result<Self> {
        let mut table = self.clone();

        for _ in 0..table.len() {
            let mut changed = false;
            let mut next = BTreeMap::new();
            for (name, path) in &table.entries {
                let expanded = interpolate(path, &table, UnresolvedPolicy::Keep)?;
                if expanded != path.as_str() {
                    changed = true;
                }
                next.insert(name.clone(), expanded.into_owned());
            }
            table.entries = next;
            if !changed {
                break;
            }
        }

        let cyclic: Vec<&str> = table
            .entries
            .iter()
            .filter(|(_, path)| references_known(path, &table))
            .map(|(name, _)| name.as_str())
            .collect();

        if cyclic.is_empty() {
            Ok(table)
        } else {
            Err(ThesisBuildError::validation(format!(
                "circular directory reference among: {}",
                cyclic.join(", ")
            )))
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DirectoryTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Whether `value` contains at least one placeholder token.
pub fn has_placeholder(value: &str) -> bool {
    TOKEN_RE.is_match(value)
}

/// Substitute every known token in `value`.
///
/// Strings without tokens are borrowed back unchanged.
pub fn interpolate<'a>(
    value: &'a str,
    table: &DirectoryTable,
    policy: UnresolvedPolicy,
) -> Result<Cow<'a, str>> {
    if !has_placeholder(value) {
        return Ok(Cow::Borrowed(value));
    }

    let mut out = String::with_capacity(value.len());
    let mut last = 0;

    for caps in TOKEN_RE.captures_iter(value) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&value[last..whole.start()]);

        match table.get(name.as_str()) {
            Some(path) => out.push_str(path),
            None => match policy {
                UnresolvedPolicy::Keep => out.push_str(whole.as_str()),
                UnresolvedPolicy::Error => {
                    return Err(ThesisBuildError::UnresolvedPlaceholder {
                        key: name.as_str().to_string(),
                        value: value.to_string(),
                    });
                }
            },
        }
        last = whole.end();
    }

    out.push_str(&value[last..]);
    Ok(Cow::Owned(out))
}

/// Return a copy of `doc` with every string scalar interpolated.
///
/// Walks mappings, sequences, and tagged values at any depth. Mapping keys,
/// non-string scalars, and nulls are copied as they are. `doc` is untouched.
pub fn resolve_placeholders(
    doc: &SettingsDocument,
    table: &DirectoryTable,
    policy: UnresolvedPolicy,
) -> Result<SettingsDocument> {
    let root = resolve_mapping(doc.as_mapping(), table, policy)?;
    Ok(SettingsDocument::from_mapping(root))
}

fn resolve_mapping(
    mapping: &Mapping,
    table: &DirectoryTable,
    policy: UnresolvedPolicy,
) -> Result<Mapping> {
    let mut out = Mapping::with_capacity(mapping.len());
    for (key, value) in mapping {
        out.insert(key.clone(), resolve_value(value, table, policy)?);
    }
    Ok(out)
}

fn resolve_value(value: &Value, table: &DirectoryTable, policy: UnresolvedPolicy) -> Result<Value> {
    Ok(match value {
        Value::String(s) => Value::String(interpolate(s, table, policy)?.into_owned()),
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(|item| resolve_value(item, table, policy))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Mapping(mapping) => Value::Mapping(resolve_mapping(mapping, table, policy)?),
        Value::Tagged(tagged) => Value::Tagged(Box::new(TaggedValue {
            tag: tagged.tag.clone(),
            value: resolve_value(&tagged.value, table, policy)?,
        })),
        other => other.clone(),
    })
}

fn references_known(value: &str, table: &DirectoryTable) -> bool {
    TOKEN_RE
        .captures_iter(value)
        .filter_map(|caps| caps.get(1))
        .any(|name| table.get(name.as_str()).is_some())
}
