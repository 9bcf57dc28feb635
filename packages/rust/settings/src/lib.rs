//! Settings resolution for thesisbuild.
//!
//! A thesis repository carries a YAML settings document with the libraries
//! the renderer should enable, a directory table of symbolic paths, and
//! per-chapter graphics and dataset tables. [`SettingsResolver::open`] loads
//! that document, validates its sections, and substitutes `{name}` directory
//! placeholders so every path handed to the renderer is fully resolved.

mod document;
mod placeholder;

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, info, instrument};

use thesisbuild_shared::{Result, SettingsConfig, ThesisBuildError, UnresolvedPolicy};

pub use document::{SettingsDocument, load, persist, validate};
pub use placeholder::{DirectoryTable, has_placeholder, interpolate, resolve_placeholders};

/// Section listing the libraries the renderer should enable.
pub const LIBRARIES_KEY: &str = "libraries";
/// Section mapping chapters to graphics files.
pub const GRAPHICS_KEY: &str = "graphics";
/// Section mapping chapters to dataset files.
pub const DATASETS_KEY: &str = "datasets";
/// Optional section giving the combined thesis chapter order.
pub const CHAPTERS_KEY: &str = "chapters";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Schema and policy used when opening a settings document.
#[derive(Debug, Clone)]
pub struct SettingsOptions {
    /// Top-level sections that must be present.
    pub required_keys: Vec<String>,
    /// Section holding the directory table.
    pub directory_section: String,
    /// Handling of tokens missing from the directory table.
    pub policy: UnresolvedPolicy,
}

impl Default for SettingsOptions {
    fn default() -> Self {
        Self::from(&SettingsConfig::default())
    }
}

impl From<&SettingsConfig> for SettingsOptions {
    fn from(config: &SettingsConfig) -> Self {
        Self {
            required_keys: config.required_keys.clone(),
            directory_section: config.directory_section.clone(),
            policy: config.unresolved_placeholders,
        }
    }
}

// ---------------------------------------------------------------------------
// SettingsResolver
// ---------------------------------------------------------------------------

/// A loaded, validated, and placeholder-resolved settings document.
///
/// Only constructed through [`SettingsResolver::open`]; a failure at any
/// stage means no resolver exists.
#[derive(Debug, Clone)]
pub struct SettingsResolver {
    source: PathBuf,
    document: SettingsDocument,
    directories: DirectoryTable,
}

impl SettingsResolver {
    /// Load → validate → expand the directory table → resolve placeholders.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path, options: &SettingsOptions) -> Result<Self> {
        debug!(stage = "loading", "opening settings");
        let raw = load(path)?;

        debug!(stage = "validating", required = options.required_keys.len());
        validate(&raw, &options.required_keys)?;

        debug!(stage = "resolving", section = %options.directory_section);
        let directories =
            DirectoryTable::from_section(&raw, &options.directory_section)?.expand()?;
        let document = resolve_placeholders(&raw, &directories, options.policy)?;

        info!(
            sections = document.as_mapping().len(),
            directories = directories.len(),
            "settings ready"
        );

        Ok(Self {
            source: path.to_path_buf(),
            document,
            directories,
        })
    }

    /// File the settings were loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The resolved document.
    pub fn document(&self) -> &SettingsDocument {
        &self.document
    }

    /// The expanded directory table used for substitution.
    pub fn directories(&self) -> &DirectoryTable {
        &self.directories
    }

    /// Write the resolved document to `path`.
    pub fn persist(&self, path: &Path) -> Result<()> {
        persist(&self.document, path)
    }

    /// Libraries to enable in the renderer, in document order.
    pub fn libraries(&self) -> Result<Vec<String>> {
        match self.document.get(LIBRARIES_KEY) {
            None => Ok(Vec::new()),
            Some(value) => string_list(value, LIBRARIES_KEY),
        }
    }

    /// Combined thesis chapter order, if the document declares one.
    pub fn chapters(&self) -> Result<Option<Vec<String>>> {
        self.document
            .get(CHAPTERS_KEY)
            .map(|value| string_list(value, CHAPTERS_KEY))
            .transpose()
    }

    /// Graphics files for a chapter. A chapter without an entry has none.
    pub fn graphics_paths(&self, chapter: &str) -> Result<Vec<PathBuf>> {
        let Some(entry) = self.chapter_entry(GRAPHICS_KEY, chapter)? else {
            return Ok(Vec::new());
        };
        let context = format!("{GRAPHICS_KEY}.{chapter}");
        Ok(string_list(entry, &context)?
            .into_iter()
            .map(PathBuf::from)
            .collect())
    }

    /// Named dataset files for a chapter.
    ///
    /// Accepts a mapping of name → path, or a list of paths named by their
    /// file stem.
    pub fn dataset_paths(&self, chapter: &str) -> Result<Vec<(String, PathBuf)>> {
        let Some(entry) = self.chapter_entry(DATASETS_KEY, chapter)? else {
            return Ok(Vec::new());
        };
        let context = format!("{DATASETS_KEY}.{chapter}");

        if let Value::Mapping(mapping) = entry {
            let mut out = Vec::with_capacity(mapping.len());
            for (name, path) in mapping {
                let name = name.as_str().ok_or_else(|| {
                    ThesisBuildError::validation(format!("{context} has a non-string name"))
                })?;
                let path = path.as_str().ok_or_else(|| {
                    ThesisBuildError::validation(format!("{context}.{name} must be a string path"))
                })?;
                out.push((name.to_string(), PathBuf::from(path)));
            }
            return Ok(out);
        }

        Ok(string_list(entry, &context)?
            .into_iter()
            .map(|path| {
                let path = PathBuf::from(path);
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (name, path)
            })
            .collect())
    }

    /// Per-chapter entry of a section; exact key first, then case-insensitive.
    fn chapter_entry(&self, section: &str, chapter: &str) -> Result<Option<&Value>> {
        let mapping = match self.document.get(section) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Mapping(m)) => m,
            Some(_) => {
                return Err(ThesisBuildError::validation(format!(
                    "section '{section}' must be a mapping keyed by chapter"
                )));
            }
        };

        if let Some(value) = mapping.get(chapter) {
            return Ok(Some(value));
        }
        Ok(mapping.iter().find_map(|(key, value)| {
            key.as_str()
                .filter(|k| k.eq_ignore_ascii_case(chapter))
                .map(|_| value)
        }))
    }
}

/// A string or list of strings; null is an empty list.
fn string_list(value: &Value, context: &str) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(String::from).ok_or_else(|| {
                    ThesisBuildError::validation(format!(
                        "'{context}' must contain only strings, found {item:?}"
                    ))
                })
            })
            .collect(),
        _ => Err(ThesisBuildError::validation(format!(
            "'{context}' must be a string or a list of strings"
        ))),
    }
}
