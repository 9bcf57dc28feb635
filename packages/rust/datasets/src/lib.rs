//! Auxiliary dataset loading for thesis chapters.
//!
//! Chapters list data files in the settings document. Each file is loaded
//! by the [`DatasetLoader`] registered for its extension; see
//! [`LoaderRegistry`] for the built-in formats.

pub mod loaders;

use std::path::Path;

pub use loaders::{DatasetLoader, DelimitedLoader, JsonLoader, LoaderRegistry, YamlLoader};

/// An in-memory dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    /// Delimited text with a header row.
    Table(Table),
    /// Structured data (JSON, YAML).
    Document(serde_json::Value),
}

/// Header row plus string cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Short human-readable shape, e.g. `12 rows × 3 columns`.
    pub fn summary(&self) -> String {
        match self {
            Self::Table(t) => format!("{} rows × {} columns", t.rows.len(), t.headers.len()),
            Self::Document(serde_json::Value::Object(map)) => format!("object, {} keys", map.len()),
            Self::Document(serde_json::Value::Array(items)) => {
                format!("array, {} items", items.len())
            }
            Self::Document(_) => "scalar".to_string(),
        }
    }
}

/// Load `path` with the built-in loaders.
pub fn load(path: &Path) -> thesisbuild_shared::Result<Dataset> {
    LoaderRegistry::new().load(path)
}
