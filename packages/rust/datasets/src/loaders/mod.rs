//! Dataset loader trait and the extension registry.
//!
//! Each supported format is one [`DatasetLoader`]. The registry maps
//! lower-cased file extensions to loaders; adding a format means
//! registering another loader, not touching the dispatch.

mod delimited;
mod json;
mod yaml;

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use thesisbuild_shared::{Result, ThesisBuildError};

use crate::Dataset;

pub use delimited::DelimitedLoader;
pub use json::JsonLoader;
pub use yaml::YamlLoader;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Reads one file format into a [`Dataset`].
pub trait DatasetLoader: Send + Sync {
    /// Extensions handled, without the leading dot.
    fn extensions(&self) -> &[&'static str];

    /// Parse the file at `path`. The registry has already checked it exists.
    fn load(&self, path: &Path) -> Result<Dataset>;

    /// Human-readable loader name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Extension → loader lookup table.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn DatasetLoader>>,
    by_extension: HashMap<String, usize>,
}

impl LoaderRegistry {
    /// Registry with every built-in loader: CSV, TSV, JSON, YAML.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(DelimitedLoader::csv()));
        registry.register(Box::new(DelimitedLoader::tsv()));
        registry.register(Box::new(JsonLoader));
        registry.register(Box::new(YamlLoader));
        registry
    }

    /// Registry with no loaders.
    pub fn empty() -> Self {
        Self {
            loaders: Vec::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Add a loader. Its extensions replace any earlier mapping.
    pub fn register(&mut self, loader: Box<dyn DatasetLoader>) {
        let index = self.loaders.len();
        for ext in loader.extensions() {
            self.by_extension.insert(ext.to_ascii_lowercase(), index);
        }
        self.loaders.push(loader);
    }

    /// Loader for an extension (case-insensitive, no leading dot).
    pub fn loader_for(&self, extension: &str) -> Option<&dyn DatasetLoader> {
        self.by_extension
            .get(&extension.to_ascii_lowercase())
            .map(|&i| self.loaders[i].as_ref())
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    /// Load a dataset, dispatching on the file extension.
    pub fn load(&self, path: &Path) -> Result<Dataset> {
        if !path.exists() {
            return Err(ThesisBuildError::not_found(path));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let loader =
            self.loader_for(extension)
                .ok_or_else(|| ThesisBuildError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    extension: extension.to_string(),
                })?;

        debug!(path = %path.display(), loader = loader.name(), "loading dataset");
        loader.load(path)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ThesisBuildError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::Table;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tb-datasets-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Treats every file as a one-cell table holding its length.
    struct LengthLoader;

    impl DatasetLoader for LengthLoader {
        fn extensions(&self) -> &[&'static str] {
            &["csv", "dat"]
        }

        fn load(&self, path: &Path) -> Result<Dataset> {
            let len = read_text(path)?.len();
            Ok(Dataset::Table(Table {
                headers: vec!["len".into()],
                rows: vec![vec![len.to_string()]],
            }))
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    #[test]
    fn builtin_extensions() {
        let registry = LoaderRegistry::new();
        assert_eq!(
            registry.extensions(),
            vec!["csv", "json", "tab", "tsv", "yaml", "yml"]
        );
        assert_eq!(registry.loader_for("CSV").map(|l| l.name()), Some("csv"));
        assert!(registry.loader_for("xlsx").is_none());
    }

    #[test]
    fn dispatches_on_extension() {
        let dir = temp_dir();
        let csv = dir.join("scores.CSV");
        std::fs::write(&csv, "name,score\nada,3\n").unwrap();
        let json = dir.join("meta.json");
        std::fs::write(&json, r#"{"n": 2}"#).unwrap();

        let registry = LoaderRegistry::new();
        assert!(matches!(registry.load(&csv).unwrap(), Dataset::Table(_)));
        assert_eq!(
            registry.load(&json).unwrap(),
            Dataset::Document(serde_json::json!({"n": 2}))
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = LoaderRegistry::new()
            .load(Path::new("/nonexistent/data.csv"))
            .unwrap_err();
        assert!(matches!(err, ThesisBuildError::NotFound { .. }));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = temp_dir();
        let path = dir.join("data.xlsx");
        std::fs::write(&path, "binary").unwrap();

        let err = LoaderRegistry::new().load(&path).unwrap_err();
        match err {
            ThesisBuildError::UnsupportedFormat { extension, .. } => assert_eq!(extension, "xlsx"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }

        let bare = dir.join("README");
        std::fs::write(&bare, "x").unwrap();
        assert!(LoaderRegistry::new().load(&bare).is_err());
    }

    #[test]
    fn registering_overrides_extension() {
        let dir = temp_dir();
        let path = dir.join("a.csv");
        std::fs::write(&path, "x,y\n1,2\n").unwrap();

        let mut registry = LoaderRegistry::new();
        registry.register(Box::new(LengthLoader));

        assert_eq!(registry.loader_for("csv").map(|l| l.name()), Some("length"));
        assert_eq!(registry.loader_for("tsv").map(|l| l.name()), Some("tsv"));
        assert!(registry.extensions().contains(&"dat"));

        let Dataset::Table(table) = registry.load(&path).unwrap() else {
            panic!("expected table");
        };
        assert_eq!(table.rows, vec![vec!["8".to_string()]]);
    }

    #[test]
    fn empty_registry_supports_nothing() {
        let registry = LoaderRegistry::empty();
        assert!(registry.extensions().is_empty());
        assert!(registry.loader_for("json").is_none());
    }
}
