//! Loading, validating, and persisting the YAML settings document.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use thesisbuild_shared::{Result, ThesisBuildError};

/// A parsed settings document. The root is always a mapping.
///
/// Equality ignores key order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsDocument {
    root: Mapping,
}

impl SettingsDocument {
    pub fn from_mapping(root: Mapping) -> Self {
        Self { root }
    }

    /// Parse YAML text. `origin` is only used for error messages.
    pub fn from_yaml_str(text: &str, origin: &Path) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)
            .map_err(|e| ThesisBuildError::parse(origin, e.to_string()))?;

        match value {
            Value::Mapping(root) => Ok(Self { root }),
            Value::Null => Err(ThesisBuildError::parse(origin, "document is empty")),
            _ => Err(ThesisBuildError::parse(
                origin,
                "top level must be a mapping of sections",
            )),
        }
    }

    /// Serialize back to YAML text.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.root).map_err(|e| {
            ThesisBuildError::validation(format!("YAML serialization failed: {e}"))
        })
    }

    /// Look up a top-level section.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Top-level keys that are strings, in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().filter_map(Value::as_str)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.root
    }

    pub fn into_mapping(self) -> Mapping {
        self.root
    }
}

/// Read and parse a settings document.
pub fn load(path: &Path) -> Result<SettingsDocument> {
    if !path.exists() {
        return Err(ThesisBuildError::not_found(path));
    }

    let mut text = String::new();
    {
        let mut file = File::open(path).map_err(|e| ThesisBuildError::io(path, e))?;
        file.read_to_string(&mut text)
            .map_err(|e| ThesisBuildError::io(path, e))?;
    }

    let doc = SettingsDocument::from_yaml_str(&text, path)?;
    debug!(path = %path.display(), sections = doc.root.len(), "loaded settings document");
    Ok(doc)
}

/// Check that every required key is a top-level section.
///
/// Reports all missing keys at once, in the order given.
pub fn validate<S: AsRef<str>>(doc: &SettingsDocument, required_keys: &[S]) -> Result<()> {
    let missing: Vec<String> = required_keys
        .iter()
        .map(AsRef::as_ref)
        .filter(|key| !doc.contains_key(key))
        .map(String::from)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ThesisBuildError::MissingKeys { keys: missing })
    }
}

/// Write a settings document to `path`, replacing any existing file.
pub fn persist(doc: &SettingsDocument, path: &Path) -> Result<()> {
    let text = doc.to_yaml_string()?;

    let mut file = File::create(path).map_err(|e| ThesisBuildError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| ThesisBuildError::io(path, e))?;
    file.flush().map_err(|e| ThesisBuildError::io(path, e))?;

    debug!(path = %path.display(), bytes = text.len(), "persisted settings document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const FIXTURE: &str = "../../../fixtures/settings/valid.yaml";

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tb-settings-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn load_fixture_has_required_sections() {
        let doc = load(Path::new(FIXTURE)).expect("load fixture");
        let keys: Vec<&str> = doc.keys().collect();
        for required in ["libraries", "directories", "graphics", "datasets"] {
            assert!(keys.contains(&required), "missing {required}");
        }
        validate(&doc, &["libraries", "directories", "graphics", "datasets"])
            .expect("fixture validates");
    }

    #[test]
    fn load_missing_path_is_not_found() {
        let err = load(Path::new("/nonexistent/settings.yaml")).unwrap_err();
        assert!(matches!(err, ThesisBuildError::NotFound { .. }));
        assert!(err.to_string().contains("/nonexistent/settings.yaml"));
    }

    #[test]
    fn load_malformed_is_parse_error() {
        let dir = temp_dir();
        let path = dir.join("broken.yaml");
        std::fs::write(&path, "libraries: [knitr\ndirectories: {").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ThesisBuildError::Parse { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn non_mapping_root_is_parse_error() {
        let err = SettingsDocument::from_yaml_str("- a\n- b\n", Path::new("list.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("top level must be a mapping"));

        let err = SettingsDocument::from_yaml_str("", Path::new("empty.yaml")).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn validate_reports_all_missing_in_order() {
        let doc = SettingsDocument::from_yaml_str(
            "directories:\n  repo: /home/u/proj\n",
            Path::new("partial.yaml"),
        )
        .unwrap();

        let err = validate(&doc, &["libraries", "directories", "graphics", "datasets"])
            .unwrap_err();
        match err {
            ThesisBuildError::MissingKeys { keys } => {
                assert_eq!(keys, vec!["libraries", "graphics", "datasets"]);
            }
            other => panic!("expected MissingKeys, got {other:?}"),
        }
    }

    #[test]
    fn missing_keys_fixture_fails_validation() {
        let doc = load(Path::new("../../../fixtures/settings/missing-keys.yaml")).unwrap();
        let err = validate(&doc, &["libraries", "directories", "graphics", "datasets"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "settings missing required keys: graphics, datasets"
        );
    }

    #[test]
    fn persist_then_load_roundtrip() {
        let dir = temp_dir();
        let original = load(Path::new(FIXTURE)).unwrap();

        let out = dir.join("roundtrip.yaml");
        persist(&original, &out).expect("persist");
        let reloaded = load(&out).expect("reload");

        assert_eq!(original, reloaded);
    }

    #[test]
    fn persist_overwrites_existing_file() {
        let dir = temp_dir();
        let out = dir.join("settings.yaml");
        std::fs::write(&out, "stale: true\n").unwrap();

        let doc = SettingsDocument::from_yaml_str("fresh: 1\n", Path::new("inline")).unwrap();
        persist(&doc, &out).unwrap();

        let reloaded = load(&out).unwrap();
        assert!(reloaded.contains_key("fresh"));
        assert!(!reloaded.contains_key("stale"));
    }

    #[test]
    fn persist_into_missing_directory_is_io_error() {
        let doc = SettingsDocument::default();
        let err = persist(&doc, Path::new("/nonexistent-dir/out.yaml")).unwrap_err();
        assert!(matches!(err, ThesisBuildError::Io { .. }));
    }

    #[test]
    fn equality_ignores_key_order() {
        let a = SettingsDocument::from_yaml_str("x: 1\ny: 2\n", Path::new("a")).unwrap();
        let b = SettingsDocument::from_yaml_str("y: 2\nx: 1\n", Path::new("b")).unwrap();
        assert_eq!(a, b);
    }
}
