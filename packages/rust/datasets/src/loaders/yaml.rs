//! YAML loader. Documents are converted to JSON values so every
//! structured dataset has the same in-memory shape.

use std::path::Path;

use thesisbuild_shared::{Result, ThesisBuildError};

use super::{DatasetLoader, read_text};
use crate::Dataset;

pub struct YamlLoader;

impl DatasetLoader for YamlLoader {
    fn extensions(&self) -> &[&'static str] {
        &["yaml", "yml"]
    }

    fn load(&self, path: &Path) -> Result<Dataset> {
        let text = read_text(path)?;
        serde_yaml::from_str::<serde_json::Value>(&text)
            .map(Dataset::Document)
            .map_err(|e| ThesisBuildError::parse(path, e.to_string()))
    }

    fn name(&self) -> &str {
        "yaml"
    }
}
