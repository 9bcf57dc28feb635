//! JSON loader.

use std::path::Path;

use thesisbuild_shared::{Result, ThesisBuildError};

use super::{DatasetLoader, read_text};
use crate::Dataset;

pub struct JsonLoader;

impl DatasetLoader for JsonLoader {
    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn load(&self, path: &Path) -> Result<Dataset> {
        let text = read_text(path)?;
        serde_json::from_str(&text)
            .map(Dataset::Document)
            .map_err(|e| ThesisBuildError::parse(path, e.to_string()))
    }

    fn name(&self) -> &str {
        "json"
    }
}
