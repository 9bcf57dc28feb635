//! Removal of renderer by-products.
//!
//! knitr and LaTeX leave `<stem>.tex`, `<stem>.log`, `<stem>_files/` and
//! similar next to the source or the output. Only names derived from the
//! given stem are touched.

use std::path::{Path, PathBuf};

use tracing::debug;

use thesisbuild_shared::{Result, ThesisBuildError};

/// File suffixes appended to the stem.
pub const INTERMEDIATE_FILE_SUFFIXES: &[&str] = &[
    ".tex", ".log", ".aux", ".out", ".toc", ".knit.md", ".utf8.md",
];

/// Directory suffixes appended to the stem.
pub const INTERMEDIATE_DIR_SUFFIXES: &[&str] = &["_files", "_cache"];

/// Intermediates for `stem` that currently exist in `dir`.
pub fn intermediates(dir: &Path, stem: &str) -> Vec<PathBuf> {
    let files = INTERMEDIATE_FILE_SUFFIXES
        .iter()
        .map(|suffix| dir.join(format!("{stem}{suffix}")))
        .filter(|p| p.is_file());
    let dirs = INTERMEDIATE_DIR_SUFFIXES
        .iter()
        .map(|suffix| dir.join(format!("{stem}{suffix}")))
        .filter(|p| p.is_dir());
    files.chain(dirs).collect()
}

/// Delete the intermediates for `stem` in `dir`, returning what was removed.
pub fn remove_intermediates(dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    let found = intermediates(dir, stem);
    for path in &found {
        if path.is_dir() {
            std::fs::remove_dir_all(path).map_err(|e| ThesisBuildError::io(path, e))?;
        } else {
            std::fs::remove_file(path).map_err(|e| ThesisBuildError::io(path, e))?;
        }
        debug!(path = %path.display(), "removed intermediate");
    }
    Ok(found)
}
