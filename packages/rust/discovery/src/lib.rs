//! Chapter source discovery.
//!
//! A chapter name like `intro` maps to one markup file, `<name>.<ext>`,
//! found in the first of a short list of candidate directories under the
//! repository root. File names match case-insensitively, so `Intro.Rmd`
//! satisfies `intro`.
//!
//! When one directory holds several matching names (`Intro.Rmd` and
//! `intro.rmd`), the first in filesystem listing order wins and the others
//! are reported with a warning. Listing order is stable on a given
//! filesystem but differs between platforms.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use thesisbuild_shared::{ChaptersConfig, Result, ThesisBuildError};

// ---------------------------------------------------------------------------
// Free-standing lookup
// ---------------------------------------------------------------------------

/// Find `<chapter>.<extension>` under `repo_root`.
///
/// `candidate_subdirs` are searched in order; an empty entry is the root
/// itself. Missing subdirectories are skipped but still listed in the
/// not-found error.
#[instrument(skip_all, fields(chapter = %chapter, root = %repo_root.display()))]
pub fn locate<S: AsRef<str>>(
    chapter: &str,
    repo_root: &Path,
    candidate_subdirs: &[S],
    extension: &str,
) -> Result<PathBuf> {
    if !repo_root.exists() {
        return Err(ThesisBuildError::not_found(repo_root));
    }

    let wanted = format!("{chapter}.{extension}").to_lowercase();
    let mut searched = Vec::with_capacity(candidate_subdirs.len());

    for subdir in candidate_subdirs {
        let dir = candidate_dir(repo_root, subdir.as_ref());
        searched.push(dir.clone());

        if !dir.is_dir() {
            debug!(dir = %dir.display(), "candidate directory missing, skipping");
            continue;
        }

        if let Some(found) = first_match(&dir, &wanted)? {
            debug!(path = %found.display(), "chapter located");
            return Ok(found);
        }
    }

    Err(ThesisBuildError::ChapterNotFound {
        chapter: chapter.to_string(),
        searched,
    })
}

fn candidate_dir(root: &Path, subdir: &str) -> PathBuf {
    if subdir.is_empty() {
        root.to_path_buf()
    } else {
        root.join(subdir)
    }
}

/// First regular file in `dir` whose lower-cased name equals `wanted`.
fn first_match(dir: &Path, wanted: &str) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ThesisBuildError::io(dir, e))?;
    let mut found: Option<PathBuf> = None;

    for entry in entries {
        let entry = entry.map_err(|e| ThesisBuildError::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.to_lowercase() != wanted {
            continue;
        }

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        match &found {
            None => found = Some(path),
            Some(first) => warn!(
                chosen = %first.display(),
                ignored = %path.display(),
                "several files match case-insensitively; using the first listed"
            ),
        }
    }

    Ok(found)
}

// ---------------------------------------------------------------------------
// ChapterLocator
// ---------------------------------------------------------------------------

/// Repository root plus the search rules from `[chapters]` config.
#[derive(Debug, Clone)]
pub struct ChapterLocator {
    root: PathBuf,
    search_dirs: Vec<String>,
    extension: String,
}

impl ChapterLocator {
    pub fn new(
        root: impl Into<PathBuf>,
        search_dirs: Vec<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            search_dirs,
            extension: extension.into(),
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &ChaptersConfig) -> Self {
        Self::new(root, config.search_dirs.clone(), config.extension.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Locate one chapter.
    pub fn locate(&self, chapter: &str) -> Result<PathBuf> {
        locate(chapter, &self.root, self.search_dirs.as_slice(), &self.extension)
    }

    /// Locate chapters in order, failing on the first one missing.
    pub fn locate_all<S: AsRef<str>>(&self, chapters: &[S]) -> Result<Vec<PathBuf>> {
        chapters.iter().map(|c| self.locate(c.as_ref())).collect()
    }

    /// Every chapter reachable through the search rules, as (name, path).
    ///
    /// Names are lower-cased file stems; a name shadowed by an earlier
    /// directory is listed once, with the path `locate` would return.
    pub fn available(&self) -> Result<Vec<(String, PathBuf)>> {
        if !self.root.exists() {
            return Err(ThesisBuildError::not_found(&self.root));
        }

        let suffix = format!(".{}", self.extension).to_lowercase();
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for subdir in &self.search_dirs {
            let dir = candidate_dir(&self.root, subdir);
            if !dir.is_dir() {
                continue;
            }

            let entries = std::fs::read_dir(&dir).map_err(|e| ThesisBuildError::io(&dir, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| ThesisBuildError::io(&dir, e))?;
                let path = entry.path();
                let Some(name) = entry.file_name().to_str().map(str::to_lowercase) else {
                    continue;
                };
                let Some(stem) = name.strip_suffix(&suffix) else {
                    continue;
                };
                if stem.is_empty() || !path.is_file() {
                    continue;
                }
                if seen.insert(stem.to_string()) {
                    out.push((stem.to_string(), path));
                }
            }
        }

        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }
}
