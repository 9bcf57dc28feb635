//! Error types for thesisbuild.
//!
//! Library crates use [`ThesisBuildError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all thesisbuild operations.
#[derive(Debug, thiserror::Error)]
pub enum ThesisBuildError {
    /// A required file or directory does not exist.
    #[error("not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// No candidate directory contained the requested chapter.
    #[error("chapter '{chapter}' not found; searched: {}", display_paths(.searched))]
    ChapterNotFound {
        chapter: String,
        searched: Vec<PathBuf>,
    },

    /// Malformed structured text.
    #[error("parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// Settings document lacks required top-level sections.
    #[error("settings missing required keys: {}", .keys.join(", "))]
    MissingKeys { keys: Vec<String> },

    /// A `{name}` token with no directory table entry.
    #[error("unresolved placeholder '{key}' in \"{value}\"")]
    UnresolvedPlaceholder { key: String, value: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Tool configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Data validation error (wrong section shape, reference cycle, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// No dataset loader is registered for a file extension.
    #[error("no dataset loader for extension '{extension}' ({})", .path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The external renderer failed.
    #[error("render error: {0}")]
    Render(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ThesisBuildError>;

impl ThesisBuildError {
    /// Create a not-found error for a path.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a parse error for a file.
    pub fn parse(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error reports a missing file, directory, or chapter.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ChapterNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ThesisBuildError::config("unknown policy 'maybe'");
        assert_eq!(err.to_string(), "config error: unknown policy 'maybe'");

        let err = ThesisBuildError::MissingKeys {
            keys: vec!["graphics".into(), "datasets".into()],
        };
        assert_eq!(
            err.to_string(),
            "settings missing required keys: graphics, datasets"
        );
    }

    #[test]
    fn chapter_not_found_lists_searched_dirs() {
        let err = ThesisBuildError::ChapterNotFound {
            chapter: "missing".into(),
            searched: vec![PathBuf::from("/repo"), PathBuf::from("/repo/raw_rmd")],
        };
        let msg = err.to_string();
        assert!(msg.contains("'missing'"));
        assert!(msg.contains("/repo, /repo/raw_rmd"));
        assert!(err.is_not_found());
    }

    #[test]
    fn unresolved_placeholder_shows_token() {
        let err = ThesisBuildError::UnresolvedPlaceholder {
            key: "figs".into(),
            value: "{figs}/a.png".into(),
        };
        assert_eq!(
            err.to_string(),
            "unresolved placeholder 'figs' in \"{figs}/a.png\""
        );
        assert!(!err.is_not_found());
    }
}
