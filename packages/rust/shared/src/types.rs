//! Core domain types for thesisbuild.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ThesisBuildError;

/// Current schema version for the build report format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// OutputFormat
// ---------------------------------------------------------------------------

/// Document format produced by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Docx,
}

impl OutputFormat {
    /// File extension of the rendered document.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    /// Format name understood by the R Markdown renderer.
    pub fn renderer_name(self) -> &'static str {
        match self {
            Self::Pdf => "pdf_document",
            Self::Docx => "word_document",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ThesisBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" => Ok(Self::Docx),
            other => Err(ThesisBuildError::config(format!(
                "unknown output format '{other}': expected 'pdf' or 'docx'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// UnresolvedPolicy
// ---------------------------------------------------------------------------

/// Handling of `{name}` tokens that have no directory table entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Leave the token in place, verbatim.
    #[default]
    Keep,
    /// Fail with [`ThesisBuildError::UnresolvedPlaceholder`].
    Error,
}

// ---------------------------------------------------------------------------
// BuildId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for build identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(pub Uuid);

impl BuildId {
    /// Generate a new time-sortable build identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BuildId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// BuildReport
// ---------------------------------------------------------------------------

/// The `<output>.build.json` record written next to each rendered document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Unique identifier for this build.
    pub id: BuildId,
    /// Chapter name, or the combined thesis name.
    pub target: String,
    pub format: OutputFormat,
    /// Chapter sources in render order.
    pub sources: Vec<PathBuf>,
    /// Rendered document.
    pub output: PathBuf,
    /// SHA-256 of the rendered document.
    pub output_sha256: String,
    /// Libraries handed to the renderer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<String>,
    /// Dataset names handed to the renderer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datasets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub graphics: Vec<PathBuf>,
    /// Intermediates removed after rendering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_intermediates: Vec<PathBuf>,
    /// Renderer that produced the output.
    pub renderer: String,
    /// Tool version that ran the build.
    pub tool_version: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_id_roundtrip() {
        let id = BuildId::new();
        let s = id.to_string();
        let parsed: BuildId = s.parse().expect("parse BuildId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("pdf".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("DOCX".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert_eq!("word".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        let err = "html".parse::<OutputFormat>().unwrap_err();
        assert!(err.to_string().contains("'html'"));
    }

    #[test]
    fn output_format_names() {
        assert_eq!(OutputFormat::Pdf.extension(), "pdf");
        assert_eq!(OutputFormat::Docx.renderer_name(), "word_document");
        assert_eq!(OutputFormat::Docx.to_string(), "docx");
    }

    #[test]
    fn report_serialization() {
        let now = Utc::now();
        let report = BuildReport {
            schema_version: CURRENT_SCHEMA_VERSION,
            id: BuildId::new(),
            target: "intro".into(),
            format: OutputFormat::Pdf,
            sources: vec![PathBuf::from("/repo/raw_rmd/Intro.Rmd")],
            output: PathBuf::from("/repo/output/intro.pdf"),
            output_sha256: "00".repeat(32),
            libraries: vec!["knitr".into()],
            datasets: vec![],
            graphics: vec![],
            removed_intermediates: vec![],
            renderer: "Rscript".into(),
            tool_version: "0.1.0".into(),
            started_at: now,
            finished_at: now,
        };

        let json = serde_json::to_string_pretty(&report).expect("serialize");
        assert!(json.contains("\"format\": \"pdf\""));
        assert!(!json.contains("datasets"));

        let parsed: BuildReport = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(parsed.target, "intro");
        assert_eq!(parsed.libraries, vec!["knitr"]);
        assert!(parsed.datasets.is_empty());
    }
}
