//! Tool configuration for thesisbuild.
//!
//! User config lives at `~/.thesisbuild/thesisbuild.toml`; `--config` points
//! at another file. CLI flags override config file values, which override
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ThesisBuildError};
use crate::types::{OutputFormat, UnresolvedPolicy};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "thesisbuild.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".thesisbuild";

// ---------------------------------------------------------------------------
// Config structs (matching thesisbuild.toml schema)
// ---------------------------------------------------------------------------

/// Top-level tool config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Settings document location and schema.
    #[serde(default)]
    pub settings: SettingsConfig,

    /// Chapter source lookup.
    #[serde(default)]
    pub chapters: ChaptersConfig,

    /// Build output.
    #[serde(default)]
    pub output: OutputConfig,

    /// External renderer command.
    #[serde(default)]
    pub renderer: RendererConfig,
}

/// `[settings]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Settings file, relative to the repository root unless absolute.
    #[serde(default = "default_settings_file")]
    pub file: String,

    /// Top-level sections every settings document must carry.
    #[serde(default = "default_required_keys")]
    pub required_keys: Vec<String>,

    /// Section holding the directory table.
    #[serde(default = "default_directory_section")]
    pub directory_section: String,

    /// What to do with `{name}` tokens missing from the directory table.
    #[serde(default)]
    pub unresolved_placeholders: UnresolvedPolicy,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            file: default_settings_file(),
            required_keys: default_required_keys(),
            directory_section: default_directory_section(),
            unresolved_placeholders: UnresolvedPolicy::default(),
        }
    }
}

fn default_settings_file() -> String {
    "settings.yaml".into()
}
fn default_required_keys() -> Vec<String> {
    ["libraries", "directories", "graphics", "datasets"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_directory_section() -> String {
    "directories".into()
}

/// `[chapters]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaptersConfig {
    /// Markup extension of chapter sources (matched case-insensitively).
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Directories searched in order; `""` is the repository root.
    #[serde(default = "default_search_dirs")]
    pub search_dirs: Vec<String>,
}

impl Default for ChaptersConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            search_dirs: default_search_dirs(),
        }
    }
}

fn default_extension() -> String {
    "Rmd".into()
}
fn default_search_dirs() -> Vec<String> {
    vec![String::new(), "raw_rmd".into(), "testing".into()]
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, relative to the repository root unless absolute.
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Default document format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Keep renderer by-products (`.tex`, `.log`, `_files/`) after a build.
    #[serde(default)]
    pub keep_intermediates: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: OutputFormat::default(),
            keep_intermediates: false,
        }
    }
}

fn default_output_dir() -> String {
    "output".into()
}

/// `[renderer]` section.
///
/// `args` may reference `{input}`, `{output}`, `{output_dir}` and `{format}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
        }
    }
}

fn default_program() -> String {
    "Rscript".into()
}
fn default_args() -> Vec<String> {
    vec![
        "-e".into(),
        "rmarkdown::render('{input}', output_format = '{format}', output_file = '{output}')"
            .into(),
    ]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.thesisbuild/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ThesisBuildError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.thesisbuild/thesisbuild.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the tool config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<ToolConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(ToolConfig::default());
    }

    load_config_from(&path)
}

/// Load the tool config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<ToolConfig> {
    if !path.exists() {
        return Err(ThesisBuildError::not_found(path));
    }
    let content = std::fs::read_to_string(path).map_err(|e| ThesisBuildError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ThesisBuildError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ThesisBuildError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = ToolConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ThesisBuildError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ThesisBuildError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve a configured path against the repository root.
///
/// Absolute paths are returned unchanged so builds never depend on the
/// process working directory.
pub fn resolve_against(root: &Path, configured: impl AsRef<Path>) -> PathBuf {
    let p = configured.as_ref();
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}
