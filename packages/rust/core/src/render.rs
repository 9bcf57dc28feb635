//! The render contract: resolved paths in, compiled document out.
//!
//! Typesetting itself belongs to an external toolchain. [`CommandRenderer`]
//! drives one through a configured command line; tests and embedders can
//! supply any other [`Renderer`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, instrument};

use thesisbuild_datasets::Dataset;
use thesisbuild_settings::{DirectoryTable, interpolate};
use thesisbuild_shared::{OutputFormat, RendererConfig, Result, ThesisBuildError, UnresolvedPolicy};

/// Environment variable listing enabled libraries, comma-separated.
pub const ENV_LIBRARIES: &str = "THESISBUILD_LIBRARIES";
/// Environment variable listing graphics files, platform path-list syntax.
pub const ENV_GRAPHICS: &str = "THESISBUILD_GRAPHICS";
/// Environment variable listing datasets, one `name=path` per line.
pub const ENV_DATASETS: &str = "THESISBUILD_DATASETS";
/// Environment variable holding the output format (`pdf`, `docx`).
pub const ENV_FORMAT: &str = "THESISBUILD_FORMAT";

/// Maximum stderr characters quoted in a render error.
const STDERR_TAIL: usize = 2000;

/// A loaded dataset and where it came from.
#[derive(Debug, Clone)]
pub struct DatasetHandle {
    pub name: String,
    pub path: PathBuf,
    pub dataset: Dataset,
}

/// Everything a renderer needs. All paths are absolute.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Markup source to compile.
    pub source: PathBuf,
    /// Document to produce.
    pub output: PathBuf,
    pub format: OutputFormat,
    /// Libraries the renderer should enable.
    pub libraries: Vec<String>,
    pub datasets: Vec<DatasetHandle>,
    pub graphics: Vec<PathBuf>,
    /// Working directory for the render; never the process-wide one.
    pub working_dir: PathBuf,
}

/// An external document compiler.
pub trait Renderer {
    /// Human-readable renderer name for reports and tracing.
    fn name(&self) -> &str;

    /// Compile `request.source` into `request.output`, returning the
    /// written path.
    fn render(&self, request: &RenderRequest) -> Result<PathBuf>;
}

// ---------------------------------------------------------------------------
// CommandRenderer
// ---------------------------------------------------------------------------

/// Runs a configured program, e.g. `Rscript -e "rmarkdown::render(...)"`.
///
/// Arguments may contain `{input}`, `{output}`, `{output_dir}` and
/// `{format}`; other `{...}` text is passed through untouched.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    /// Argument list with request paths substituted.
    pub fn command_args(&self, request: &RenderRequest) -> Result<Vec<String>> {
        let output_dir = request.output.parent().unwrap_or(Path::new(""));
        let table: DirectoryTable = [
            ("input", request.source.display().to_string()),
            ("output", request.output.display().to_string()),
            ("output_dir", output_dir.display().to_string()),
            ("format", request.format.renderer_name().to_string()),
        ]
        .into_iter()
        .collect();

        self.args
            .iter()
            .map(|arg| Ok(interpolate(arg, &table, UnresolvedPolicy::Keep)?.into_owned()))
            .collect()
    }
}

impl Renderer for CommandRenderer {
    fn name(&self) -> &str {
        &self.program
    }

    #[instrument(skip_all, fields(program = %self.program, source = %request.source.display()))]
    fn render(&self, request: &RenderRequest) -> Result<PathBuf> {
        let args = self.command_args(request)?;
        debug!(?args, working_dir = %request.working_dir.display(), "spawning renderer");

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&request.working_dir)
            .env(ENV_LIBRARIES, request.libraries.join(","))
            .env(ENV_GRAPHICS, graphics_env(&request.graphics)?)
            .env(ENV_DATASETS, datasets_env(&request.datasets))
            .env(ENV_FORMAT, request.format.extension())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                ThesisBuildError::Render(format!("failed to spawn '{}': {e}", self.program))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(stdout = %stdout.trim_end(), "renderer output");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(ThesisBuildError::Render(format!(
                "'{}' exited with status {code} rendering {}: {}",
                self.program,
                request.source.display(),
                tail(stderr.trim(), STDERR_TAIL)
            )));
        }

        if !request.output.exists() {
            return Err(ThesisBuildError::Render(format!(
                "'{}' succeeded but {} was not written",
                self.program,
                request.output.display()
            )));
        }

        info!(output = %request.output.display(), "render complete");
        Ok(request.output.clone())
    }
}

fn graphics_env(graphics: &[PathBuf]) -> Result<OsString> {
    std::env::join_paths(graphics)
        .map_err(|e| ThesisBuildError::Render(format!("cannot pass graphics paths: {e}")))
}

fn datasets_env(datasets: &[DatasetHandle]) -> String {
    datasets
        .iter()
        .map(|d| format!("{}={}", d.name, d.path.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Last `max` characters of `text`.
fn tail(text: &str, max: usize) -> &str {
    let count = text.chars().count();
    if count <= max {
        return text;
    }
    let skip = count - max;
    let start = text.char_indices().nth(skip).map_or(0, |(i, _)| i);
    &text[start..]
}
