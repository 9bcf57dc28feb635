//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use thesisbuild_core::pipeline::{
    self, BuildContext, BuildOptions, BuildResult, ProgressReporter,
};
use thesisbuild_core::render::CommandRenderer;
use thesisbuild_datasets::LoaderRegistry;
use thesisbuild_discovery::ChapterLocator;
use thesisbuild_settings::{SettingsOptions, SettingsResolver};
use thesisbuild_shared::{
    OutputFormat, ToolConfig, init_config, load_config, load_config_from, resolve_against,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// thesisbuild: render thesis chapters from a settings document.
#[derive(Parser)]
#[command(
    name = "thesisbuild",
    version,
    about = "Resolve thesis settings, locate chapters, and render them to PDF or DOCX.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Thesis repository root.
    #[arg(long, default_value = ".", global = true, env = "THESISBUILD_REPO")]
    pub repo: PathBuf,

    /// Settings file (defaults to `[settings] file` under the repo root).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Tool config file (defaults to ~/.thesisbuild/thesisbuild.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Overrides for the `[output]` config section.
#[derive(Args, Debug)]
pub(crate) struct OutputArgs {
    /// Output format: pdf or docx.
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Output directory.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Keep .tex/.log/_files intermediates after rendering.
    #[arg(long)]
    pub keep_intermediates: bool,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Render a single chapter.
    Chapter {
        /// Chapter name (file stem, matched case-insensitively).
        name: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Merge chapters in order and render the whole thesis.
    Thesis {
        /// Chapters to include (comma-separated). Defaults to the settings
        /// `chapters` list.
        #[arg(long, value_delimiter = ',')]
        chapters: Vec<String>,

        /// Name of the combined document.
        #[arg(long, default_value = "thesis")]
        name: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the source path of a chapter, or list every chapter found.
    Locate {
        /// Chapter name. Omit to list all chapters.
        name: Option<String>,
    },

    /// Load and summarize the datasets of a chapter.
    Datasets {
        /// Chapter name.
        chapter: String,
    },

    /// Remove intermediates left by earlier builds of a chapter.
    Clean {
        /// Chapter name.
        name: String,

        /// Output directory.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Settings document operations.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Settings subcommands.
#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Load, validate, and resolve the settings; check listed chapters exist.
    Check,
    /// Print the settings document.
    Show {
        /// Print with directory placeholders resolved.
        #[arg(long)]
        resolved: bool,
    },
    /// Write the resolved settings document to a file.
    Export {
        /// Destination YAML file.
        #[arg(long)]
        out: PathBuf,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "thesisbuild=info",
        1 => "thesisbuild=debug",
        _ => "thesisbuild=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let Cli {
        repo,
        settings,
        config: config_path,
        command,
        ..
    } = cli;

    let config = match &config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let workspace = || Workspace::open(&repo, settings.as_deref(), config.clone());

    match command {
        Command::Chapter { name, output } => cmd_chapter(&workspace()?, &name, &output),
        Command::Thesis {
            chapters,
            name,
            output,
        } => cmd_thesis(&workspace()?, &name, chapters, &output),
        Command::Locate { name } => cmd_locate(&workspace()?, name.as_deref()),
        Command::Datasets { chapter } => cmd_datasets(&workspace()?, &chapter),
        Command::Clean { name, out } => cmd_clean(&workspace()?, &name, out.as_deref()),
        Command::Settings { action } => {
            let ws = workspace()?;
            match action {
                SettingsAction::Check => cmd_settings_check(&ws),
                SettingsAction::Show { resolved } => cmd_settings_show(&ws, resolved),
                SettingsAction::Export { out } => cmd_settings_export(&ws, &out),
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// Repository root, tool config, and settings location for one invocation.
struct Workspace {
    root: PathBuf,
    config: ToolConfig,
    settings_path: PathBuf,
}

impl Workspace {
    fn open(repo: &Path, settings: Option<&Path>, config: ToolConfig) -> Result<Self> {
        let root = std::fs::canonicalize(repo)
            .wrap_err_with(|| format!("repository root '{}' is not accessible", repo.display()))?;
        let settings_path = match settings {
            Some(p) => p.to_path_buf(),
            None => resolve_against(&root, &config.settings.file),
        };
        Ok(Self {
            root,
            config,
            settings_path,
        })
    }

    fn settings(&self) -> Result<SettingsResolver> {
        let options = SettingsOptions::from(&self.config.settings);
        Ok(SettingsResolver::open(&self.settings_path, &options)?)
    }

    fn locator(&self) -> ChapterLocator {
        ChapterLocator::from_config(&self.root, &self.config.chapters)
    }

    fn output_dir(&self, out: Option<&Path>) -> PathBuf {
        match out {
            Some(p) => resolve_against(&self.root, p),
            None => resolve_against(&self.root, &self.config.output.dir),
        }
    }

    fn build_options(&self, args: &OutputArgs) -> BuildOptions {
        BuildOptions {
            output_dir: self.output_dir(args.out.as_deref()),
            format: args.format.unwrap_or(self.config.output.format),
            keep_intermediates: args.keep_intermediates || self.config.output.keep_intermediates,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Build commands
// ---------------------------------------------------------------------------

fn cmd_chapter(ws: &Workspace, name: &str, output: &OutputArgs) -> Result<()> {
    let settings = ws.settings()?;
    let locator = ws.locator();
    let loaders = LoaderRegistry::new();
    let renderer = CommandRenderer::from_config(&ws.config.renderer);
    let ctx = BuildContext {
        settings: &settings,
        locator: &locator,
        loaders: &loaders,
        renderer: &renderer,
        options: ws.build_options(output),
    };

    info!(chapter = name, format = %ctx.options.format, "building chapter");

    let reporter = CliProgress::new();
    let result = pipeline::build_chapter(&ctx, name, &reporter)?;

    print_summary("Chapter built successfully!", &result);
    Ok(())
}

fn cmd_thesis(
    ws: &Workspace,
    name: &str,
    chapters: Vec<String>,
    output: &OutputArgs,
) -> Result<()> {
    let settings = ws.settings()?;
    let chapters = if chapters.is_empty() {
        settings.chapters()?.ok_or_else(|| {
            eyre!("no --chapters given and the settings document has no 'chapters' list")
        })?
    } else {
        chapters
    };

    let locator = ws.locator();
    let loaders = LoaderRegistry::new();
    let renderer = CommandRenderer::from_config(&ws.config.renderer);
    let ctx = BuildContext {
        settings: &settings,
        locator: &locator,
        loaders: &loaders,
        renderer: &renderer,
        options: ws.build_options(output),
    };

    info!(name, chapters = ?chapters, format = %ctx.options.format, "building thesis");

    let reporter = CliProgress::new();
    let result = pipeline::build_thesis(&ctx, name, &chapters, &reporter)?;

    print_summary("Thesis built successfully!", &result);
    Ok(())
}

fn print_summary(headline: &str, result: &BuildResult) {
    let report = &result.report;
    println!();
    println!("  {headline}");
    println!("  Build:     {}", report.id);
    println!("  Sources:   {}", report.sources.len());
    println!("  Datasets:  {}", report.datasets.len());
    println!("  Graphics:  {}", report.graphics.len());
    println!("  Cleaned:   {}", report.removed_intermediates.len());
    println!("  Output:    {}", report.output.display());
    println!("  Report:    {}", result.report_path.display());
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid spinner template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Inspection commands
// ---------------------------------------------------------------------------

fn cmd_locate(ws: &Workspace, name: Option<&str>) -> Result<()> {
    let locator = ws.locator();
    match name {
        Some(name) => {
            let path = locator.locate(name)?;
            println!("{}", path.display());
        }
        None => {
            let found = locator.available()?;
            if found.is_empty() {
                println!(
                    "No .{} chapters found under {}",
                    locator.extension(),
                    ws.root.display()
                );
            }
            for (stem, path) in found {
                println!("  {stem:<20} {}", path.display());
            }
        }
    }
    Ok(())
}

fn cmd_datasets(ws: &Workspace, chapter: &str) -> Result<()> {
    let settings = ws.settings()?;
    let handles =
        pipeline::load_datasets(&settings, &LoaderRegistry::new(), &ws.root, chapter)?;

    if handles.is_empty() {
        println!("No datasets listed for chapter '{chapter}'.");
        return Ok(());
    }
    for handle in handles {
        println!(
            "  {:<16} {:<28} {}",
            handle.name,
            handle.dataset.summary(),
            handle.path.display()
        );
    }
    Ok(())
}

fn cmd_clean(ws: &Workspace, name: &str, out: Option<&Path>) -> Result<()> {
    let removed = pipeline::clean_chapter(&ws.locator(), &ws.output_dir(out), name)?;
    if removed.is_empty() {
        println!("Nothing to clean for '{name}'.");
    }
    for path in &removed {
        println!("  removed {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings commands
// ---------------------------------------------------------------------------

fn cmd_settings_check(ws: &Workspace) -> Result<()> {
    let settings = ws.settings()?;
    let locator = ws.locator();

    println!();
    println!("  Settings:     {}", settings.source().display());
    println!("  Libraries:    {}", settings.libraries()?.len());
    println!("  Directories:  {}", settings.directories().len());

    let Some(chapters) = settings.chapters()? else {
        println!("  Chapters:     (none listed)");
        println!();
        return Ok(());
    };

    let mut missing = 0usize;
    println!("  Chapters:     {}", chapters.len());
    for chapter in &chapters {
        match locator.locate(chapter) {
            Ok(path) => println!("    {chapter:<18} {}", path.display()),
            Err(e) if e.is_not_found() => {
                missing += 1;
                println!("    {chapter:<18} MISSING");
            }
            Err(e) => return Err(e.into()),
        }
    }
    println!();

    if missing > 0 {
        return Err(eyre!("{missing} listed chapter(s) could not be located"));
    }
    Ok(())
}

fn cmd_settings_show(ws: &Workspace, resolved: bool) -> Result<()> {
    let yaml = if resolved {
        ws.settings()?.document().to_yaml_string()?
    } else {
        thesisbuild_settings::load(&ws.settings_path)?.to_yaml_string()?
    };
    print!("{yaml}");
    Ok(())
}

fn cmd_settings_export(ws: &Workspace, out: &Path) -> Result<()> {
    ws.settings()?.persist(out)?;
    println!("Resolved settings written to: {}", out.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &ToolConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
