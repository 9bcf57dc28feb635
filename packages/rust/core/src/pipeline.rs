//! End-to-end builds: settings → locate → datasets → render → clean → report.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use thesisbuild_datasets::LoaderRegistry;
use thesisbuild_discovery::ChapterLocator;
use thesisbuild_settings::SettingsResolver;
use thesisbuild_shared::{
    BuildId, BuildReport, CURRENT_SCHEMA_VERSION, OutputFormat, Result, ThesisBuildError,
    resolve_against,
};

use crate::cleanup;
use crate::render::{DatasetHandle, RenderRequest, Renderer};

/// Output settings for a build, merged from config and CLI flags.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Absolute output directory; created if missing.
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    /// Keep renderer by-products and the merged thesis source.
    pub keep_intermediates: bool,
    /// Tool version string recorded in reports.
    pub tool_version: String,
}

/// Collaborators shared by every build in one invocation.
pub struct BuildContext<'a> {
    pub settings: &'a SettingsResolver,
    pub locator: &'a ChapterLocator,
    pub loaders: &'a LoaderRegistry,
    pub renderer: &'a dyn Renderer,
    pub options: BuildOptions,
}

/// Result of a chapter or thesis build.
#[derive(Debug)]
pub struct BuildResult {
    pub report: BuildReport,
    /// Where the report JSON was written.
    pub report_path: PathBuf,
    pub elapsed: Duration,
}

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the build completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &BuildResult) {}
}

// ---------------------------------------------------------------------------
// Chapter build
// ---------------------------------------------------------------------------

/// Render one chapter.
///
/// 1. Locate the chapter source
/// 2. Load its datasets and collect its graphics
/// 3. Render
/// 4. Remove intermediates (unless kept)
/// 5. Write `<output>.build.json`
#[instrument(skip_all, fields(chapter = %chapter))]
pub fn build_chapter(
    ctx: &BuildContext<'_>,
    chapter: &str,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    let started_at = Utc::now();

    progress.phase("Locating chapter");
    let source = ctx.locator.locate(chapter)?;

    progress.phase("Loading datasets");
    let datasets = chapter_datasets(ctx, chapter)?;
    let graphics = chapter_graphics(ctx, chapter)?;
    let libraries = ctx.settings.libraries()?;

    ensure_dir(&ctx.options.output_dir)?;
    let output = ctx
        .options
        .output_dir
        .join(format!("{chapter}.{}", ctx.options.format.extension()));
    let working_dir = source
        .parent()
        .map_or_else(|| ctx.locator.root().to_path_buf(), Path::to_path_buf);

    let request = RenderRequest {
        source: source.clone(),
        output,
        format: ctx.options.format,
        libraries,
        datasets,
        graphics,
        working_dir,
    };

    progress.phase("Rendering");
    let written = ctx.renderer.render(&request)?;

    progress.phase("Cleaning up");
    let removed = if ctx.options.keep_intermediates {
        Vec::new()
    } else {
        let mut targets = vec![(ctx.options.output_dir.clone(), chapter.to_string())];
        if let Some(stem) = source.file_stem() {
            targets.push((request.working_dir.clone(), stem.to_string_lossy().into_owned()));
        }
        remove_all_intermediates(&targets)
    };

    let result = finish(
        ctx,
        chapter,
        vec![source],
        &request,
        &written,
        removed,
        started_at,
        start,
    )?;
    progress.done(&result);
    Ok(result)
}

// ---------------------------------------------------------------------------
// Thesis build
// ---------------------------------------------------------------------------

/// Merge chapters in order into one source and render it once.
///
/// YAML front matter is kept from the first chapter only. Datasets and
/// graphics are the union over all chapters; two chapters naming
/// different files with the same dataset name is an error.
#[instrument(skip_all, fields(name = %name, chapters = chapters.len()))]
pub fn build_thesis<S: AsRef<str>>(
    ctx: &BuildContext<'_>,
    name: &str,
    chapters: &[S],
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    let started_at = Utc::now();

    if chapters.is_empty() {
        return Err(ThesisBuildError::validation("no chapters to build"));
    }

    progress.phase("Locating chapters");
    let sources = ctx.locator.locate_all(chapters)?;

    progress.phase("Loading datasets");
    let mut datasets: Vec<DatasetHandle> = Vec::new();
    let mut graphics: Vec<PathBuf> = Vec::new();
    for chapter in chapters {
        for handle in chapter_datasets(ctx, chapter.as_ref())? {
            match datasets.iter().find(|d| d.name == handle.name) {
                Some(existing) if existing.path == handle.path => {}
                Some(existing) => {
                    return Err(ThesisBuildError::validation(format!(
                        "dataset '{}' refers to both {} and {}",
                        handle.name,
                        existing.path.display(),
                        handle.path.display()
                    )));
                }
                None => datasets.push(handle),
            }
        }
        for path in chapter_graphics(ctx, chapter.as_ref())? {
            if !graphics.contains(&path) {
                graphics.push(path);
            }
        }
    }
    let libraries = ctx.settings.libraries()?;

    progress.phase("Merging chapters");
    ensure_dir(&ctx.options.output_dir)?;
    let merged = ctx
        .options
        .output_dir
        .join(format!("{name}.{}", ctx.locator.extension()));
    if sources.contains(&merged) {
        return Err(ThesisBuildError::validation(format!(
            "merged thesis source {} would overwrite a chapter",
            merged.display()
        )));
    }
    let text = merge_sources(&sources)?;
    std::fs::write(&merged, text).map_err(|e| ThesisBuildError::io(&merged, e))?;
    debug!(path = %merged.display(), "wrote merged thesis source");

    let request = RenderRequest {
        source: merged.clone(),
        output: ctx
            .options
            .output_dir
            .join(format!("{name}.{}", ctx.options.format.extension())),
        format: ctx.options.format,
        libraries,
        datasets,
        graphics,
        working_dir: ctx.locator.root().to_path_buf(),
    };

    progress.phase("Rendering");
    let written = match ctx.renderer.render(&request) {
        Ok(written) => written,
        Err(e) => {
            if !ctx.options.keep_intermediates {
                if let Err(rm) = std::fs::remove_file(&merged) {
                    warn!(
                        path = %merged.display(),
                        error = %rm,
                        "failed to remove merged source"
                    );
                }
            }
            return Err(e);
        }
    };

    progress.phase("Cleaning up");
    let removed = if ctx.options.keep_intermediates {
        Vec::new()
    } else {
        let mut removed = remove_all_intermediates(&[(
            ctx.options.output_dir.clone(),
            name.to_string(),
        )]);
        match std::fs::remove_file(&merged) {
            Ok(()) => removed.push(merged),
            Err(e) => warn!(path = %merged.display(), error = %e, "failed to remove merged source"),
        }
        removed
    };

    let result = finish(
        ctx,
        name,
        sources,
        &request,
        &written,
        removed,
        started_at,
        start,
    )?;
    progress.done(&result);
    Ok(result)
}

// ---------------------------------------------------------------------------
// Chapter resources
// ---------------------------------------------------------------------------

/// Load every dataset the settings list for `chapter`.
///
/// Relative paths are taken from the repository root.
pub fn chapter_datasets(ctx: &BuildContext<'_>, chapter: &str) -> Result<Vec<DatasetHandle>> {
    load_datasets(ctx.settings, ctx.loaders, ctx.locator.root(), chapter)
}

/// [`chapter_datasets`] without a full build context.
pub fn load_datasets(
    settings: &SettingsResolver,
    loaders: &LoaderRegistry,
    root: &Path,
    chapter: &str,
) -> Result<Vec<DatasetHandle>> {
    settings
        .dataset_paths(chapter)?
        .into_iter()
        .map(|(name, path)| {
            let path = resolve_against(root, &path);
            let dataset = loaders.load(&path)?;
            debug!(name = %name, summary = %dataset.summary(), "dataset loaded");
            Ok(DatasetHandle {
                name,
                path,
                dataset,
            })
        })
        .collect()
}

/// Absolute graphics paths for `chapter`. Missing files are logged, not
/// rejected: chapters may generate figures while rendering.
fn chapter_graphics(ctx: &BuildContext<'_>, chapter: &str) -> Result<Vec<PathBuf>> {
    let root = ctx.locator.root();
    Ok(ctx
        .settings
        .graphics_paths(chapter)?
        .into_iter()
        .map(|p| resolve_against(root, p))
        .inspect(|p| {
            if !p.exists() {
                warn!(chapter, path = %p.display(), "graphics file does not exist yet");
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Remove intermediates left by an earlier build of `chapter`, next to its
/// source and in `output_dir`.
pub fn clean_chapter(
    locator: &ChapterLocator,
    output_dir: &Path,
    chapter: &str,
) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let source = locator.locate(chapter)?;
    if let (Some(dir), Some(stem)) = (source.parent(), source.file_stem()) {
        removed.extend(cleanup::remove_intermediates(dir, &stem.to_string_lossy())?);
    }
    if output_dir.is_dir() {
        removed.extend(cleanup::remove_intermediates(output_dir, chapter)?);
    }
    Ok(removed)
}

/// Best-effort cleanup after a successful render.
fn remove_all_intermediates(targets: &[(PathBuf, String)]) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for (dir, stem) in targets {
        match cleanup::remove_intermediates(dir, stem) {
            Ok(paths) => removed.extend(paths),
            Err(e) => warn!(dir = %dir.display(), stem = %stem, error = %e, "cleanup failed"),
        }
    }
    removed
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Concatenate chapter sources, dropping front matter after the first.
fn merge_sources(sources: &[PathBuf]) -> Result<String> {
    let mut merged = String::new();
    for (i, path) in sources.iter().enumerate() {
        let text = std::fs::read_to_string(path).map_err(|e| ThesisBuildError::io(path, e))?;
        let body = if i == 0 {
            text.as_str()
        } else {
            strip_front_matter(&text)
        };

        if !merged.is_empty() {
            if !merged.ends_with('\n') {
                merged.push('\n');
            }
            merged.push('\n');
        }
        merged.push_str(body);
    }
    Ok(merged)
}

/// Drop a leading `---` … `---` (or `...`) YAML block. Unterminated blocks
/// are kept.
fn strip_front_matter(text: &str) -> &str {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return text;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return &rest[offset..];
        }
    }
    text
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| ThesisBuildError::io(dir, e))
}

fn sha256_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| ThesisBuildError::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write a JSON file (pretty-printed) via a temp file and rename.
fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(|e| {
        ThesisBuildError::validation(format!("JSON serialization failed: {e}"))
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));
    std::fs::write(&temp, json).map_err(|e| ThesisBuildError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| ThesisBuildError::io(path, e))?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Hash the output, write the build report, and log completion.
#[allow(clippy::too_many_arguments)]
fn finish(
    ctx: &BuildContext<'_>,
    target: &str,
    sources: Vec<PathBuf>,
    request: &RenderRequest,
    written: &Path,
    removed: Vec<PathBuf>,
    started_at: chrono::DateTime<Utc>,
    start: Instant,
) -> Result<BuildResult> {
    let report = BuildReport {
        schema_version: CURRENT_SCHEMA_VERSION,
        id: BuildId::new(),
        target: target.to_string(),
        format: request.format,
        sources,
        output: written.to_path_buf(),
        output_sha256: sha256_file(written)?,
        libraries: request.libraries.clone(),
        datasets: request.datasets.iter().map(|d| d.name.clone()).collect(),
        graphics: request.graphics.clone(),
        removed_intermediates: removed,
        renderer: ctx.renderer.name().to_string(),
        tool_version: ctx.options.tool_version.clone(),
        started_at,
        finished_at: Utc::now(),
    };

    let stem = written
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| target.to_string());
    let report_path = written.with_file_name(format!("{stem}.build.json"));
    write_json(&report_path, &report)?;

    let result = BuildResult {
        report,
        report_path,
        elapsed: start.elapsed(),
    };

    info!(
        build_id = %result.report.id,
        build_target = %target,
        output = %result.report.output.display(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "build complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use thesisbuild_settings::SettingsOptions;
    use thesisbuild_shared::ChaptersConfig;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tb-pipeline-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Copies the source to the output and leaves a `.log` behind.
    #[derive(Default)]
    struct StubRenderer {
        calls: RefCell<Vec<RenderRequest>>,
    }

    impl Renderer for StubRenderer {
        fn name(&self) -> &str {
            "stub"
        }

        fn render(&self, request: &RenderRequest) -> Result<PathBuf> {
            let text = std::fs::read_to_string(&request.source).unwrap();
            std::fs::write(&request.output, text).unwrap();
            let stem = request.output.file_stem().unwrap().to_string_lossy();
            std::fs::write(request.output.with_file_name(format!("{stem}.log")), "log").unwrap();
            self.calls.borrow_mut().push(request.clone());
            Ok(request.output.clone())
        }
    }

    const DATASETS: &str = r#"
  intro:
    survey: "{data}/x.csv"
  methods:
    trials: "{data}/trials.tsv"
    survey: "{data}/x.csv"
"#;

    /// A repository with two chapters, two datasets, and settings.
    fn fixture_repo(datasets_block: &str) -> PathBuf {
        let repo = temp_dir();
        write(
            &repo.join("raw_rmd/Intro.Rmd"),
            "---\ntitle: Intro\n---\n# Introduction\n",
        );
        write(
            &repo.join("methods.Rmd"),
            "---\ntitle: Methods\n---\n# Methods\n",
        );
        write(&repo.join("data/x.csv"), "a,b\n1,2\n");
        write(&repo.join("data/trials.tsv"), "site\tn\nA\t1\n");

        let settings = format!(
            "libraries: [knitr, ggplot2]\n\
             directories:\n  repo: \"{}\"\n  data: \"{{repo}}/data\"\n  figs: figures\n\
             graphics:\n  intro: \"{{figs}}/overview.png\"\n\
             datasets:{datasets_block}\
             chapters: [intro, methods]\n",
            repo.display()
        );
        write(&repo.join("settings.yaml"), &settings);
        repo
    }

    fn options(repo: &Path, keep: bool) -> BuildOptions {
        BuildOptions {
            output_dir: repo.join("output"),
            format: OutputFormat::Pdf,
            keep_intermediates: keep,
            tool_version: "0.0.0-test".into(),
        }
    }

    struct Harness {
        settings: SettingsResolver,
        locator: ChapterLocator,
        loaders: LoaderRegistry,
        renderer: StubRenderer,
    }

    impl Harness {
        fn new(repo: &Path) -> Self {
            Self {
                settings: SettingsResolver::open(
                    &repo.join("settings.yaml"),
                    &SettingsOptions::default(),
                )
                .unwrap(),
                locator: ChapterLocator::from_config(repo, &ChaptersConfig::default()),
                loaders: LoaderRegistry::new(),
                renderer: StubRenderer::default(),
            }
        }

        fn ctx(&self, options: BuildOptions) -> BuildContext<'_> {
            BuildContext {
                settings: &self.settings,
                locator: &self.locator,
                loaders: &self.loaders,
                renderer: &self.renderer,
                options,
            }
        }
    }

    #[test]
    fn chapter_build_passes_resolved_paths() {
        let repo = fixture_repo(DATASETS);
        let h = Harness::new(&repo);
        let ctx = h.ctx(options(&repo, false));

        let result = build_chapter(&ctx, "intro", &SilentProgress).unwrap();

        let calls = h.renderer.calls.borrow();
        assert_eq!(calls.len(), 1);
        let req = &calls[0];
        assert_eq!(req.source, repo.join("raw_rmd/Intro.Rmd"));
        assert_eq!(req.output, repo.join("output/intro.pdf"));
        assert_eq!(req.working_dir, repo.join("raw_rmd"));
        assert_eq!(req.libraries, vec!["knitr", "ggplot2"]);
        assert_eq!(req.datasets.len(), 1);
        assert_eq!(req.datasets[0].name, "survey");
        assert_eq!(req.datasets[0].path, repo.join("data/x.csv"));
        assert_eq!(req.graphics, vec![repo.join("figures/overview.png")]);

        assert_eq!(result.report.target, "intro");
        assert_eq!(result.report.sources, vec![repo.join("raw_rmd/Intro.Rmd")]);
        assert_eq!(result.report.renderer, "stub");
        assert_eq!(result.report.output_sha256, sha256_file(&req.output).unwrap());
    }

    #[test]
    fn chapter_build_writes_report_and_cleans() {
        let repo = fixture_repo(DATASETS);
        let h = Harness::new(&repo);
        let ctx = h.ctx(options(&repo, false));

        let result = build_chapter(&ctx, "intro", &SilentProgress).unwrap();

        assert_eq!(result.report_path, repo.join("output/intro.build.json"));
        let json = std::fs::read_to_string(&result.report_path).unwrap();
        let parsed: BuildReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, result.report.id);
        assert_eq!(parsed.datasets, vec!["survey"]);

        assert!(!repo.join("output/intro.log").exists());
        assert_eq!(
            result.report.removed_intermediates,
            vec![repo.join("output/intro.log")]
        );
        assert!(repo.join("output/intro.pdf").exists());
    }

    #[test]
    fn keep_intermediates_leaves_files() {
        let repo = fixture_repo(DATASETS);
        let h = Harness::new(&repo);
        let ctx = h.ctx(options(&repo, true));

        let result = build_chapter(&ctx, "intro", &SilentProgress).unwrap();
        assert!(repo.join("output/intro.log").exists());
        assert!(result.report.removed_intermediates.is_empty());
    }

    #[test]
    fn missing_chapter_never_renders() {
        let repo = fixture_repo(DATASETS);
        let h = Harness::new(&repo);
        let ctx = h.ctx(options(&repo, false));

        let err = build_chapter(&ctx, "appendix", &SilentProgress).unwrap_err();
        assert!(matches!(err, ThesisBuildError::ChapterNotFound { .. }));
        assert!(h.renderer.calls.borrow().is_empty());
    }

    #[test]
    fn missing_dataset_fails_before_render() {
        let repo = fixture_repo(DATASETS);
        std::fs::remove_file(repo.join("data/x.csv")).unwrap();
        let h = Harness::new(&repo);
        let ctx = h.ctx(options(&repo, false));

        let err = build_chapter(&ctx, "intro", &SilentProgress).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("x.csv"));
        assert!(h.renderer.calls.borrow().is_empty());
    }

    #[test]
    fn thesis_merges_chapters_in_order() {
        let repo = fixture_repo(DATASETS);
        let h = Harness::new(&repo);
        let ctx = h.ctx(options(&repo, false));
        let chapters = h.settings.chapters().unwrap().unwrap();

        let result = build_thesis(&ctx, "thesis", &chapters, &SilentProgress).unwrap();

        let rendered = std::fs::read_to_string(repo.join("output/thesis.pdf")).unwrap();
        assert_eq!(
            rendered,
            "---\ntitle: Intro\n---\n# Introduction\n\n# Methods\n"
        );

        let calls = h.renderer.calls.borrow();
        let req = &calls[0];
        assert_eq!(req.working_dir, repo);
        let names: Vec<&str> = req.datasets.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["survey", "trials"]);

        assert_eq!(
            result.report.sources,
            vec![repo.join("raw_rmd/Intro.Rmd"), repo.join("methods.Rmd")]
        );
        assert!(!repo.join("output/thesis.Rmd").exists());
        assert!(result
            .report
            .removed_intermediates
            .contains(&repo.join("output/thesis.Rmd")));
    }

    /// Always fails without writing an output.
    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn name(&self) -> &str {
            "failing"
        }

        fn render(&self, _request: &RenderRequest) -> Result<PathBuf> {
            Err(ThesisBuildError::Render("exited with status 1".into()))
        }
    }

    #[test]
    fn failed_thesis_render_removes_merged_source() {
        let repo = fixture_repo(DATASETS);
        let h = Harness::new(&repo);
        let ctx = BuildContext {
            settings: &h.settings,
            locator: &h.locator,
            loaders: &h.loaders,
            renderer: &FailingRenderer,
            options: options(&repo, false),
        };

        let err = build_thesis(&ctx, "thesis", &["intro", "methods"], &SilentProgress)
            .unwrap_err();
        assert!(matches!(err, ThesisBuildError::Render(_)));
        assert!(!repo.join("output/thesis.Rmd").exists());
        assert!(!repo.join("output/thesis.build.json").exists());
    }

    #[test]
    fn thesis_rejects_conflicting_dataset_names() {
        let conflicting = r#"
  intro:
    survey: "{data}/x.csv"
  methods:
    survey: "{data}/trials.tsv"
"#;
        let repo = fixture_repo(conflicting);
        let h = Harness::new(&repo);
        let ctx = h.ctx(options(&repo, false));

        let err = build_thesis(&ctx, "thesis", &["intro", "methods"], &SilentProgress)
            .unwrap_err();
        assert!(err.to_string().contains("dataset 'survey' refers to both"));
    }

    #[test]
    fn thesis_requires_chapters() {
        let repo = fixture_repo(DATASETS);
        let h = Harness::new(&repo);
        let ctx = h.ctx(options(&repo, false));

        let none: [&str; 0] = [];
        let err = build_thesis(&ctx, "thesis", &none, &SilentProgress).unwrap_err();
        assert!(err.to_string().contains("no chapters"));
    }

    #[test]
    fn clean_chapter_removes_stale_intermediates() {
        let repo = fixture_repo(DATASETS);
        write(&repo.join("raw_rmd/Intro.knit.md"), "x");
        write(&repo.join("output/intro.tex"), "x");
        let locator = ChapterLocator::from_config(&repo, &ChaptersConfig::default());

        let removed = clean_chapter(&locator, &repo.join("output"), "intro").unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!repo.join("raw_rmd/Intro.knit.md").exists());
        assert!(!repo.join("output/intro.tex").exists());
        assert!(repo.join("raw_rmd/Intro.Rmd").exists());
    }

    #[test]
    fn front_matter_stripping() {
        assert_eq!(strip_front_matter("---\na: 1\n---\nbody\n"), "body\n");
        assert_eq!(strip_front_matter("---\na: 1\n...\nbody"), "body");
        assert_eq!(strip_front_matter("---\r\na: 1\r\n---\r\nbody"), "body");
        assert_eq!(strip_front_matter("# no front matter\n"), "# no front matter\n");
        assert_eq!(strip_front_matter("---\nunterminated\n"), "---\nunterminated\n");
    }
}
