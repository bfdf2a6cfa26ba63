//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── collect_templates() ──► .pug/.html files, minus mixins and ignored
//!     │
//!     ├── Database::load()
//!     │
//!     ├── PageEnumerator::total() ──► progress bar / progress file
//!     │
//!     ├── build_template() (rayon, one task per template)
//!     │       │
//!     │       └── subjects × languages → resolve → render → write
//!     │
//!     └── LinkRegistry::write()
//! ```

use crate::{
    config::SiteConfig,
    data::Database,
    enumerate::{PageEnumerator, iterated_kinds, relative_template_path},
    expr::ExpressionEngine,
    hydration::{Hydration, Subject},
    layout::lay_out,
    links::LinkRegistry,
    log,
    logger,
    paths,
    progress::{BuildStep, CurrentStatus, Progress},
    render::{InterpolationRenderer, PageContext, Renderer},
    utils::ignore::IgnoreFiles,
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};
use walkdir::WalkDir;

const TEMPLATE_EXTENSIONS: &[&str] = &["pug", "html"];
const MIXINS_DIR: &str = "mixins";

/// Pages built and failed during one build.
#[derive(Debug, Default)]
pub struct BuildReport {
    built: AtomicUsize,
    failed: AtomicUsize,
}

impl BuildReport {
    pub fn built(&self) -> usize {
        self.built.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    fn record(&self, ok: bool) {
        let counter = if ok { &self.built } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Shared state of a running build.
struct BuildContext<'a> {
    config: &'a SiteConfig,
    engine: &'a ExpressionEngine,
    database: &'a Database,
    renderer: &'a dyn Renderer,
    links: &'a LinkRegistry,
    progress: &'a Progress,
    report: &'a BuildReport,
}

/// Build the entire site, rendering templates in parallel.
///
/// A page that fails is logged and counted, it never stops the others.
/// If `config.build.clean` is true, clears the entire output directory first.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport> {
    let build = &config.build;
    let templates = collect_templates(&build.templates)?;
    prepare_output(&build.output, build.clean)?;

    let engine = ExpressionEngine::new();
    let database = Database::load(&build.database, &engine)
        .with_context(|| format!("Failed to load database from {}", build.database.display()))?;
    log!(
        "database";
        "{} works, {} tags, {} technologies, {} sites, {} collections",
        database.works.len(),
        database.tags.len(),
        database.technologies.len(),
        database.sites.len(),
        database.collections.len()
    );

    let total = PageEnumerator::new(&database, &build.languages).total(&build.templates, &templates);
    let progress = Progress::new(total, build.progress.clone(), !logger::is_silent());
    progress.status(CurrentStatus {
        step: BuildStep::LoadDatabase,
        file: build.database.display().to_string(),
        ..CurrentStatus::default()
    });

    let renderer = InterpolationRenderer::new(&engine);
    let links = LinkRegistry::new();
    let report = BuildReport::default();
    let context = BuildContext {
        config,
        engine: &engine,
        database: &database,
        renderer: &renderer,
        links: &links,
        progress: &progress,
        report: &report,
    };

    log!("build"; "rendering {} templates...", templates.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(build.workers)
        .build()
        .context("Failed to start render threads")?;
    pool.install(|| {
        templates.par_iter().for_each(|template| {
            if let Err(e) = context.build_template(template) {
                log!("error"; "{}: {:#}", template.display(), e);
            }
        });
    });
    progress.finish();
    log!("expr"; "{} distinct expressions compiled", engine.cached());

    let snapshot = progress.snapshot();
    if snapshot.processed < snapshot.total {
        log!(
            "build";
            "{} of {} candidate pages skipped by their paths",
            snapshot.total - snapshot.processed,
            snapshot.total
        );
    }

    if let Some(path) = &build.links {
        progress.status(CurrentStatus {
            step: BuildStep::WriteLinks,
            output: path.display().to_string(),
            ..CurrentStatus::default()
        });
        links.write(path)?;
        if links.is_empty() {
            log!("links"; "no links found, wrote an empty registry");
        } else {
            log!("links"; "{} links written to {}", links.len(), path.display());
        }
    }

    log_build_result(&report);
    Ok(report)
}

/// Template files under `root`, sorted.
///
/// Files inside a `mixins` directory are partials and never rendered on their own.
pub fn collect_templates(root: &Path) -> Result<Vec<PathBuf>> {
    let mut ignore = IgnoreFiles::new(root);
    let mut templates = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to scan {}", root.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_template(path) || is_in_mixins(root, path) {
            continue;
        }
        if ignore.is_ignored(path)? {
            continue;
        }
        templates.push(path.to_path_buf());
    }

    Ok(templates)
}

fn is_template(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
}

fn is_in_mixins(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|component| component.as_os_str() == MIXINS_DIR)
}

fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

impl BuildContext<'_> {
    /// Render one template for every subject and language its path allows.
    ///
    /// Only errors that concern the whole template are returned.
    fn build_template(&self, template: &Path) -> Result<()> {
        let build = &self.config.build;
        let path = relative_template_path(&build.templates, template)?;
        let source = fs::read_to_string(template)
            .with_context(|| format!("Failed to read {}", template.display()))?;

        let mut subjects = vec![Subject::None];
        for kind in iterated_kinds(&path) {
            subjects.extend(Subject::all_of(kind, self.database));
        }

        // the first language to claim a destination keeps it
        let mut produced = FxHashSet::default();
        for subject in subjects {
            for language in &build.languages {
                let hydration = Hydration::new(language, subject);
                let destination = match paths::resolve(self.engine, &hydration, &path) {
                    Ok(Some(destination)) => destination,
                    Ok(None) => continue,
                    Err(e) => {
                        log!("error"; "{path} for {hydration}: {:#}", anyhow::Error::from(e));
                        self.report.record(false);
                        continue;
                    }
                };
                if !produced.insert(destination.clone()) {
                    continue;
                }

                self.progress.status(CurrentStatus {
                    id: subject.id(),
                    step: BuildStep::BuildPage,
                    file: path.clone(),
                    language: language.clone(),
                    output: destination.clone(),
                });
                let result = self.build_page(&source, &hydration, &destination);
                if let Err(e) = &result {
                    log!("error"; "{destination} ({path} for {hydration}): {e:#}");
                }
                self.report.record(result.is_ok());
                self.progress.advance();
            }
        }

        Ok(())
    }

    fn build_page(&self, source: &str, hydration: &Hydration, destination: &str) -> Result<()> {
        let layout = match hydration.work() {
            Some(work) => lay_out(&work.in_language(hydration.language))
                .with_context(|| format!("Failed to lay out work `{}`", work.id))?,
            None => Vec::new(),
        };
        let page = PageContext::new(hydration, self.database, layout);
        let html = self.renderer.render(source, &page)?;

        let output = self.config.build.output.join(destination);
        let written = if destination.ends_with(".pdf") {
            log!("warn"; "{destination}: PDF conversion is not supported, writing HTML");
            append_extension(&output, "html")
        } else {
            output.clone()
        };
        write_file(&written, &html)?;

        if self.config.build.emit_data {
            write_file(&append_extension(&output, "json"), &page.to_json()?)?;
        }

        self.links.scan(destination, &html);
        Ok(())
    }
}

/// `page.pdf` + `html` → `page.pdf.html`
fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Log build result based on the report.
fn log_build_result(report: &BuildReport) {
    match (report.built(), report.failed()) {
        (0, 0) => log!("warn"; "nothing was built, check the templates directory"),
        (built, 0) => log!("build"; "built {built} pages"),
        (built, failed) => log!("error"; "built {built} pages, {failed} failed"),
    }
}
