//! File system watcher for `folio develop`.
//!
//! Monitors the templates and database directories and the config file, and
//! rebuilds the whole site after each burst of changes.
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌────────────────────────┐
//! │ notify   │───▶│ Debouncer│───▶│    handle_changes()    │
//! │ events   │    │          │    │  config? reload        │
//! └──────────┘    └──────────┘    │  then full rebuild     │
//!                                 └────────────────────────┘
//! ```

use crate::{
    build::{BuildReport, build_site},
    cli::Cli,
    config::SiteConfig,
    log,
    logger::WatchStatus,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{RecvTimeoutError, channel},
    },
    time::{Duration, Instant},
};

const REBUILD_COOLDOWN_MS: u64 = 800;
/// How often the loop wakes up to check for Ctrl+C while idle.
const IDLE_POLL_MS: u64 = 250;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || (name.starts_with('.') && name != crate::utils::ignore::IGNORE_FILE)
}

/// Format absolute path as relative to root, with trailing slash for directories.
fn format_rel(path: &Path, root: &Path, is_dir: bool) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let suffix = if is_dir { "/" } else { "" };
    format!("{}{}", rel.display(), suffix)
}

/// Paths to watch for `config`, with whether each is a directory.
fn watched_paths(config: &SiteConfig) -> Vec<(PathBuf, bool)> {
    [
        (config.build.templates.clone(), true),
        (config.build.database.clone(), true),
        (config.config_path.clone(), false),
    ]
    .into_iter()
    .filter(|(path, _)| path.exists())
    .collect()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    debounce: Duration,
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    fn new(debounce_ms: u64) -> Self {
        Self {
            debounce: Duration::from_millis(debounce_ms),
            pending: FxHashSet::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty() && self.last_event.is_some_and(|t| t.elapsed() >= self.debounce)
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_millis(IDLE_POLL_MS)
        } else {
            self.debounce
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Build once and report the outcome on the status line.
fn rebuild(config: &SiteConfig, status: &mut WatchStatus) {
    match build_site(config) {
        Ok(report) => report_build(&report, status),
        Err(e) => status.error("build failed", &format!("{e:#}")),
    }
}

fn report_build(report: &BuildReport, status: &mut WatchStatus) {
    match report.failed() {
        0 => status.success(&format!("built {} pages", report.built())),
        failed => status.error(
            &format!("built {} pages, {failed} failed", report.built()),
            "see the errors above",
        ),
    }
}

/// Session state: the current config and the watcher following its paths.
struct Session<'a, W: Watcher> {
    cli: &'a Cli,
    config: SiteConfig,
    watcher: W,
    watched: Vec<(PathBuf, bool)>,
    status: WatchStatus,
}

impl<W: Watcher> Session<'_, W> {
    fn watch_all(&mut self) -> Result<()> {
        self.watched = watched_paths(&self.config);
        for (path, is_dir) in &self.watched {
            let mode = if *is_dir {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            self.watcher
                .watch(path, mode)
                .with_context(|| format!("Failed to watch {}", path.display()))?;
        }

        let root = self.config.get_root();
        let summary: Vec<_> = self
            .watched
            .iter()
            .map(|(path, is_dir)| format_rel(path, root, *is_dir))
            .collect();
        log!("watch"; "watching {}", summary.join(", "));
        Ok(())
    }

    fn unwatch_all(&mut self) {
        for (path, _) in self.watched.drain(..) {
            // the path may be gone already
            let _ = self.watcher.unwatch(&path);
        }
    }

    /// Reload the config after it changed. Keeps the old one if the new one is invalid.
    fn reload_config(&mut self) -> Result<()> {
        match SiteConfig::load(self.cli) {
            Ok(config) => {
                self.unwatch_all();
                self.config = config;
                self.watch_all()
            }
            Err(e) => {
                self.status.error("config reload failed", &format!("{e:#}"));
                Ok(())
            }
        }
    }

    /// Rebuild after changes. Returns true if a rebuild ran (for cooldown).
    fn handle_changes(&mut self, paths: &[PathBuf]) -> Result<bool> {
        if paths.is_empty() {
            return Ok(false);
        }

        let config_changed = paths.iter().any(|path| *path == self.config.config_path);
        if config_changed {
            log!("watch"; "config changed, reloading...");
            self.reload_config()?;
        } else {
            let root = self.config.get_root();
            let changed: Vec<_> = paths.iter().map(|p| format_rel(p, root, false)).collect();
            log!("watch"; "{} changed, rebuilding...", changed.join(", "));
        }

        rebuild(&self.config, &mut self.status);
        Ok(true)
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Build, then rebuild on every change until Ctrl+C.
pub fn develop(cli: &Cli, config: SiteConfig) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("Failed to set Ctrl+C handler")?;

    let (tx, rx) = channel();
    let watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    let mut debouncer = Debouncer::new(config.develop.debounce_ms);
    let mut session = Session {
        cli,
        config,
        watcher,
        watched: Vec::new(),
        status: WatchStatus::new(),
    };

    rebuild(&session.config, &mut session.status);
    session.watch_all()?;

    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) && !debouncer.in_cooldown() => {
                debouncer.add(event);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                if session.handle_changes(&debouncer.take())? {
                    debouncer.mark_rebuild();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    log!("watch"; "stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, EventKind};
    use std::thread::sleep;

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("templates/index.pug~")));
        assert!(is_temp_file(Path::new("templates/.index.pug.swp")));
        assert!(is_temp_file(Path::new("database/database.json.tmp")));
        assert!(!is_temp_file(Path::new("templates/index.pug")));
        assert!(!is_temp_file(Path::new("templates/.folioignore")));
    }

    #[test]
    fn test_format_rel() {
        let root = Path::new("/site");
        assert_eq!(format_rel(Path::new("/site/templates"), root, true), "templates/");
        assert_eq!(format_rel(Path::new("/site/folio.toml"), root, false), "folio.toml");
    }

    #[test]
    fn test_debouncer() {
        let mut debouncer = Debouncer::new(10);
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_millis(IDLE_POLL_MS));

        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/site/templates/index.pug"))
            .add_path(PathBuf::from("/site/templates/index.pug~"));
        debouncer.add(event);
        assert_eq!(debouncer.timeout(), Duration::from_millis(10));

        sleep(Duration::from_millis(20));
        assert!(debouncer.ready());
        assert_eq!(
            debouncer.take(),
            vec![PathBuf::from("/site/templates/index.pug")]
        );
        assert!(!debouncer.ready());

        debouncer.mark_rebuild();
        assert!(debouncer.in_cooldown());
    }

    #[test]
    fn test_watched_paths_skip_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("templates")).unwrap();

        let mut config = SiteConfig::default();
        config.build.templates = dir.path().join("templates");
        config.build.database = dir.path().join("database");
        config.config_path = dir.path().join("folio.toml");

        assert_eq!(
            watched_paths(&config),
            vec![(dir.path().join("templates"), true)]
        );
    }
}
