//! `.folioignore` support for template scanning.
//!
//! A template is checked against the closest `.folioignore`, looked up from the
//! template's own directory upwards, stopping at the templates root.

use anyhow::{Context, Result, bail};
use gix::{bstr::ByteSlice, glob::wildmatch};
use rustc_hash::FxHashMap;
use std::{
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

type Found = Option<(PathBuf, Rc<IgnoreMatcher>)>;

pub const IGNORE_FILE: &str = ".folioignore";

// Constants for gix::ignore::search::pattern::Mode (which is private)
// See: https://github.com/Byron/gitoxide/blob/main/gix-ignore/src/search/pattern.rs
const MODE_NO_SUB_DIR: u32 = 1 << 0; // no internal slash: matches basename unless absolute
const MODE_MUST_MATCH_DIR: u32 = 1 << 2; // trailing slash
const MODE_NEGATIVE: u32 = 1 << 3; // leading !
const MODE_ABSOLUTE: u32 = 1 << 4; // leading /

/// Matches paths against gitignore-style patterns.
pub struct IgnoreMatcher {
    patterns: Vec<(gix::bstr::BString, u32)>,
}

impl IgnoreMatcher {
    pub fn new(content: &[u8]) -> Self {
        let patterns = gix::ignore::parse(content)
            .map(|(pattern, _, _)| (pattern.text, pattern.mode.bits()))
            .collect();
        Self { patterns }
    }

    /// Check a `/`-separated path relative to the ignore file's directory.
    ///
    /// Patterns are applied in order, so the last match wins.
    pub fn matches(&self, path: &str, is_dir: bool) -> bool {
        let mut is_ignored = false;
        for (text, mode) in &self.patterns {
            if (mode & MODE_MUST_MATCH_DIR != 0) && !is_dir {
                continue;
            }

            let is_absolute = mode & MODE_ABSOLUTE != 0;
            let has_internal_slash = mode & MODE_NO_SUB_DIR == 0;

            let match_path = if !has_internal_slash && !is_absolute {
                path.rsplit_once('/').map_or(path, |(_, name)| name)
            } else {
                path
            };

            if wildmatch(
                text.as_bstr(),
                match_path.into(),
                wildmatch::Mode::NO_MATCH_SLASH_LITERAL,
            ) {
                is_ignored = mode & MODE_NEGATIVE == 0;
            }
        }
        is_ignored
    }
}

/// Closest-ignore-file lookup with per-directory caching.
pub struct IgnoreFiles {
    root: PathBuf,
    /// directory → (directory holding the ignore file, its matcher)
    cache: FxHashMap<PathBuf, Found>,
}

impl IgnoreFiles {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            cache: FxHashMap::default(),
        }
    }

    /// Whether `path` (a file under the root) is ignored by its closest ignore file.
    pub fn is_ignored(&mut self, path: &Path) -> Result<bool> {
        let Some(dir) = path.parent() else {
            return Ok(false);
        };
        let Some((base, matcher)) = self.closest(dir)? else {
            return Ok(false);
        };

        let relative = path.strip_prefix(&base).unwrap_or(path);
        let relative = relative.to_string_lossy().replace('\\', "/");
        Ok(matcher.matches(&relative, path.is_dir()))
    }

    fn closest(&mut self, dir: &Path) -> Result<Found> {
        if let Some(found) = self.cache.get(dir) {
            return Ok(found.clone());
        }
        if !dir.starts_with(&self.root) {
            bail!(
                "cannot look for {IGNORE_FILE} from outside the templates directory: {}",
                dir.display()
            );
        }

        let candidate = dir.join(IGNORE_FILE);
        let found = if candidate.is_file() {
            let content = fs::read(&candidate)
                .with_context(|| format!("Failed to read {}", candidate.display()))?;
            Some((dir.to_path_buf(), Rc::new(IgnoreMatcher::new(&content))))
        } else if dir == self.root {
            None
        } else {
            match dir.parent() {
                Some(parent) => self.closest(parent)?,
                None => None,
            }
        };

        self.cache.insert(dir.to_path_buf(), found.clone());
        Ok(found)
    }
}
