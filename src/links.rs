//! External links found in generated pages.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use regex::Regex;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
    sync::LazyLock,
};

/// Stops at quotes and angle brackets so links inside HTML attributes come out clean.
static RE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bhttps?://[^\s"'<>]+\b"#).unwrap());

/// Link → pages it appears on.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    links: Mutex<BTreeMap<String, BTreeSet<String>>>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every link in `content` as appearing on `page`.
    pub fn scan(&self, page: &str, content: &str) {
        let found: Vec<&str> = RE_LINK.find_iter(content).map(|m| m.as_str()).collect();
        if found.is_empty() {
            return;
        }
        let mut links = self.links.lock();
        for link in found {
            links
                .entry(link.to_owned())
                .or_default()
                .insert(page.to_owned());
        }
    }

    pub fn len(&self) -> usize {
        self.links.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.lock().is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&*self.links.lock())?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("failed to write links to {}", path.display()))
    }
}
