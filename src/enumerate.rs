//! Counting the pages a set of templates will produce.
//!
//! The count drives progress reporting only, so it is computed from the
//! template paths without evaluating anything.

use crate::data::Database;
use crate::hydration::SubjectKind;
use crate::log;
use crate::paths::dynamic_path_expressions;
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

static RE_LEADING_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)").unwrap());

/// `language is "fr"` renders for a single language.
static RE_LANGUAGE_IS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*lang(uage)?\s+is\b").unwrap());

fn leading_identifier(expression: &str) -> Option<&str> {
    RE_LEADING_IDENT
        .captures(expression)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Distinct subject kinds `path` iterates over, in path order.
pub fn iterated_kinds(path: &str) -> Vec<SubjectKind> {
    let mut kinds = Vec::new();
    for expression in dynamic_path_expressions(path) {
        if let Some(kind) = leading_identifier(&expression).and_then(SubjectKind::from_identifier)
            && !kinds.contains(&kind)
        {
            kinds.push(kind);
        }
    }
    kinds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Language,
    Subject(SubjectKind),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PageEnumerator {
    works: usize,
    tags: usize,
    technologies: usize,
    sites: usize,
    collections: usize,
    languages: usize,
}

impl PageEnumerator {
    pub fn new(database: &Database, languages: &[String]) -> Self {
        Self {
            works: database.works.len(),
            tags: database.tags.len(),
            technologies: database.technologies.len(),
            sites: database.sites.len(),
            collections: database.collections.len(),
            languages: languages.len(),
        }
    }

    fn count_of(&self, kind: SubjectKind) -> usize {
        match kind {
            SubjectKind::Work => self.works,
            SubjectKind::Tag => self.tags,
            SubjectKind::Technology => self.technologies,
            SubjectKind::Site => self.sites,
            SubjectKind::Collection => self.collections,
        }
    }

    /// What a segment iterates over, if anything.
    fn dimension(expression: &str) -> Option<Dimension> {
        if RE_LANGUAGE_IS.is_match(expression) {
            return None;
        }
        match leading_identifier(expression)? {
            "language" | "lang" => Some(Dimension::Language),
            name => SubjectKind::from_identifier(name).map(Dimension::Subject),
        }
    }

    /// Number of pages one template path expands to.
    ///
    /// Segments naming the same kind (`[work.wip]/:work.pug`) iterate it once.
    pub fn count_for(&self, path: &str) -> usize {
        let mut seen = Vec::new();
        for expression in dynamic_path_expressions(path) {
            if let Some(dimension) = Self::dimension(&expression)
                && !seen.contains(&dimension)
            {
                seen.push(dimension);
            }
        }
        seen.into_iter()
            .map(|dimension| match dimension {
                Dimension::Language => self.languages,
                Dimension::Subject(kind) => self.count_of(kind),
            })
            .product()
    }

    /// Pages produced by every template under `root`.
    ///
    /// Templates whose path cannot be read count for nothing.
    pub fn total(&self, root: &Path, templates: &[PathBuf]) -> usize {
        templates
            .iter()
            .map(|template| match relative_template_path(root, template) {
                Ok(path) => self.count_for(&path),
                Err(err) => {
                    log!("enumerate"; "{err:#}");
                    0
                }
            })
            .sum()
    }
}

/// Template path relative to the templates root, with `/` separators.
pub fn relative_template_path(root: &Path, template: &Path) -> anyhow::Result<String> {
    let relative = template.strip_prefix(root).map_err(|_| {
        anyhow::anyhow!(
            "template `{}` is outside `{}`",
            template.display(),
            root.display()
        )
    })?;
    let parts = relative
        .components()
        .map(|component| {
            component.as_os_str().to_str().ok_or_else(|| {
                anyhow::anyhow!("template path `{}` is not valid UTF-8", template.display())
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Tag, Work};

    fn enumerator() -> PageEnumerator {
        let database = Database {
            works: vec![Work::default(); 4],
            tags: vec![Tag::default(); 3],
            ..Database::default()
        };
        PageEnumerator::new(&database, &["fr".into(), "en".into()])
    }

    #[test]
    fn test_iterated_kinds() {
        assert_eq!(
            iterated_kinds(":language/:work/[tech.name].pug"),
            vec![SubjectKind::Work, SubjectKind::Technology]
        );
        assert_eq!(
            iterated_kinds("[work.wip]/:work.pug"),
            vec![SubjectKind::Work]
        );
        assert!(iterated_kinds("about/index.pug").is_empty());
        assert!(iterated_kinds(":language/index.pug").is_empty());
    }

    #[test]
    fn test_count_for() {
        let pages = enumerator();
        assert_eq!(pages.count_for("index.pug"), 1);
        assert_eq!(pages.count_for(":language/index.pug"), 2);
        assert_eq!(pages.count_for(":lang/:work.pug"), 8);
        assert_eq!(pages.count_for(r#"[language is "fr"]/:work.pug"#), 4);
        assert_eq!(pages.count_for(r#"[lang is "en"]/:tag.pug"#), 3);
        assert_eq!(pages.count_for(":site.pug"), 0);
        assert_eq!(pages.count_for("[1 + 1]/index.pug"), 1);
    }

    #[test]
    fn test_count_for_repeated_kind() {
        let pages = enumerator();
        assert_eq!(pages.count_for("[work.wip]/:work.pug"), 4);
        assert_eq!(pages.count_for(":work/:work.created.pug"), 4);
        assert_eq!(pages.count_for(":language/[lang]/:work.pug"), 8);
    }

    #[test]
    fn test_total() {
        let pages = enumerator();
        let root = PathBuf::from("/site/templates");
        let templates = vec![
            root.join("index.pug"),
            root.join(":language").join(":work.pug"),
            PathBuf::from("/elsewhere/x.pug"),
        ];
        assert_eq!(pages.total(&root, &templates), 9);
    }

    #[test]
    fn test_relative_template_path() {
        let root = Path::new("/site/templates");
        assert_eq!(
            relative_template_path(root, &root.join(":language").join("index.pug")).unwrap(),
            ":language/index.pug"
        );
        assert!(relative_template_path(root, Path::new("/other/index.pug")).is_err());
    }
}
