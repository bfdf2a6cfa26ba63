//! Collections: named groups of works defined by a predicate.
//!
//! ```toml
//! [games]
//! title = { fr = "Jeux", en = "Games" }
//! includes = "#game and not made with scratch"
//! ```
//!
//! The predicate sees one boolean per work ID, tag and technology, plus
//! `work` itself. Before compilation it is rewritten:
//!
//! | Written | Compiled |
//! |---------|----------|
//! | `a-b` | `a_b` |
//! | `#music` | `tag_music` |
//! | `made with rust` | `technology_rust` |
//! | `tag_video*` | `(tag_video_games or tag_videos)` |

use super::taxonomy::{Tag, Technology};
use super::work::Work;
use crate::expr::{Context, ExprError, ExpressionEngine, Record, Value};
use crate::utils::slug::identifier;
use gix::glob::wildmatch;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::LazyLock};

static RE_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\S)-(\S)").unwrap());
static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s|^|\()#([A-Za-z0-9_*]+)").unwrap());
static RE_MADE_WITH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s|^|\()made with ([A-Za-z0-9_*]+)").unwrap());
static RE_GLOB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]*\*[A-Za-z0-9_*]*").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collection {
    /// Key of the collection's table.
    #[serde(skip)]
    pub id: String,
    pub title: BTreeMap<String, String>,
    pub description: BTreeMap<String, String>,
    #[serde(alias = "learn more at")]
    pub learn_more_at: String,
    pub aliases: Vec<String>,
    /// Membership predicate.
    pub includes: String,
    /// IDs of member works, computed at load time.
    #[serde(skip_deserializing)]
    pub works: Vec<String>,
}

impl Collection {
    pub fn to_record(&self, language: &str) -> Record {
        let pick = |map: &BTreeMap<String, String>| {
            map.get(language).cloned().unwrap_or_default()
        };
        Record::new(self.id.as_str())
            .with("title", pick(&self.title))
            .with("description", pick(&self.description))
            .with("learn_more_at", self.learn_more_at.as_str())
            .with("aliases", self.aliases.clone())
            .with("works", self.works.clone())
    }

    /// Evaluate the predicate against every work, storing member IDs.
    pub fn fill(
        &mut self,
        engine: &ExpressionEngine,
        works: &[Work],
        tags: &[Tag],
        technologies: &[Technology],
    ) -> Result<(), ExprError> {
        self.works.clear();
        if self.includes.trim().is_empty() {
            return Ok(());
        }

        for work in works {
            let context = membership_context(work, works, tags, technologies);
            let predicate = preprocess_predicate(&self.includes, &context);
            if engine.eval_bool(&predicate, &context)? {
                self.works.push(work.id.clone());
            }
        }
        Ok(())
    }
}

fn membership_context(
    work: &Work,
    works: &[Work],
    tags: &[Tag],
    technologies: &[Technology],
) -> Context {
    let mut context = Context::default();

    for other in works {
        context.insert(identifier(&other.id), Value::Bool(other.id == work.id));
    }
    for tag in tags {
        let tagged = work.metadata.tags.iter().any(|name| tag.referred_to_by(name));
        context.insert(format!("tag_{}", identifier(&tag.url_name())), Value::Bool(tagged));
    }
    for tech in technologies {
        let used = work
            .metadata
            .made_with
            .iter()
            .any(|name| tech.referred_to_by(name));
        context.insert(
            format!("technology_{}", identifier(&tech.url_name())),
            Value::Bool(used),
        );
    }

    // language-independent view, like the rest of the membership check
    context.insert("work".into(), Value::Record(work.in_language("").to_record()));
    context
}

/// Replace every match until the text stops changing.
///
/// `a-b-c` needs two passes since matches cannot overlap.
fn replace_until_stable(re: &Regex, text: String, rep: &str) -> String {
    let mut current = text;
    loop {
        let next = re.replace_all(&current, rep).into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Rewrite the predicate shorthands into plain expression syntax.
pub fn preprocess_predicate(predicate: &str, context: &Context) -> String {
    let text = replace_until_stable(&RE_DASH, predicate.to_owned(), "${1}_${2}");
    let text = RE_TAG.replace_all(&text, "${1}tag_${2}").into_owned();
    let text = RE_MADE_WITH
        .replace_all(&text, "${1}technology_${2}")
        .into_owned();

    let mut names: Vec<&String> = context.keys().collect();
    names.sort();

    RE_GLOB
        .replace_all(&text, |caps: &Captures| {
            let pattern = &caps[0];
            let matching: Vec<&str> = names
                .iter()
                .filter(|name| {
                    wildmatch(
                        pattern.into(),
                        name.as_str().into(),
                        wildmatch::Mode::empty(),
                    )
                })
                .map(|name| name.as_str())
                .collect();
            if matching.is_empty() {
                "false".to_owned()
            } else {
                format!("({})", matching.join(" or "))
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(id: &str, tags: &[&str], made_with: &[&str]) -> Work {
        let mut work = Work {
            id: id.into(),
            ..Work::default()
        };
        work.metadata.tags = tags.iter().map(|s| s.to_string()).collect();
        work.metadata.made_with = made_with.iter().map(|s| s.to_string()).collect();
        work
    }

    fn tag(plural: &str) -> Tag {
        Tag {
            singular: plural.trim_end_matches('s').into(),
            plural: plural.into(),
            ..Tag::default()
        }
    }

    fn tech(slug: &str) -> Technology {
        Technology {
            slug: slug.into(),
            name: slug.into(),
            ..Technology::default()
        }
    }

    fn context_keys(keys: &[&str]) -> Context {
        keys.iter()
            .map(|k| (k.to_string(), Value::Bool(false)))
            .collect()
    }

    #[test]
    fn test_preprocess_dashes_and_tags() {
        let ctx = context_keys(&[]);
        assert_eq!(preprocess_predicate("#video-games", &ctx), "tag_video_games");
        assert_eq!(
            preprocess_predicate("a-b-c or #music", &ctx),
            "a_b_c or tag_music"
        );
        assert_eq!(
            preprocess_predicate("not (#music and made with rust)", &ctx),
            "not (tag_music and technology_rust)"
        );
    }

    #[test]
    fn test_preprocess_globs() {
        let ctx = context_keys(&["tag_videos", "tag_video_games", "tag_music", "neptune"]);
        assert_eq!(
            preprocess_predicate("tag_video*", &ctx),
            "(tag_video_games or tag_videos)"
        );
        assert_eq!(
            preprocess_predicate("#video* and not neptune", &ctx),
            "(tag_video_games or tag_videos) and not neptune"
        );
        assert_eq!(preprocess_predicate("#nothing*", &ctx), "false");
    }

    #[test]
    fn test_fill_collection() {
        let engine = ExpressionEngine::new();
        let works = vec![
            work("neptune", &["Musics"], &["rust"]),
            work("ideaseed", &["apps"], &["python"]),
            work("abyss-of-time", &["musics"], &[]),
        ];
        let tags = vec![tag("musics"), tag("apps")];
        let techs = vec![tech("rust"), tech("python")];

        let mut collection = Collection {
            id: "sounds".into(),
            includes: "#musics and not abyss-of-time".into(),
            ..Collection::default()
        };
        collection.fill(&engine, &works, &tags, &techs).unwrap();
        assert_eq!(collection.works, vec!["neptune"]);

        collection.includes = "made with python or abyss-of-time".into();
        collection.fill(&engine, &works, &tags, &techs).unwrap();
        assert_eq!(collection.works, vec!["ideaseed", "abyss-of-time"]);
    }

    #[test]
    fn test_fill_requires_boolean() {
        let engine = ExpressionEngine::new();
        let works = vec![work("neptune", &[], &[])];
        let mut collection = Collection {
            id: "bad".into(),
            includes: "work.title".into(),
            ..Collection::default()
        };
        assert!(collection.fill(&engine, &works, &[], &[]).is_err());
    }

    #[test]
    fn test_empty_predicate_matches_nothing() {
        let engine = ExpressionEngine::new();
        let works = vec![work("neptune", &[], &[])];
        let mut collection = Collection::default();
        collection.fill(&engine, &works, &[], &[]).unwrap();
        assert!(collection.works.is_empty());
    }

    #[test]
    fn test_record_is_localized() {
        let mut collection = Collection {
            id: "games".into(),
            ..Collection::default()
        };
        collection.title.insert("fr".into(), "Jeux".into());
        let record = collection.to_record("fr");
        assert_eq!(record.id, "games");
        assert_eq!(record.fields["title"], Value::from("Jeux"));
        assert_eq!(collection.to_record("en").fields["title"], Value::from(""));
    }
}
