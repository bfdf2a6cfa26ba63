//! Works: the portfolio entries stored in `database.json`.

use crate::expr::{Record, Value};
use crate::utils::date::parse_creation_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Language key used when a work has no content in the requested language.
pub const DEFAULT_LANGUAGE: &str = "default";

/// One row of a raw layout: a single cell or a list of cells.
///
/// `null` cells are spacers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayoutRow {
    Cell(Option<String>),
    Row(Vec<Option<String>>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub primary: String,
    pub secondary: String,
    pub tertiary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkMetadata {
    pub created: String,
    pub started: String,
    pub finished: String,
    pub tags: Vec<String>,
    #[serde(alias = "made with")]
    pub made_with: Vec<String>,
    pub layout: Vec<LayoutRow>,
    pub colors: Colors,
    #[serde(alias = "page background")]
    pub page_background: String,
    pub title: String,
    pub wip: bool,
    pub private: bool,
    pub thumbnail: String,
    /// media source → resolution → thumbnail path
    pub thumbnails: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paragraph {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
    pub id: String,
    pub alt: String,
    pub title: String,
    pub source: String,
    pub content_type: String,
    pub size: u64,
    pub duration: f64,
    pub online: bool,
}

impl Media {
    /// Coarse media type used by templates: `image`, `video`, `audio`, `pdf`...
    pub fn general_content_type(&self) -> String {
        if self.content_type == "application/pdf" {
            return "pdf".to_owned();
        }
        self.content_type
            .split('/')
            .next()
            .unwrap_or_default()
            .to_owned()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub id: String,
    pub name: String,
    pub title: String,
    pub url: String,
}

/// A work with per-language content, as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Work {
    pub id: String,
    pub metadata: WorkMetadata,
    pub title: BTreeMap<String, String>,
    pub paragraphs: BTreeMap<String, Vec<Paragraph>>,
    pub media: BTreeMap<String, Vec<Media>>,
    pub links: BTreeMap<String, Vec<Link>>,
    pub footnotes: BTreeMap<String, BTreeMap<String, String>>,
}

/// A work resolved to a single language.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkOneLang {
    pub id: String,
    pub language: String,
    pub metadata: WorkMetadata,
    pub title: String,
    pub paragraphs: Vec<Paragraph>,
    pub media: Vec<Media>,
    pub links: Vec<Link>,
    pub footnotes: BTreeMap<String, String>,
}

fn localized<T: Clone + Default>(
    map: &BTreeMap<String, T>,
    language: &str,
    is_empty: impl Fn(&T) -> bool,
) -> T {
    map.get(language)
        .filter(|value| !is_empty(value))
        .or_else(|| map.get(DEFAULT_LANGUAGE))
        .cloned()
        .unwrap_or_default()
}

fn creation_date_text(meta: &WorkMetadata) -> &str {
    if meta.created.is_empty() {
        &meta.finished
    } else {
        &meta.created
    }
}

impl Work {
    /// Fill `started` and `finished` from `created` when both are missing.
    pub fn resolve_dates(&mut self) {
        let meta = &mut self.metadata;
        if meta.started.is_empty() && meta.finished.is_empty() && !meta.created.is_empty() {
            meta.started = meta.created.clone();
            meta.finished = meta.created.clone();
        }
    }

    /// Content in `language`, falling back to the `default` key per field.
    pub fn in_language(&self, language: &str) -> WorkOneLang {
        WorkOneLang {
            id: self.id.clone(),
            language: language.to_owned(),
            metadata: self.metadata.clone(),
            title: localized(&self.title, language, String::is_empty),
            paragraphs: localized(&self.paragraphs, language, Vec::is_empty),
            media: localized(&self.media, language, Vec::is_empty),
            links: localized(&self.links, language, Vec::is_empty),
            footnotes: localized(&self.footnotes, language, BTreeMap::is_empty),
        }
    }

    /// The raw date string creation is computed from.
    pub fn creation_date_text(&self) -> &str {
        creation_date_text(&self.metadata)
    }
}

impl WorkOneLang {
    /// Creation date, or `None` when unknown.
    ///
    /// Works without a date sort as the most recent ones.
    pub fn created(&self) -> Option<NaiveDate> {
        parse_creation_date(creation_date_text(&self.metadata))
    }

    pub fn is_wip(&self) -> bool {
        let meta = &self.metadata;
        meta.wip
            || (!meta.started.is_empty()
                && (!meta.created.is_empty() || !meta.finished.is_empty()))
    }

    /// Expression-facing view of the work, identified by its ID.
    pub fn to_record(&self) -> Record {
        let meta = &self.metadata;
        Record::new(&self.id)
            .with("title", self.title.as_str())
            .with("language", self.language.as_str())
            .with("created", meta.created.as_str())
            .with("started", meta.started.as_str())
            .with("finished", meta.finished.as_str())
            .with("tags", meta.tags.clone())
            .with("made_with", meta.made_with.clone())
            .with("wip", self.is_wip())
            .with("private", meta.private)
            .with("thumbnail", meta.thumbnail.as_str())
            .with("page_background", meta.page_background.as_str())
            .with("paragraphs", self.paragraphs.len())
            .with("media", self.media.len())
            .with("links", self.links.len())
            .with(
                "year",
                self.created().map(|d| Value::from(d.format("%Y").to_string())),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Work {
        serde_json::from_str(
            r##"{
                "id": "neptune",
                "metadata": {
                    "created": "2021-03-04",
                    "tags": ["music"],
                    "made with": ["rust"],
                    "layout": ["p", ["m1", null], null],
                    "page background": "#000"
                },
                "title": {"default": "Neptune", "fr": "Neptune (fr)"},
                "paragraphs": {
                    "default": [{"id": "", "content": "hello"}],
                    "fr": [{"id": "", "content": "bonjour"}]
                },
                "media": {
                    "default": [{"source": "a.pdf", "content_type": "application/pdf"}]
                }
            }"##,
        )
        .unwrap()
    }

    #[test]
    fn test_deserialize_aliases_and_layout() {
        let work = sample();
        assert_eq!(work.metadata.made_with, vec!["rust"]);
        assert_eq!(work.metadata.page_background, "#000");
        assert_eq!(
            work.metadata.layout,
            vec![
                LayoutRow::Cell(Some("p".into())),
                LayoutRow::Row(vec![Some("m1".into()), None]),
                LayoutRow::Cell(None),
            ]
        );
    }

    #[test]
    fn test_in_language_falls_back_to_default() {
        let work = sample();
        let fr = work.in_language("fr");
        assert_eq!(fr.title, "Neptune (fr)");
        assert_eq!(fr.paragraphs[0].content, "bonjour");
        assert_eq!(fr.media.len(), 1);

        let en = work.in_language("en");
        assert_eq!(en.title, "Neptune");
        assert_eq!(en.paragraphs[0].content, "hello");
        assert_eq!(en.language, "en");
    }

    #[test]
    fn test_general_content_type() {
        let media = |content_type: &str| Media {
            content_type: content_type.into(),
            ..Media::default()
        };
        assert_eq!(media("application/pdf").general_content_type(), "pdf");
        assert_eq!(media("image/png").general_content_type(), "image");
        assert_eq!(media("video/mp4").general_content_type(), "video");
        assert_eq!(media("").general_content_type(), "");
    }

    #[test]
    fn test_resolve_dates() {
        let mut work = sample();
        work.resolve_dates();
        assert_eq!(work.metadata.started, "2021-03-04");
        assert_eq!(work.metadata.finished, "2021-03-04");

        let mut work = sample();
        work.metadata.started = "2020".into();
        work.resolve_dates();
        assert_eq!(work.metadata.finished, "");
    }

    #[test]
    fn test_created_and_wip() {
        let mut work = sample();
        let one = work.in_language("en");
        assert_eq!(one.created(), NaiveDate::from_ymd_opt(2021, 3, 4));
        assert!(!one.is_wip());

        work.metadata.created.clear();
        work.metadata.started = "2020-01-01".into();
        work.metadata.finished = "2020-02-01".into();
        let one = work.in_language("en");
        assert_eq!(one.created(), NaiveDate::from_ymd_opt(2020, 2, 1));
        assert!(one.is_wip());
    }

    #[test]
    fn test_to_record() {
        let record = sample().in_language("fr").to_record();
        assert_eq!(record.id, "neptune");
        assert_eq!(record.fields["title"], Value::from("Neptune (fr)"));
        assert_eq!(record.fields["year"], Value::from("2021"));
        assert_eq!(record.fields["tags"], Value::from(vec!["music"]));
    }
}
