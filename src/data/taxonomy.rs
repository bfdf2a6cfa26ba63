//! Tags, technologies and external sites.
//!
//! Each is addressed in URLs by a slug and can be referred to from a work's
//! metadata by any of its names or aliases, case-insensitively.

use crate::expr::Record;
use crate::utils::slug::slugify;
use serde::{Deserialize, Serialize};

fn loosely_matches<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> bool {
    let name = name.to_lowercase();
    candidates
        .into_iter()
        .any(|candidate| !candidate.is_empty() && candidate.to_lowercase() == name)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub singular: String,
    pub plural: String,
    pub aliases: Vec<String>,
    pub description: String,
    #[serde(alias = "learn more at")]
    pub learn_more_at: String,
}

impl Tag {
    pub fn url_name(&self) -> String {
        slugify(&self.plural)
    }

    pub fn referred_to_by(&self, name: &str) -> bool {
        let url_name = self.url_name();
        loosely_matches(
            name,
            [self.plural.as_str(), self.singular.as_str(), url_name.as_str()]
                .into_iter()
                .chain(self.aliases.iter().map(String::as_str)),
        )
    }

    pub fn to_record(&self) -> Record {
        Record::new(self.url_name())
            .with("singular", self.singular.as_str())
            .with("plural", self.plural.as_str())
            .with("description", self.description.as_str())
            .with("learn_more_at", self.learn_more_at.as_str())
            .with("aliases", self.aliases.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Technology {
    /// Unique identifier used in URLs.
    pub slug: String,
    pub name: String,
    pub aliases: Vec<String>,
    /// Company or author behind the technology.
    pub by: String,
    #[serde(alias = "learn more at")]
    pub learn_more_at: String,
    pub description: String,
}

impl Technology {
    pub fn url_name(&self) -> String {
        self.slug.clone()
    }

    pub fn referred_to_by(&self, name: &str) -> bool {
        loosely_matches(
            name,
            [self.slug.as_str(), self.name.as_str()]
                .into_iter()
                .chain(self.aliases.iter().map(String::as_str)),
        )
    }

    pub fn to_record(&self) -> Record {
        Record::new(self.slug.as_str())
            .with("name", self.name.as_str())
            .with("by", self.by.as_str())
            .with("description", self.description.as_str())
            .with("learn_more_at", self.learn_more_at.as_str())
            .with("aliases", self.aliases.clone())
    }
}

/// A site the author has a presence on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSite {
    pub name: String,
    pub url: String,
    pub purpose: String,
    pub username: String,
    pub aliases: Vec<String>,
}

impl ExternalSite {
    pub fn url_name(&self) -> String {
        slugify(&self.name)
    }

    pub fn referred_to_by(&self, name: &str) -> bool {
        let url_name = self.url_name();
        loosely_matches(
            name,
            [self.name.as_str(), url_name.as_str()]
                .into_iter()
                .chain(self.aliases.iter().map(String::as_str)),
        )
    }

    pub fn to_record(&self) -> Record {
        Record::new(self.url_name())
            .with("name", self.name.as_str())
            .with("url", self.url.as_str())
            .with("purpose", self.purpose.as_str())
            .with("username", self.username.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Value;

    fn tag() -> Tag {
        Tag {
            singular: "motion design".into(),
            plural: "Motion designs".into(),
            aliases: vec!["motion".into()],
            ..Tag::default()
        }
    }

    #[test]
    fn test_tag_url_name_is_slug_of_plural() {
        assert_eq!(tag().url_name(), "motion-designs");
    }

    #[test]
    fn test_tag_referred_to_by() {
        let tag = tag();
        assert!(tag.referred_to_by("Motion Design"));
        assert!(tag.referred_to_by("motion designs"));
        assert!(tag.referred_to_by("motion-designs"));
        assert!(tag.referred_to_by("MOTION"));
        assert!(!tag.referred_to_by("design"));
        assert!(!tag.referred_to_by(""));
    }

    #[test]
    fn test_technology() {
        let tech = Technology {
            slug: "photoshop".into(),
            name: "Photoshop".into(),
            by: "Adobe".into(),
            aliases: vec!["ps".into()],
            ..Technology::default()
        };
        assert_eq!(tech.url_name(), "photoshop");
        assert!(tech.referred_to_by("PS"));
        assert!(tech.referred_to_by("PhotoShop"));
        assert!(!tech.referred_to_by("adobe"));

        let record = tech.to_record();
        assert_eq!(record.id, "photoshop");
        assert_eq!(record.fields["by"], Value::from("Adobe"));
    }

    #[test]
    fn test_site() {
        let site = ExternalSite {
            name: "Behance".into(),
            url: "https://behance.net/x".into(),
            ..ExternalSite::default()
        };
        assert_eq!(site.url_name(), "behance");
        assert!(site.referred_to_by("behance"));
        assert_eq!(site.to_record().id, "behance");
    }

    #[test]
    fn test_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct File {
            tags: Vec<Tag>,
        }
        let file: File = toml::from_str(
            r#"
            [[tags]]
            singular = "game"
            plural = "games"
            "learn more at" = "https://example.com"
            "#,
        )
        .unwrap();
        assert_eq!(file.tags[0].learn_more_at, "https://example.com");
        assert_eq!(file.tags[0].url_name(), "games");
    }
}
