//! Loading the content database from disk.
//!
//! | File | Format | Required |
//! |------|--------|----------|
//! | `database.json` | array of works | yes |
//! | `tags.toml` | `[[tags]]` | no |
//! | `technologies.toml` | `[[technologies]]` | no |
//! | `sites.toml` | `[[sites]]` | no |
//! | `collections.toml` | one `[id]` table per collection | no |

use super::collection::Collection;
use super::taxonomy::{ExternalSite, Tag, Technology};
use super::work::{Work, WorkOneLang};
use crate::expr::{ExprError, ExpressionEngine};
use crate::log;
use crate::utils::date::parse_creation_date;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::{
    cmp::Reverse,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const WORKS_FILE: &str = "database.json";
pub const TAGS_FILE: &str = "tags.toml";
pub const TECHNOLOGIES_FILE: &str = "technologies.toml";
pub const SITES_FILE: &str = "sites.toml";
pub const COLLECTIONS_FILE: &str = "collections.toml";

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid JSON in `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("invalid TOML in `{0}`")]
    Toml(PathBuf, #[source] toml::de::Error),

    #[error("work `{work}` has an invalid creation date `{date}`")]
    InvalidDate { work: String, date: String },

    #[error("invalid predicate `{predicate}` for collection `{collection}`")]
    Collection {
        collection: String,
        predicate: String,
        #[source]
        source: ExprError,
    },
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct TagsFile {
    tags: Vec<Tag>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct TechnologiesFile {
    technologies: Vec<Technology>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SitesFile {
    sites: Vec<ExternalSite>,
}

/// Everything pages are generated from.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub works: Vec<Work>,
    pub tags: Vec<Tag>,
    pub technologies: Vec<Technology>,
    pub sites: Vec<ExternalSite>,
    pub collections: Vec<Collection>,
}

impl Database {
    /// Load every database file in `dir` and compute collection membership.
    pub fn load(dir: &Path, engine: &ExpressionEngine) -> Result<Self, DatabaseError> {
        let works = load_works(&dir.join(WORKS_FILE))?;
        let tags = load_toml::<TagsFile>(&dir.join(TAGS_FILE))?.tags;
        let technologies =
            load_toml::<TechnologiesFile>(&dir.join(TECHNOLOGIES_FILE))?.technologies;
        let sites = load_toml::<SitesFile>(&dir.join(SITES_FILE))?.sites;

        let mut collections: Vec<Collection> =
            load_toml::<BTreeMap<String, Collection>>(&dir.join(COLLECTIONS_FILE))?
                .into_iter()
                .map(|(id, collection)| Collection { id, ..collection })
                .collect();

        for collection in &mut collections {
            collection
                .fill(engine, &works, &tags, &technologies)
                .map_err(|source| DatabaseError::Collection {
                    collection: collection.id.clone(),
                    predicate: collection.includes.clone(),
                    source,
                })?;
        }

        log!(
            "database";
            "loaded {} works, {} tags, {} technologies, {} sites, {} collections",
            works.len(),
            tags.len(),
            technologies.len(),
            sites.len(),
            collections.len()
        );

        Ok(Self {
            works,
            tags,
            technologies,
            sites,
            collections,
        })
    }

    /// Public works in `language`, most recent first.
    ///
    /// Undated works come first.
    pub fn works_in(&self, language: &str) -> Vec<WorkOneLang> {
        let mut works: Vec<WorkOneLang> = self
            .works
            .iter()
            .filter(|work| !work.metadata.private)
            .map(|work| work.in_language(language))
            .collect();
        works.sort_by_key(|work| Reverse(work.created().unwrap_or(NaiveDate::MAX)));
        works
    }
}

fn load_works(path: &Path) -> Result<Vec<Work>, DatabaseError> {
    let content =
        fs::read_to_string(path).map_err(|err| DatabaseError::Io(path.to_path_buf(), err))?;
    let mut works: Vec<Work> = serde_json::from_str(&content)
        .map_err(|err| DatabaseError::Json(path.to_path_buf(), err))?;

    for work in &mut works {
        work.resolve_dates();
        let date = work.creation_date_text();
        if !date.is_empty() && parse_creation_date(date).is_none() {
            return Err(DatabaseError::InvalidDate {
                work: work.id.clone(),
                date: date.to_owned(),
            });
        }
    }
    Ok(works)
}

/// Parse an optional TOML file, defaulting when it does not exist.
fn load_toml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, DatabaseError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content =
        fs::read_to_string(path).map_err(|err| DatabaseError::Io(path.to_path_buf(), err))?;
    toml::from_str(&content).map_err(|err| DatabaseError::Toml(path.to_path_buf(), err))
}
