//! The object a page is being rendered for.
//!
//! A hydration is one language plus at most one subject. Templates whose path
//! iterates over works get one hydration per work, and so on.

use crate::data::{Collection, Database, ExternalSite, Tag, Technology, Work};
use crate::expr::{Context, Value};
use std::fmt;

/// Kinds of database objects a template path can iterate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubjectKind {
    Work,
    Tag,
    Technology,
    Site,
    Collection,
}

impl SubjectKind {
    /// Kind named by the leading identifier of an expression, if any.
    pub fn from_identifier(name: &str) -> Option<Self> {
        match name {
            "work" => Some(Self::Work),
            "tag" => Some(Self::Tag),
            "technology" | "tech" => Some(Self::Technology),
            "site" => Some(Self::Site),
            "collection" => Some(Self::Collection),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Tag => "tag",
            Self::Technology => "technology",
            Self::Site => "site",
            Self::Collection => "collection",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub enum Subject<'a> {
    #[default]
    None,
    Work(&'a Work),
    Tag(&'a Tag),
    Technology(&'a Technology),
    Site(&'a ExternalSite),
    Collection(&'a Collection),
}

impl<'a> Subject<'a> {
    /// Every object of `kind` in the database.
    pub fn all_of(kind: SubjectKind, database: &'a Database) -> Vec<Self> {
        match kind {
            SubjectKind::Work => database.works.iter().map(Self::Work).collect(),
            SubjectKind::Tag => database.tags.iter().map(Self::Tag).collect(),
            SubjectKind::Technology => database.technologies.iter().map(Self::Technology).collect(),
            SubjectKind::Site => database.sites.iter().map(Self::Site).collect(),
            SubjectKind::Collection => database.collections.iter().map(Self::Collection).collect(),
        }
    }

    pub const fn kind(&self) -> Option<SubjectKind> {
        match self {
            Self::None => None,
            Self::Work(_) => Some(SubjectKind::Work),
            Self::Tag(_) => Some(SubjectKind::Tag),
            Self::Technology(_) => Some(SubjectKind::Technology),
            Self::Site(_) => Some(SubjectKind::Site),
            Self::Collection(_) => Some(SubjectKind::Collection),
        }
    }

    /// Identifier of the subject as it appears in output paths.
    pub fn id(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Work(work) => work.id.clone(),
            Self::Tag(tag) => tag.url_name(),
            Self::Technology(tech) => tech.url_name(),
            Self::Site(site) => site.url_name(),
            Self::Collection(collection) => collection.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Hydration<'a> {
    pub language: &'a str,
    pub subject: Subject<'a>,
}

impl<'a> Hydration<'a> {
    pub const fn new(language: &'a str, subject: Subject<'a>) -> Self {
        Self { language, subject }
    }

    pub const fn empty(language: &'a str) -> Self {
        Self::new(language, Subject::None)
    }

    pub fn work(&self) -> Option<&'a Work> {
        match self.subject {
            Subject::Work(work) => Some(work),
            _ => None,
        }
    }

    /// Variables available to path expressions.
    ///
    /// Every subject variable is bound, to `nil` when it is not the current one.
    pub fn context(&self) -> Context {
        let mut work = Value::Nil;
        let mut tag = Value::Nil;
        let mut tech = Value::Nil;
        let mut site = Value::Nil;
        let mut collection = Value::Nil;

        match self.subject {
            Subject::None => {}
            Subject::Work(w) => work = w.in_language(self.language).to_record().into(),
            Subject::Tag(t) => tag = t.to_record().into(),
            Subject::Technology(t) => tech = t.to_record().into(),
            Subject::Site(s) => site = s.to_record().into(),
            Subject::Collection(c) => collection = c.to_record(self.language).into(),
        }

        let mut context = Context::default();
        context.insert("work".into(), work);
        context.insert("tag".into(), tag);
        context.insert("technology".into(), tech.clone());
        context.insert("tech".into(), tech);
        context.insert("site".into(), site);
        context.insert("collection".into(), collection);
        context.insert("language".into(), self.language.into());
        context.insert("lang".into(), self.language.into());
        context
    }
}

impl fmt::Display for Hydration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subject.kind() {
            Some(kind) => write!(f, "{} {} ({})", kind.name(), self.subject.id(), self.language),
            None => write!(f, "({})", self.language),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Record;

    fn database() -> Database {
        Database {
            works: vec![Work {
                id: "neptune".into(),
                ..Work::default()
            }],
            tags: vec![Tag {
                plural: "Motion designs".into(),
                ..Tag::default()
            }],
            ..Database::default()
        }
    }

    #[test]
    fn test_kind_from_identifier() {
        assert_eq!(SubjectKind::from_identifier("tech"), Some(SubjectKind::Technology));
        assert_eq!(SubjectKind::from_identifier("technology"), Some(SubjectKind::Technology));
        assert_eq!(SubjectKind::from_identifier("language"), None);
    }

    #[test]
    fn test_context_binds_absent_subjects_to_nil() {
        let db = database();
        let hydration = Hydration::new("fr", Subject::Work(&db.works[0]));
        let ctx = hydration.context();

        assert_eq!(ctx["work"].stringify().unwrap(), "neptune");
        assert_eq!(ctx["tag"], Value::Nil);
        assert_eq!(ctx["tech"], Value::Nil);
        assert_eq!(ctx["language"], Value::from("fr"));
        assert_eq!(ctx["lang"], Value::from("fr"));
    }

    #[test]
    fn test_tag_context_uses_url_name() {
        let db = database();
        let hydration = Hydration::new("en", Subject::Tag(&db.tags[0]));
        let Value::Record(Record { id, .. }) = &hydration.context()["tag"] else {
            panic!("expected a record");
        };
        assert_eq!(id, "motion-designs");
        assert_eq!(hydration.to_string(), "tag motion-designs (en)");
    }

    #[test]
    fn test_all_of() {
        let db = database();
        assert_eq!(Subject::all_of(SubjectKind::Work, &db).len(), 1);
        assert!(Subject::all_of(SubjectKind::Site, &db).is_empty());
        assert_eq!(Hydration::empty("fr").to_string(), "(fr)");
    }
}
