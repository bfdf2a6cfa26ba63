//! Content database: works, tags, technologies, sites and collections.
//!
//! # Architecture
//!
//! ```text
//! database/
//!   database.json ──► Vec<Work> ──┬──► Work::in_language() ──► WorkOneLang
//!   tags.toml ─────► Vec<Tag> ────┤
//!   technologies.toml ────────────┤
//!   sites.toml ───────────────────┤
//!   collections.toml ─────────────┴──► Collection::fill() (predicate per work)
//! ```
//!
//! Every object exposes a `to_record()` view so expressions in template paths
//! can refer to it (`:work`, `[tag.plural]`, ...).

mod collection;
mod database;
mod taxonomy;
mod work;

pub use collection::Collection;
pub use database::Database;
pub use taxonomy::{ExternalSite, Tag, Technology};
pub use work::{LayoutRow, Link, Media, Paragraph, Work, WorkOneLang};
