//! `[build]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in folio.toml.
///
/// ```toml
/// [build]
/// templates = "templates"
/// database = "database"
/// output = "dist"
/// languages = ["fr", "en"]
/// links = "links.json"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root, usually set through `--root`.
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Templates with dynamic path segments.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Directory holding `database.json` and the TOML files.
    #[serde(default = "defaults::build::database")]
    #[educe(Default = defaults::build::database())]
    pub database: PathBuf,

    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Languages every page is rendered in, first one wins on conflicts.
    #[serde(default = "defaults::build::languages")]
    #[educe(Default = defaults::build::languages())]
    pub languages: Vec<String>,

    /// Render threads, 0 for one per CPU.
    #[serde(default = "defaults::build::workers")]
    #[educe(Default = defaults::build::workers())]
    pub workers: usize,

    /// Delete the output directory before building.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Also write each page's data as `<page>.json`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub emit_data: bool,

    /// Where to write the link → pages registry, if anywhere.
    #[serde(default = "defaults::build::links")]
    #[educe(Default = defaults::build::links())]
    pub links: Option<PathBuf>,

    /// Where to write the progress file, if anywhere.
    #[serde(default = "defaults::build::progress")]
    #[educe(Default = defaults::build::progress())]
    pub progress: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.templates, PathBuf::from("templates"));
        assert_eq!(config.build.database, PathBuf::from("database"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.build.languages, vec!["fr", "en"]);
        assert_eq!(config.build.workers, 0);
        assert!(!config.build.clean);
        assert!(!config.build.emit_data);
        assert!(config.build.links.is_none());
    }

    #[test]
    fn test_build_config() {
        let config = r#"
            [build]
            templates = "pages"
            languages = ["en"]
            workers = 2
            emit_data = true
            links = "links.json"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.templates, PathBuf::from("pages"));
        assert_eq!(config.build.languages, vec!["en"]);
        assert_eq!(config.build.workers, 2);
        assert!(config.build.emit_data);
        assert_eq!(config.build.links, Some(PathBuf::from("links.json")));
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [build]
            minify = true
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }
}
