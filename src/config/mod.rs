//! Site configuration, read from `folio.toml`.
//!
//! | Section | Purpose |
//! |---------|---------|
//! | `[build]` | Directories, languages, worker count, optional outputs |
//! | `[develop]` | File watching for `folio develop` |
//!
//! ```toml
//! [build]
//! templates = "templates"
//! database = "database"
//! output = "dist"
//! languages = ["fr", "en"]
//! emit_data = true
//!
//! [develop]
//! debounce_ms = 300
//! ```
//!
//! Every relative path is resolved against the project root, and CLI flags
//! take precedence over the file.

mod build;
pub mod defaults;
mod develop;
mod error;

pub use error::ConfigError;

use build::BuildConfig;
use develop::DevelopConfig;

use crate::cli::Cli;
use crate::log;
use anyhow::{Result, bail};
use educe::Educe;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing folio.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file, set after loading.
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub develop: DevelopConfig,
}

impl SiteConfig {
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Read the config named on the command line, apply CLI overrides and validate.
    ///
    /// A missing config file is not an error: defaults are used instead.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            log!("warn"; "{} not found, using defaults", config_path.display());
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.templates, cli.templates.as_ref());
        Self::update_option(&mut self.build.database, cli.database.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        let args = cli.build_args();
        if args.clean {
            self.build.clean = true;
        }
        Self::update_option(&mut self.build.workers, args.workers.as_ref());

        self.update_path_with_root(&root, &cli.config);

        // relative to where folio was invoked, like any other CLI path
        if let Some(progress) = &args.write_progress {
            self.build.progress = Some(Self::normalize_path(progress));
        }
    }

    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    fn update_path_with_root(&mut self, root: &Path, config: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config));
        self.build.templates = Self::normalize_path(&root.join(&self.build.templates));
        self.build.database = Self::normalize_path(&root.join(&self.build.database));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));

        for path in [&mut self.build.links, &mut self.build.progress]
            .into_iter()
            .flatten()
        {
            *path = Self::normalize_path(&root.join(&*path));
        }
    }

    /// Absolute form of `path`, canonical when it exists.
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.build.templates.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.templates] `{}` is not a directory",
                self.build.templates.display()
            )));
        }
        if !self.build.database.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.database] `{}` is not a directory",
                self.build.database.display()
            )));
        }

        if self.build.languages.is_empty() {
            bail!(ConfigError::Validation(
                "[build.languages] must not be empty".into()
            ));
        }
        let mut seen = FxHashSet::default();
        for language in &self.build.languages {
            if language.trim().is_empty() {
                bail!(ConfigError::Validation(
                    "[build.languages] contains an empty language code".into()
                ));
            }
            if !seen.insert(language.as_str()) {
                bail!(ConfigError::Validation(format!(
                    "[build.languages] lists `{language}` twice"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn parse_cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("templates")).unwrap();
        fs::create_dir(dir.path().join("database")).unwrap();
        dir
    }

    #[test]
    fn test_from_str() {
        let config = SiteConfig::from_str("[build]\nlanguages = [\"en\"]\n").unwrap();
        assert_eq!(config.build.languages, vec!["en"]);
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(SiteConfig::from_str("[build\nlanguages = []").is_err());
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        assert!(SiteConfig::from_str("[serve]\nport = 5277\n").is_err());
    }

    #[test]
    fn test_site_config_default() {
        let config = SiteConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
        assert_eq!(config.build.languages, vec!["fr", "en"]);
        assert_eq!(config.develop.debounce_ms, 300);
    }

    #[test]
    fn test_update_with_cli() {
        let dir = site();
        let root = dir.path().to_str().unwrap();
        let cli = &parse_cli(&[
            "folio", "--root", root, "-o", "public", "build", "--clean", "-w", "3",
        ]);

        let mut config = SiteConfig::from_str("[build]\nlinks = \"links.json\"\n").unwrap();
        config.update_with_cli(cli);

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.get_root(), root);
        assert_eq!(config.build.templates, root.join("templates"));
        assert_eq!(config.build.output, root.join("public"));
        assert_eq!(config.build.links, Some(root.join("links.json")));
        assert_eq!(config.config_path, root.join("folio.toml"));
        assert!(config.build.clean);
        assert_eq!(config.build.workers, 3);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_without_config_file() {
        let dir = site();
        let cli = &parse_cli(&["folio", "--root", dir.path().to_str().unwrap(), "build"]);
        let config = SiteConfig::load(cli).unwrap();
        assert_eq!(config.build.languages, vec!["fr", "en"]);
    }

    #[test]
    fn test_load_with_config_file() {
        let dir = site();
        fs::write(
            dir.path().join("folio.toml"),
            "[build]\nlanguages = [\"en\"]\nemit_data = true\n",
        )
        .unwrap();
        let cli = &parse_cli(&["folio", "--root", dir.path().to_str().unwrap(), "build"]);
        let config = SiteConfig::load(cli).unwrap();
        assert_eq!(config.build.languages, vec!["en"]);
        assert!(config.build.emit_data);
    }

    #[test]
    fn test_validate_languages() {
        let dir = site();
        let cli = &parse_cli(&["folio", "--root", dir.path().to_str().unwrap(), "build"]);

        let mut config = SiteConfig::from_str("[build]\nlanguages = []\n").unwrap();
        config.update_with_cli(cli);
        assert!(config.validate().is_err());

        let mut config = SiteConfig::from_str("[build]\nlanguages = [\"fr\", \"fr\"]\n").unwrap();
        config.update_with_cli(cli);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("twice"));
    }

    #[test]
    fn test_validate_missing_directories() {
        let dir = TempDir::new().unwrap();
        let cli = &parse_cli(&["folio", "--root", dir.path().to_str().unwrap(), "build"]);
        let mut config = SiteConfig::default();
        config.update_with_cli(cli);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[build.templates]"));
    }
}
