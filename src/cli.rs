//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// folio: build a portfolio site from a works database and dynamic templates
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to the root
    #[arg(short = 'C', long, default_value = "folio.toml")]
    pub config: PathBuf,

    /// Templates directory (relative to project root)
    #[arg(short, long)]
    pub templates: Option<PathBuf>,

    /// Database directory (relative to project root)
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Output directory (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments shared by `build` and `develop`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Delete the output directory before building
    #[arg(long)]
    pub clean: bool,

    /// Number of render threads, 0 for one per CPU
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Write build progress as JSON to this file
    #[arg(long = "write-progress", value_name = "FILE")]
    pub write_progress: Option<PathBuf>,

    /// Only print warnings and errors
    #[arg(short, long)]
    pub silent: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render every template for every matching object and language
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build, then rebuild whenever templates, database or config change
    Develop {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

impl Cli {
    pub const fn build_args(&self) -> &BuildArgs {
        match &self.command {
            Commands::Build { build_args } | Commands::Develop { build_args } => build_args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from([
            "folio",
            "--root",
            "site",
            "-t",
            "pages",
            "build",
            "--clean",
            "--workers",
            "4",
            "--write-progress",
            "progress.json",
        ])
        .unwrap();

        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.templates, Some(PathBuf::from("pages")));
        assert_eq!(cli.config, PathBuf::from("folio.toml"));
        assert!(matches!(cli.command, Commands::Build { .. }));

        let args = cli.build_args();
        assert!(args.clean);
        assert_eq!(args.workers, Some(4));
        assert_eq!(args.write_progress, Some(PathBuf::from("progress.json")));
        assert!(!args.silent);
    }

    #[test]
    fn test_parse_develop() {
        let cli = Cli::try_parse_from(["folio", "-C", "site.toml", "develop", "--silent"]).unwrap();
        assert!(matches!(cli.command, Commands::Develop { .. }));
        assert!(cli.build_args().silent);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["folio"]).is_err());
    }
}
