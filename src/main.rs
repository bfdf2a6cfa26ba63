//! folio - A static site generator for portfolios.

mod build;
mod cli;
mod config;
mod data;
mod enumerate;
mod expr;
mod hydration;
mod layout;
mod links;
mod logger;
mod paths;
mod progress;
mod render;
mod utils;
mod watch;

use anyhow::{Result, bail};
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use watch::develop;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    logger::set_silent(cli.build_args().silent);
    let config = SiteConfig::load(cli)?;

    match &cli.command {
        Commands::Build { .. } => {
            let report = build_site(&config)?;
            if report.failed() > 0 {
                bail!("{} of {} pages failed", report.failed(), report.built() + report.failed());
            }
            Ok(())
        }
        Commands::Develop { .. } => develop(cli, config),
    }
}
