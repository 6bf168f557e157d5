//! `cartographer check`: validate app files without network access.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use cartographer_core::apps::{list_app_files_at, load_app_at};
use cartographer_core::Settings;

/// Arguments for `cartographer check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Only print invalid apps.
    #[arg(long, short)]
    pub quiet: bool,
}

impl CheckArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let settings = Settings::load_at(root).context("failed to load settings")?;
        let files = list_app_files_at(&settings.apps_dir).with_context(|| {
            format!("cannot read apps directory {}", settings.apps_dir.display())
        })?;

        let mut invalid = 0usize;
        for file in &files {
            match load_app_at(&file.path) {
                Ok(app) => {
                    if !self.quiet {
                        println!(
                            "{} {} ({} sources, {} destinations, {} pairings)",
                            "✓".green().bold(),
                            file.name,
                            app.sources.len(),
                            app.destinations.len(),
                            app.pairings().len()
                        );
                    }
                }
                Err(err) => {
                    invalid += 1;
                    println!("{} {}: {}", "✗".red().bold(), file.name, err);
                }
            }
        }

        if files.is_empty() && !self.quiet {
            println!("No app files in {}.", settings.apps_dir.display());
        }
        if invalid > 0 {
            bail!("{invalid} of {} app file(s) invalid", files.len());
        }
        Ok(())
    }
}
