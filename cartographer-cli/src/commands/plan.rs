//! `cartographer plan`: fetch and diff, then print the pull requests a
//! cycle would propose.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use cartographer_core::settings::load_token_at;
use cartographer_core::Settings;
use cartographer_sync::{plan_cycle, staging, AppPlan, CommitIdentity, CycleScope, GitFetcher};

/// Arguments for `cartographer plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Only plan the app with this file name (without extension).
    #[arg(long)]
    pub app: Option<String>,

    /// Emit the planned intents as JSON.
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let settings = Settings::load_at(root).context("failed to load settings")?;
        cartographer_daemon::init_tracing(settings.log_format);

        // Private repositories need the token; public ones plan fine without.
        let fetcher = match load_token_at(&settings.token_path) {
            Ok(token) => GitFetcher::default().with_token(token),
            Err(_) => GitFetcher::default(),
        };
        let scope = self.app.map_or(CycleScope::All, CycleScope::App);

        staging::wipe(&settings.staging_dir).context("failed to clean staging directory")?;
        let plans = plan_cycle(
            &settings.apps_dir,
            &settings.staging_dir,
            &scope,
            &fetcher,
            &CommitIdentity::from(&settings),
        );
        let _ = staging::wipe(&settings.staging_dir);
        let plans = plans.context("planning failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&plans).context("failed to serialize plan")?
            );
        } else {
            print_plans(&plans);
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "app")]
    app: String,
    #[tabled(rename = "source → destination")]
    pairing: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "base")]
    base: String,
    #[tabled(rename = "files")]
    files: String,
}

fn print_plans(plans: &[AppPlan]) {
    if plans.is_empty() {
        println!("No apps found.");
        return;
    }

    let mut rows = Vec::new();
    for plan in plans {
        if let Some(error) = &plan.error {
            println!("{} {}: {}", "✗".red().bold(), plan.app.bold(), error);
            continue;
        }
        if plan.intents.is_empty() {
            println!("{} {}: up to date", "✓".green().bold(), plan.app.bold());
        }
        for intent in &plan.intents {
            rows.push(PlanRow {
                app: plan.app.clone(),
                pairing: format!("{} → {}", intent.source, intent.destination),
                branch: intent.commit_branch.clone(),
                base: intent
                    .base_branch
                    .clone()
                    .unwrap_or_else(|| "(unset)".yellow().to_string()),
                files: intent
                    .source_files
                    .iter()
                    .map(|f| f.target.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            });
        }
    }

    if !rows.is_empty() {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
}
