//! `cartographer run` and `cartographer once`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use cartographer_sync::{CycleReport, CycleScope, IntentStatus};

/// Run the reconcile-sleep loop until ctrl-c.
pub fn run(root: &Path) -> Result<()> {
    cartographer_daemon::start_blocking(root).context("cartographer runner failed")
}

/// Arguments for `cartographer once`.
#[derive(Args, Debug)]
pub struct OnceArgs {
    /// Only reconcile the app with this file name (without extension).
    #[arg(long)]
    pub app: Option<String>,

    /// Emit the cycle report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl OnceArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let scope = self.app.map_or(CycleScope::All, CycleScope::App);
        let report = cartographer_daemon::run_once_blocking(root, scope)
            .context("cartographer once failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
        } else {
            print_report(&report);
        }

        if !report.is_clean() {
            bail!(
                "{} app(s) and {} pull request(s) failed",
                report.failed_apps(),
                report.failed_intents()
            );
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "app")]
    app: String,
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "destination")]
    destination: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "result")]
    result: String,
}

fn print_report(report: &CycleReport) {
    println!(
        "Cartographer v{} | {} apps | {} created | {} skipped | {} failed",
        env!("CARGO_PKG_VERSION"),
        report.apps.len(),
        report.created(),
        report.skipped(),
        report.failed_intents() + report.failed_apps(),
    );

    let mut rows = Vec::new();
    for app in &report.apps {
        if let Some(error) = &app.error {
            println!("{} {}: {}", "✗".red().bold(), app.app.bold(), error);
            continue;
        }
        for intent in &app.intents {
            rows.push(ReportRow {
                app: app.app.clone(),
                source: intent.source.to_string(),
                destination: intent.destination.to_string(),
                branch: intent.commit_branch.clone(),
                result: status_label(&intent.status),
            });
        }
    }

    if rows.is_empty() {
        println!("Nothing to propose.");
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn status_label(status: &IntentStatus) -> String {
    match status {
        IntentStatus::Created { number, url } if url.is_empty() => {
            format!("{} #{number}", "created".green())
        }
        IntentStatus::Created { url, .. } => format!("{} {url}", "created".green()),
        IntentStatus::SkippedExisting { number } => {
            format!("{} #{number}", "already open".bright_black())
        }
        IntentStatus::Failed { error } => format!("{} {error}", "failed".red()),
    }
}
