//! Cartographer: propose missing files across repositories as pull requests.
//!
//! # Usage
//!
//! ```text
//! cartographer [--root <dir>]                  (same as `run`)
//! cartographer run                             reconcile every interval until ctrl-c
//! cartographer once [--app <name>] [--json]    one cycle, then exit
//! cartographer plan [--app <name>] [--json]    fetch and diff only, no pull requests
//! cartographer check                           validate app files offline
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, plan::PlanArgs, run::OnceArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "cartographer",
    version,
    about = "Keep declared files in sync across repositories via pull requests",
    long_about = None,
)]
struct Cli {
    /// Directory holding `cartographer.yaml`, `apps/` and `secret/token`.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile every app, sleep, repeat until ctrl-c.
    Run,

    /// Run a single reconciliation cycle and print its report.
    Once(OnceArgs),

    /// Show the pull requests a cycle would propose without opening them.
    Plan(PlanArgs),

    /// Load and validate every app file without touching the network.
    Check(CheckArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(&cli.root),
        Commands::Once(args) => args.run(&cli.root),
        Commands::Plan(args) => args.run(&cli.root),
        Commands::Check(args) => args.run(&cli.root),
    }
}
