//! ghkit: workspace snapshots for project boards and repositories.
//!
//! # Usage
//!
//! ```text
//! ghkit init <login> [--kind user|org] [--project N]... [--repo NAME]...
//! ghkit refresh <login> [--scope all|projects|repositories]
//! ghkit status <login> [--max-age-days N] [--json]
//! ghkit diff <login> [--scope ...] [--unified]
//! ghkit items <login> <number> [--kind user|org] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, init::InitArgs, items::ItemsArgs, refresh::RefreshArgs, status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ghkit",
    version,
    about = "Snapshot and reconcile a workspace's projects, fields and repositories",
    long_about = None,
)]
struct Cli {
    /// Log progress to stderr (-v info, -vv debug). `GHKIT_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the first snapshot of a workspace.
    Init(InitArgs),

    /// Re-fetch the snapshotted projects and repositories and report drift.
    Refresh(RefreshArgs),

    /// Show how old the snapshot is.
    Status(StatusArgs),

    /// Report drift without writing anything.
    Diff(DiffArgs),

    /// List every item on a project board.
    Items(ItemsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Refresh(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Items(args) => args.run(),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("GHKIT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
