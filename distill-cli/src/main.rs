//! Distill CLI
//!
//! Operational surface for the consolidation engine:
//!
//! - `distill run` — execute a consolidation pass
//! - `distill rollback` — undo a prior run from its snapshots
//! - `distill runs` — list audit records
//! - `distill validate` — re-check post-run invariants

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod error;

pub use error::CliExitCode;

#[derive(Parser)]
#[command(name = "distill")]
#[command(version)]
#[command(about = "Knowledge base consolidation for interview-extracted entities")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the SQLite database.
    #[arg(long, global = true, default_value = "distill.db")]
    db: PathBuf,

    /// Optional TOML config file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a consolidation pass.
    Run(commands::run::RunArgs),
    /// Undo a prior run, restoring pre-merge entities from snapshots.
    Rollback(commands::rollback::RollbackArgs),
    /// List consolidation runs.
    Runs,
    /// Re-check post-run invariants against current state.
    Validate(commands::validate::ValidateArgs),
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Run(args) => commands::run::execute(args, &cli.db, cli.config.as_deref()),
        Commands::Rollback(args) => commands::rollback::execute(args, &cli.db),
        Commands::Runs => commands::runs::execute(&cli.db),
        Commands::Validate(args) => commands::validate::execute(args, &cli.db),
    };

    std::process::exit(exit_code.code());
}
