//! ---
//! plansmith_section: "05-control-cli"
//! plansmith_subsection: "binary"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Control CLI for administrators of Plansmith workspaces."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod index;
mod session;
mod ssp;

use session::Session;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Plansmith SSP authoring control utility",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to PLANSMITH_CONFIG, then plansmith.toml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Workspace root, overriding the configured one.
    #[arg(long, global = true, value_name = "DIR")]
    workspace: Option<PathBuf>,
    /// Print collected operation metrics to stderr before exiting.
    #[arg(long, global = true)]
    metrics: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(subcommand, about = "Inspect and edit the relationship index")]
    Index(index::IndexCommand),
    #[command(subcommand, about = "Create, regenerate, assemble and filter SSPs")]
    Ssp(ssp::SspCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let session = Session::load(cli.config.as_deref(), cli.workspace.as_deref())?;
    session.init_logging();

    let result = match cli.command {
        Commands::Index(cmd) => index::run(cmd, &session),
        Commands::Ssp(cmd) => ssp::run(cmd, &session),
    };
    if cli.metrics {
        session.print_metrics()?;
    }
    result
}
