//! ---
//! plansmith_section: "05-control-cli"
//! plansmith_subsection: "binary"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Control CLI for administrators of Plansmith workspaces."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
use anyhow::Result;
use clap::{Args, Subcommand};
use plansmith_index::IndexEntry;

use crate::session::Session;

/// Relationship index commands.
#[derive(Debug, Subcommand)]
pub enum IndexCommand {
    /// List every recorded artifact.
    List(ListCommand),
    /// Show the generation inputs recorded for one artifact.
    Show(ShowCommand),
    /// Record generation inputs without checking them against the workspace.
    Add(AddCommand),
}

#[derive(Debug, Args)]
pub struct ListCommand {
    /// Emit JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Artifact name.
    #[arg(value_name = "NAME")]
    name: String,
}

#[derive(Debug, Args)]
pub struct AddCommand {
    /// Artifact name.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Profile the artifact's requirements come from.
    #[arg(long, value_name = "PROFILE")]
    profile: String,
    /// Component definition, repeatable and kept in order.
    #[arg(long = "component", value_name = "COMPDEF", required = true)]
    components: Vec<String>,
    /// Artifact to inherit implementations from.
    #[arg(long = "leveraged-ssp", value_name = "NAME")]
    leveraged: Option<String>,
    /// Header customization file.
    #[arg(long = "yaml-header", value_name = "FILE")]
    header: Option<String>,
}

/// Execute the supplied index command.
pub fn run(command: IndexCommand, session: &Session) -> Result<()> {
    match command {
        IndexCommand::List(cmd) => list(cmd, session),
        IndexCommand::Show(cmd) => show(cmd, session),
        IndexCommand::Add(cmd) => add(cmd, session),
    }
}

fn list(cmd: ListCommand, session: &Session) -> Result<()> {
    let index = session.open_index()?;
    if cmd.json {
        let entries: Vec<&IndexEntry> = index.entries().collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in index.entries() {
        println!("{}\t{}\t{}", entry.name, entry.profile, entry.joined_components());
    }
    Ok(())
}

fn show(cmd: ShowCommand, session: &Session) -> Result<()> {
    let index = session.open_index()?;
    let profile = index.lookup_profile(&cmd.name)?;
    let components = index.lookup_components(&cmd.name)?;
    println!("name: {}", cmd.name);
    println!("profile: {profile}");
    println!("components: {}", components.join(", "));
    println!(
        "leveraged: {}",
        index.lookup_leveraged(&cmd.name).unwrap_or("-")
    );
    println!(
        "header: {}",
        index.lookup_header_override(&cmd.name).unwrap_or("-")
    );
    Ok(())
}

fn add(cmd: AddCommand, session: &Session) -> Result<()> {
    let mut index = session.open_index()?;
    let entry = IndexEntry::new(cmd.name, cmd.profile, cmd.components)
        .with_leveraged(cmd.leveraged)
        .with_header_override(cmd.header);
    let name = entry.name.clone();
    let replaced = index.add(entry).is_some();
    index.write_out()?;
    if replaced {
        println!("Updated {name}");
    } else {
        println!("Recorded {name}");
    }
    Ok(())
}
