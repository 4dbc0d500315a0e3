//! ---
//! plansmith_section: "05-control-cli"
//! plansmith_subsection: "binary"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Control CLI for administrators of Plansmith workspaces."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
use std::path::Path;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Subcommand};
use plansmith_authoring::{FilterArtifact, NewArtifact};

use crate::session::Session;

/// SSP authoring commands.
#[derive(Debug, Subcommand)]
pub enum SspCommand {
    /// Validate, record and generate a new SSP.
    Create(CreateCommand),
    /// Regenerate markdown for a recorded SSP.
    Regenerate(NameArgs),
    /// Assemble edited markdown back into the SSP model.
    Assemble(AssembleCommand),
    /// Derive a new SSP by filtering an existing one.
    Filter(FilterCommand),
}

#[derive(Debug, Args)]
pub struct CreateCommand {
    /// Name of the new SSP.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// Profile the SSP's requirements come from.
    #[arg(long, value_name = "PROFILE")]
    profile: String,
    /// Component definition, repeatable and kept in order.
    #[arg(long = "component", value_name = "COMPDEF", required = true)]
    components: Vec<String>,
    /// SSP to inherit implementations from.
    #[arg(long = "leveraged-ssp", value_name = "NAME")]
    leveraged: Option<String>,
    /// Header customization file.
    #[arg(long = "yaml-header", value_name = "FILE")]
    header: Option<String>,
}

#[derive(Debug, Args)]
pub struct NameArgs {
    /// SSP name.
    #[arg(value_name = "NAME")]
    name: String,
}

#[derive(Debug, Args)]
pub struct AssembleCommand {
    /// SSP name; its markdown is read from the configured markdown directory.
    #[arg(value_name = "NAME")]
    name: String,
    /// Version stamped into the assembled model.
    #[arg(long = "version", value_name = "VERSION", default_value = "")]
    version: String,
}

#[derive(Debug, Args)]
pub struct FilterCommand {
    /// Name of the derived SSP.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// SSP being filtered.
    #[arg(long, value_name = "NAME")]
    source: String,
    /// Profile restricting the retained controls.
    #[arg(long, value_name = "PROFILE")]
    profile: Option<String>,
    /// Component definition whose components are retained, repeatable.
    #[arg(long = "component", value_name = "COMPDEF")]
    components: Vec<String>,
    /// Retain only the main system component.
    #[arg(long = "main-component-only", action = ArgAction::SetTrue)]
    main_component_only: bool,
    /// Version stamped into the derived SSP.
    #[arg(long = "version", value_name = "VERSION", default_value = "")]
    version: String,
    /// Implementation status to retain, repeatable.
    #[arg(long = "implementation-status", value_name = "STATUS")]
    implementation_status: Vec<String>,
    /// Control origination to retain, repeatable.
    #[arg(long = "control-origination", value_name = "ORIGIN")]
    control_origination: Vec<String>,
}

impl FilterCommand {
    fn artifact(self) -> FilterArtifact {
        let mut artifact = FilterArtifact::new(self.name, self.source).with_version(self.version);
        if let Some(profile) = self.profile {
            artifact = artifact.with_profile(profile);
        }
        if !self.components.is_empty() {
            artifact = artifact.with_components(self.components);
        }
        if self.main_component_only {
            artifact = artifact.main_component_only();
        }
        if !self.implementation_status.is_empty() {
            artifact = artifact.with_implementation_status(self.implementation_status);
        }
        if !self.control_origination.is_empty() {
            artifact = artifact.with_control_origination(self.control_origination);
        }
        artifact
    }
}

/// Execute the supplied SSP command.
pub fn run(command: SspCommand, session: &Session) -> Result<()> {
    match command {
        SspCommand::Create(cmd) => {
            let mut authoring = session.authoring()?;
            let mut artifact = NewArtifact::new(cmd.name, cmd.profile, cmd.components);
            if let Some(leveraged) = cmd.leveraged {
                artifact = artifact.with_leveraged(leveraged);
            }
            if let Some(header) = cmd.header {
                artifact = artifact.with_header_override(header);
            }
            authoring
                .create_new(&artifact, &session.markdown_root()?)
                .with_context(|| format!("unable to create SSP {}", artifact.name))?;
            println!("Created {}", artifact.name);
        }
        SspCommand::Regenerate(cmd) => {
            let authoring = session.authoring()?;
            authoring
                .regenerate(Path::new(&cmd.name), &session.markdown_root()?)
                .with_context(|| format!("unable to regenerate SSP {}", cmd.name))?;
            println!("Regenerated {}", cmd.name);
        }
        SspCommand::Assemble(cmd) => {
            let authoring = session.authoring()?;
            let markdown = session.markdown_root()?.join(&cmd.name);
            authoring
                .assemble(&markdown, &cmd.version)
                .with_context(|| format!("unable to assemble SSP {}", cmd.name))?;
            println!("Assembled {}", cmd.name);
        }
        SspCommand::Filter(cmd) => {
            let authoring = session.authoring()?;
            let artifact = cmd.artifact();
            authoring
                .create_filtered(&artifact)
                .with_context(|| format!("unable to filter SSP {}", artifact.source))?;
            println!("Created {} from {}", artifact.name, artifact.source);
        }
    }
    Ok(())
}
