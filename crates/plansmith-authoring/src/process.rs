//! ---
//! plansmith_section: "04-authoring-orchestration"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "SSP authoring orchestration over the relationship index."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
//! [`AuthoringEngine`] backed by an external authoring executable.
//!
//! Each call runs `<program> [args..] author <subcommand> <flags..>` in the
//! workspace root and blocks until it exits.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::engine::{
    AssembleRequest, AuthoringEngine, EngineError, FilterRequest, GenerateRequest,
    SUCCESS_EXIT_CODE,
};

/// Separator for component titles; titles may themselves contain commas.
///
/// The engine takes every title in one argument, so a title containing this
/// separator cannot be passed and the filter is refused before launch.
pub const COMPONENT_TITLE_SEPARATOR: &str = ":";
/// Separator for status and origination filters.
pub const LIST_SEPARATOR: &str = ",";

/// Engine that shells out to an authoring CLI.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
    root: PathBuf,
}

#[derive(Debug)]
struct Completed {
    code: i32,
    stderr: String,
}

impl ProcessEngine {
    /// Engine running `program` inside the workspace `root`.
    pub fn new(program: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            root: root.into(),
        }
    }

    /// Arguments placed before the `author` subcommand.
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Workspace root the engine runs in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run(&self, subcommand: &str, flags: Vec<OsString>) -> Result<Completed, EngineError> {
        debug!(program = %self.program, subcommand, ?flags, "invoking authoring engine");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("author")
            .arg(subcommand)
            .args(&flags)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| EngineError::Launch {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        debug!(
            subcommand,
            status = ?output.status,
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            "authoring engine exited"
        );
        match output.status.code() {
            Some(code) => Ok(Completed { code, stderr }),
            None => Err(EngineError::Terminated {
                program: self.program.clone(),
                detail: if stderr.is_empty() {
                    format!("{}", output.status)
                } else {
                    stderr
                },
            }),
        }
    }

    /// Exit code of a run, or the engine's own diagnostics when it failed
    /// and wrote any.
    fn exit_code(&self, completed: Completed) -> Result<i32, EngineError> {
        if completed.code == SUCCESS_EXIT_CODE || completed.stderr.is_empty() {
            return Ok(completed.code);
        }
        Err(EngineError::Exited {
            program: self.program.clone(),
            code: completed.code,
            stderr: completed.stderr,
        })
    }
}

impl AuthoringEngine for ProcessEngine {
    fn assemble(&self, request: &AssembleRequest) -> Result<bool, EngineError> {
        let completed = self.run("ssp-assemble", assemble_flags(request))?;
        Ok(self.exit_code(completed)? == SUCCESS_EXIT_CODE)
    }

    fn generate(&self, request: &GenerateRequest) -> Result<bool, EngineError> {
        let completed = self.run("ssp-generate", generate_flags(request))?;
        Ok(self.exit_code(completed)? == SUCCESS_EXIT_CODE)
    }

    fn filter(&self, request: &FilterRequest) -> Result<i32, EngineError> {
        let completed = self.run("ssp-filter", filter_flags(request)?)?;
        self.exit_code(completed)
    }
}

fn push(flags: &mut Vec<OsString>, flag: &str, value: impl Into<OsString>) {
    flags.push(flag.into());
    flags.push(value.into());
}

fn push_if_set(flags: &mut Vec<OsString>, flag: &str, value: &str) {
    if !value.is_empty() {
        push(flags, flag, value);
    }
}

fn push_switch(flags: &mut Vec<OsString>, flag: &str, enabled: bool) {
    if enabled {
        flags.push(flag.into());
    }
}

fn assemble_flags(request: &AssembleRequest) -> Vec<OsString> {
    let mut flags = Vec::new();
    push(&mut flags, "--markdown", request.markdown_dir.as_os_str());
    push(&mut flags, "--output", request.output.as_str());
    push_if_set(&mut flags, "--compdefs", &request.compdefs);
    push_if_set(&mut flags, "--version", &request.version);
    push_switch(&mut flags, "--regenerate", request.regenerate);
    flags
}

fn generate_flags(request: &GenerateRequest) -> Vec<OsString> {
    let mut flags = Vec::new();
    push(&mut flags, "--profile", request.profile.as_str());
    push_if_set(&mut flags, "--compdefs", &request.compdefs);
    push_if_set(&mut flags, "--leveraged-ssp", &request.leveraged_ssp);
    push(&mut flags, "--output", request.output.as_os_str());
    push_if_set(&mut flags, "--yaml-header", &request.yaml_header);
    push_switch(&mut flags, "--force-overwrite", request.force_overwrite);
    push_switch(
        &mut flags,
        "--overwrite-header-values",
        request.overwrite_header_values,
    );
    push_switch(&mut flags, "--include-all-parts", request.include_all_parts);
    flags
}

fn filter_flags(request: &FilterRequest) -> Result<Vec<OsString>, EngineError> {
    let mut flags = Vec::new();
    push(&mut flags, "--name", request.ssp_name.as_str());
    push(&mut flags, "--output", request.output.as_str());
    if let Some(profile) = &request.profile {
        push_if_set(&mut flags, "--profile", profile);
    }
    if let Some(components) = &request.components {
        if let Some(title) = components
            .iter()
            .find(|title| title.contains(COMPONENT_TITLE_SEPARATOR))
        {
            return Err(EngineError::Unrepresentable {
                flag: "--components",
                value: title.clone(),
                separator: COMPONENT_TITLE_SEPARATOR,
            });
        }
        push(
            &mut flags,
            "--components",
            components.join(COMPONENT_TITLE_SEPARATOR),
        );
    }
    if let Some(statuses) = &request.implementation_status {
        push(&mut flags, "--implementation-status", statuses.join(LIST_SEPARATOR));
    }
    if let Some(origins) = &request.control_origination {
        push(&mut flags, "--control-origination", origins.join(LIST_SEPARATOR));
    }
    push_if_set(&mut flags, "--version", &request.version);
    push_switch(&mut flags, "--regenerate", request.regenerate);
    Ok(flags)
}
