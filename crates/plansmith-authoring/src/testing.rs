//! ---
//! plansmith_section: "04-authoring-orchestration"
//! plansmith_subsection: "test-support"
//! plansmith_type: "source"
//! plansmith_scope: "test"
//! plansmith_description: "Recording engine and workspace fixtures for authoring tests."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
//! Test doubles for the authoring seams.
//!
//! Enabled for this crate's own tests and, through the `testing` feature, for
//! downstream test suites.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::json;

use crate::engine::{AssembleRequest, AuthoringEngine, EngineError, FilterRequest, GenerateRequest};
use crate::workspace::ModelKind;

/// Request observed by a [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// `assemble` call.
    Assemble(AssembleRequest),
    /// `generate` call.
    Generate(GenerateRequest),
    /// `filter` call.
    Filter(FilterRequest),
}

/// Result a [`RecordingEngine`] reports for every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScriptedOutcome {
    /// Report success.
    #[default]
    Success,
    /// Report failure without raising (`false`, or exit code 1 for filter).
    Unsuccessful,
    /// Raise a domain error with the given message.
    Error(String),
}

/// In-memory engine that records requests and replies with a scripted outcome.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    outcome: Mutex<ScriptedOutcome>,
}

impl RecordingEngine {
    /// Engine that succeeds on every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the outcome reported from now on.
    pub fn set_outcome(&self, outcome: ScriptedOutcome) {
        *self.outcome.lock() = outcome;
    }

    /// Every call observed so far, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// Observed assemble requests.
    pub fn assemble_calls(&self) -> Vec<AssembleRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                EngineCall::Assemble(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Observed generate requests.
    pub fn generate_calls(&self) -> Vec<GenerateRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                EngineCall::Generate(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Observed filter requests.
    pub fn filter_calls(&self) -> Vec<FilterRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                EngineCall::Filter(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EngineCall) -> Result<bool, EngineError> {
        self.calls.lock().push(call);
        match &*self.outcome.lock() {
            ScriptedOutcome::Success => Ok(true),
            ScriptedOutcome::Unsuccessful => Ok(false),
            ScriptedOutcome::Error(message) => Err(EngineError::Domain(message.clone())),
        }
    }
}

impl AuthoringEngine for RecordingEngine {
    fn assemble(&self, request: &AssembleRequest) -> Result<bool, EngineError> {
        self.record(EngineCall::Assemble(request.clone()))
    }

    fn generate(&self, request: &GenerateRequest) -> Result<bool, EngineError> {
        self.record(EngineCall::Generate(request.clone()))
    }

    fn filter(&self, request: &FilterRequest) -> Result<i32, EngineError> {
        self.record(EngineCall::Filter(request.clone()))
            .map(|ok| if ok { 0 } else { 1 })
    }
}

/// Write a minimal JSON profile named `name` under `root`.
pub fn write_profile(root: &Path, name: &str) -> io::Result<PathBuf> {
    let document = json!({
        "profile": {
            "uuid": format!("profile-{name}"),
            "metadata": { "title": name, "version": "1.0" },
            "imports": [{ "href": "trestle://catalogs/nist_catalog/catalog.json" }]
        }
    });
    write_model(root, ModelKind::Profile, name, &document)
}

/// Write a JSON component definition named `name` defining `titles` under `root`.
pub fn write_component_definition(root: &Path, name: &str, titles: &[&str]) -> io::Result<PathBuf> {
    let components: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(position, title)| {
            json!({
                "uuid": format!("{name}-component-{position}"),
                "type": "service",
                "title": title,
                "description": format!("{title} provided by {name}")
            })
        })
        .collect();
    let document = json!({
        "component-definition": {
            "uuid": format!("compdef-{name}"),
            "metadata": { "title": name, "version": "1.0" },
            "components": components
        }
    });
    write_model(root, ModelKind::ComponentDefinition, name, &document)
}

fn write_model(
    root: &Path,
    kind: ModelKind,
    name: &str,
    document: &serde_json::Value,
) -> io::Result<PathBuf> {
    let dir = root.join(kind.directory()).join(name);
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.json", kind.stem()));
    fs::write(&path, serde_json::to_vec_pretty(document)?)?;
    Ok(path)
}
