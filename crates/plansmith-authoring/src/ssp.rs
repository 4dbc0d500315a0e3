//! ---
//! plansmith_section: "04-authoring-orchestration"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "SSP authoring orchestration over the relationship index."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
//! System security plan orchestration.
//!
//! Every operation resolves its inputs from the relationship index and the
//! workspace first, then hands a fully populated request to the engine. An
//! engine failure is always surfaced as
//! [`AuthoringError::OrchestrationFailure`] naming the artifact.

use std::path::Path;

use indexmap::IndexSet;
use plansmith_index::{IndexEntry, RelationshipIndex};
use plansmith_logging::{
    authoring_debug, authoring_info, log_operation, LogContext, OperationOutcome,
};

use crate::engine::{
    AssembleRequest, AuthoringEngine, EngineError, FilterRequest, GenerateRequest,
    SUCCESS_EXIT_CODE,
};
use crate::metrics::AuthoringMetrics;
use crate::workspace::{is_plain_name, ComponentDefinition, ModelKind, Workspace, WorkspaceError};
use crate::{AuthoringError, Operation, Result};

/// Title of the component representing the system itself.
///
/// Filtering by component always keeps it, so the derived plan retains the
/// system-level implementation statements.
pub const MAIN_COMPONENT_TITLE: &str = "This System";

/// Inputs for registering and generating a new artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArtifact {
    /// Artifact name.
    pub name: String,
    /// Profile the artifact's requirements come from.
    pub profile: String,
    /// Component definitions, in order.
    pub components: Vec<String>,
    /// Artifact to inherit implementations from.
    pub leveraged: Option<String>,
    /// Header customization file.
    pub header_override: Option<String>,
}

impl NewArtifact {
    /// Artifact without inheritance or header customization.
    pub fn new(
        name: impl Into<String>,
        profile: impl Into<String>,
        components: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            profile: profile.into(),
            components: components.into_iter().map(Into::into).collect(),
            leveraged: None,
            header_override: None,
        }
    }

    /// Inherit implementations from `leveraged`.
    pub fn with_leveraged(mut self, leveraged: impl Into<String>) -> Self {
        self.leveraged = Some(leveraged.into());
        self
    }

    /// Merge `header` into generated output.
    pub fn with_header_override(mut self, header: impl Into<String>) -> Self {
        self.header_override = Some(header.into());
        self
    }

    /// Index entry recording these inputs.
    pub fn to_entry(&self) -> IndexEntry {
        IndexEntry::new(&self.name, &self.profile, &self.components)
            .with_leveraged(self.leveraged.clone())
            .with_header_override(self.header_override.clone())
    }
}

/// Inputs for deriving an artifact by filtering an existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterArtifact {
    /// Derived artifact name.
    pub name: String,
    /// Artifact being filtered.
    pub source: String,
    /// Profile restricting the retained controls.
    pub profile: Option<String>,
    /// Version stamped into the derived artifact.
    pub version: String,
    /// Component definitions whose components are retained.
    pub components: Option<Vec<String>>,
    /// Retain only the main component when no definitions are given.
    pub main_component_only: bool,
    /// Implementation statuses to retain.
    pub implementation_status: Option<Vec<String>>,
    /// Control originations to retain.
    pub control_origination: Option<Vec<String>>,
}

impl FilterArtifact {
    /// Derive `name` from `source`, retaining everything.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            ..Self::default()
        }
    }

    /// Restrict retained controls to `profile`.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Stamp `version` into the derived artifact.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Retain the components defined by `components`.
    pub fn with_components(mut self, components: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.components = Some(components.into_iter().map(Into::into).collect());
        self
    }

    /// Retain only the main component.
    pub fn main_component_only(mut self) -> Self {
        self.main_component_only = true;
        self
    }

    /// Retain controls with the given implementation statuses.
    pub fn with_implementation_status(
        mut self,
        statuses: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.implementation_status = Some(statuses.into_iter().map(Into::into).collect());
        self
    }

    /// Retain controls with the given originations.
    pub fn with_control_origination(
        mut self,
        origins: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.control_origination = Some(origins.into_iter().map(Into::into).collect());
        self
    }
}

/// Orchestrates SSP authoring over a relationship index, a workspace and an
/// authoring engine.
#[derive(Debug)]
pub struct SspAuthoring<W, E> {
    workspace: W,
    engine: E,
    index: RelationshipIndex,
    context: LogContext,
    metrics: Option<AuthoringMetrics>,
}

impl<W: Workspace, E: AuthoringEngine> SspAuthoring<W, E> {
    /// Orchestrator over an already opened index.
    pub fn new(workspace: W, engine: E, index: RelationshipIndex, context: LogContext) -> Self {
        Self {
            workspace,
            engine,
            index,
            context,
            metrics: None,
        }
    }

    /// Publish operation counters to `metrics`.
    pub fn with_metrics(mut self, metrics: AuthoringMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Relationship index consulted by every operation.
    pub fn index(&self) -> &RelationshipIndex {
        &self.index
    }

    /// Mutable access to the relationship index.
    pub fn index_mut(&mut self) -> &mut RelationshipIndex {
        &mut self.index
    }

    /// Workspace models are resolved against.
    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    /// Engine performing the document work.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Assemble the markdown at `markdown_path` back into its model.
    ///
    /// The artifact name is the final component of `markdown_path`.
    pub fn assemble(&self, markdown_path: &Path, version: &str) -> Result<()> {
        let operation = Operation::Assemble;
        let name = artifact_name(markdown_path)?;
        let result = self.assemble_named(&name, markdown_path, version);
        self.observe(operation, &name, result)
    }

    /// Regenerate markdown for the model at `model_path` under `markdown_root`.
    pub fn regenerate(&self, model_path: &Path, markdown_root: &Path) -> Result<()> {
        let operation = Operation::Regenerate;
        let name = artifact_name(model_path)?;
        let result = self.generate_named(operation, &name, markdown_root);
        self.observe(operation, &name, result)
    }

    /// Validate, record and generate a new artifact.
    ///
    /// Nothing is written to the index unless the profile and every component
    /// definition resolve in the workspace. An identical existing entry is
    /// left as is. If generation fails after the entry was persisted, the
    /// entry stays; re-running [`regenerate`](Self::regenerate) recovers.
    pub fn create_new(&mut self, artifact: &NewArtifact, markdown_root: &Path) -> Result<()> {
        let operation = Operation::CreateNew;
        let result = self.create_new_inner(artifact, markdown_root);
        self.observe(operation, &artifact.name, result)
    }

    /// Derive a new artifact by filtering an existing one.
    ///
    /// The derived artifact is not recorded in the index.
    pub fn create_filtered(&self, artifact: &FilterArtifact) -> Result<()> {
        let operation = Operation::CreateFiltered;
        let result = self.create_filtered_inner(artifact);
        self.observe(operation, &artifact.source, result)
    }

    fn assemble_named(&self, name: &str, markdown_path: &Path, version: &str) -> Result<()> {
        let compdefs = self.index.lookup_components(name)?.join(",");
        let request = AssembleRequest {
            name: name.to_owned(),
            output: name.to_owned(),
            markdown_dir: markdown_path.to_path_buf(),
            regenerate: false,
            version: version.to_owned(),
            compdefs,
        };
        authoring_debug!(
            context = self.context.scoped(Operation::Assemble.as_str(), name),
            "assembling {} with component definitions {}",
            markdown_path.display(),
            request.compdefs
        );
        completed(Operation::Assemble, name, self.engine.assemble(&request))
    }

    fn generate_named(&self, operation: Operation, name: &str, markdown_root: &Path) -> Result<()> {
        let compdefs = self.index.lookup_components(name)?.join(",");
        let profile = self.index.lookup_profile(name)?.to_owned();
        let request = GenerateRequest {
            output: markdown_root.join(name),
            force_overwrite: false,
            yaml_header: self
                .index
                .lookup_header_override(name)
                .unwrap_or_default()
                .to_owned(),
            overwrite_header_values: false,
            compdefs,
            profile,
            leveraged_ssp: self
                .index
                .lookup_leveraged(name)
                .unwrap_or_default()
                .to_owned(),
            include_all_parts: true,
        };
        authoring_debug!(
            context = self.context.scoped(operation.as_str(), name),
            "generating markdown into {} from profile {}",
            request.output.display(),
            request.profile
        );
        completed(operation, name, self.engine.generate(&request))
    }

    fn create_new_inner(&mut self, artifact: &NewArtifact, markdown_root: &Path) -> Result<()> {
        let operation = Operation::CreateNew;
        if !is_plain_name(&artifact.name) {
            return Err(AuthoringError::InvalidReference {
                reference: artifact.name.clone(),
            });
        }
        if artifact.components.is_empty() {
            return Err(AuthoringError::NoComponents {
                artifact: artifact.name.clone(),
            });
        }
        self.require(ModelKind::Profile, &artifact.profile)?;
        for component in &artifact.components {
            self.require(ModelKind::ComponentDefinition, component)?;
        }

        let entry = artifact.to_entry();
        let context = self.context.scoped(operation.as_str(), &artifact.name);
        if self.index.entry(&artifact.name) == Some(&entry) {
            log_operation(
                &context,
                operation.as_str(),
                "index already records these inputs; skipping persist",
                OperationOutcome::Skipped,
            );
        } else {
            let previous = self.index.add(entry);
            if let Err(err) = self.index.write_out() {
                // memory must not run ahead of the store
                match previous {
                    Some(previous) => {
                        self.index.add(previous);
                    }
                    None => {
                        self.index.remove(&artifact.name);
                    }
                }
                return Err(err.into());
            }
            authoring_info!(context = context, "recorded {} in the index", artifact.name);
        }

        self.generate_named(operation, &artifact.name, markdown_root)
    }

    fn create_filtered_inner(&self, artifact: &FilterArtifact) -> Result<()> {
        let operation = Operation::CreateFiltered;
        if let Some(profile) = artifact.profile.as_deref().filter(|p| !p.is_empty()) {
            self.require(ModelKind::Profile, profile)?;
        }
        let components = self.retained_titles(artifact)?;
        let request = FilterRequest {
            ssp_name: artifact.source.clone(),
            profile: artifact.profile.clone(),
            output: artifact.name.clone(),
            regenerate: true,
            components,
            version: artifact.version.clone(),
            implementation_status: artifact.implementation_status.clone(),
            control_origination: artifact.control_origination.clone(),
        };
        authoring_debug!(
            context = self.context.scoped(operation.as_str(), &artifact.source),
            "filtering {} into {} retaining components {:?}",
            artifact.source,
            artifact.name,
            request.components
        );
        match self.engine.filter(&request) {
            Ok(SUCCESS_EXIT_CODE) => Ok(()),
            Ok(code) => Err(AuthoringError::engine(
                operation,
                &artifact.source,
                format!("authoring engine exited with code {code}"),
            )),
            Err(err) => Err(engine_failure(operation, &artifact.source, err)),
        }
    }

    fn retained_titles(&self, artifact: &FilterArtifact) -> Result<Option<Vec<String>>> {
        match artifact.components.as_deref() {
            Some(names) if !names.is_empty() => {
                let mut titles = IndexSet::new();
                titles.insert(MAIN_COMPONENT_TITLE.to_owned());
                for name in names {
                    let (compdef, _) = self
                        .workspace
                        .load::<ComponentDefinition>(name)
                        .map_err(|err| reference_error(ModelKind::ComponentDefinition, name, err))?;
                    titles.extend(compdef.component_titles().map(str::to_owned));
                }
                Ok(Some(titles.into_iter().collect()))
            }
            _ if artifact.main_component_only => Ok(Some(vec![MAIN_COMPONENT_TITLE.to_owned()])),
            _ => Ok(None),
        }
    }

    fn require(&self, kind: ModelKind, name: &str) -> Result<()> {
        match self.workspace.resolve_path(name, kind) {
            Some(_) => Ok(()),
            None => Err(AuthoringError::ReferenceNotFound {
                kind,
                name: name.to_owned(),
            }),
        }
    }

    fn observe(&self, operation: Operation, artifact: &str, result: Result<()>) -> Result<()> {
        let context = self.context.scoped(operation.as_str(), artifact);
        if let Some(metrics) = &self.metrics {
            metrics.record_operation(operation);
        }
        match &result {
            Ok(()) => log_operation(
                &context,
                operation.as_str(),
                "operation completed",
                OperationOutcome::Success,
            ),
            Err(err) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(operation, err.kind());
                }
                log_operation(
                    &context,
                    operation.as_str(),
                    &err.to_string(),
                    OperationOutcome::Fault,
                );
            }
        }
        result
    }
}

fn artifact_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| AuthoringError::InvalidReference {
            reference: path.display().to_string(),
        })
}

fn completed(
    operation: Operation,
    artifact: &str,
    outcome: std::result::Result<bool, EngineError>,
) -> Result<()> {
    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthoringError::engine(
            operation,
            artifact,
            "authoring engine reported an unsuccessful run",
        )),
        Err(err) => Err(engine_failure(operation, artifact, err)),
    }
}

fn engine_failure(operation: Operation, artifact: &str, err: EngineError) -> AuthoringError {
    AuthoringError::engine(operation, artifact, err.to_string())
}

fn reference_error(kind: ModelKind, name: &str, err: WorkspaceError) -> AuthoringError {
    match err {
        WorkspaceError::NotFound { .. } => AuthoringError::ReferenceNotFound {
            kind,
            name: name.to_owned(),
        },
        source => AuthoringError::Workspace {
            kind,
            name: name.to_owned(),
            source,
        },
    }
}
