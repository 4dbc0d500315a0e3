//! ---
//! plansmith_section: "04-authoring-orchestration"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "SSP authoring orchestration over the relationship index."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
use std::path::PathBuf;

/// Only exit code the filter entry point reports on success.
pub const SUCCESS_EXIT_CODE: i32 = 0;

/// Markdown to model assembly request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleRequest {
    /// Artifact being assembled.
    pub name: String,
    /// Output model name.
    pub output: String,
    /// Markdown directory holding the edited artifact.
    pub markdown_dir: PathBuf,
    /// Whether the engine should regenerate identifiers.
    pub regenerate: bool,
    /// Version stamped into the assembled model. Empty leaves it unchanged.
    pub version: String,
    /// Comma-joined component definition names.
    pub compdefs: String,
}

/// Model to markdown generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Markdown output directory for the artifact.
    pub output: PathBuf,
    /// Whether existing markdown is overwritten.
    pub force_overwrite: bool,
    /// Header customization file. Empty means the default header.
    pub yaml_header: String,
    /// Whether header values already present in markdown are overwritten.
    pub overwrite_header_values: bool,
    /// Comma-joined component definition names.
    pub compdefs: String,
    /// Profile providing the requirements.
    pub profile: String,
    /// Leveraged artifact. Empty means no inheritance.
    pub leveraged_ssp: String,
    /// Whether every content section is generated.
    pub include_all_parts: bool,
}

/// Filtering request producing a derived artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    /// Source artifact.
    pub ssp_name: String,
    /// Profile restricting the controls kept, if any.
    pub profile: Option<String>,
    /// Derived artifact name.
    pub output: String,
    /// Whether the engine should regenerate identifiers.
    pub regenerate: bool,
    /// Component titles to keep. `None` keeps all of them.
    pub components: Option<Vec<String>>,
    /// Version stamped into the derived artifact.
    pub version: String,
    /// Implementation statuses to keep.
    pub implementation_status: Option<Vec<String>>,
    /// Control originations to keep.
    pub control_origination: Option<Vec<String>>,
}

/// Error raised by an authoring engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine could not be started.
    #[error("unable to launch {program}: {source}")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The engine terminated without an exit code.
    #[error("{program} terminated abnormally: {detail}")]
    Terminated {
        /// Program that terminated.
        program: String,
        /// Captured diagnostics.
        detail: String,
    },
    /// The engine exited unsuccessfully and explained why on stderr.
    #[error("{program} exited with code {code}: {stderr}")]
    Exited {
        /// Program that exited.
        program: String,
        /// Exit code it reported.
        code: i32,
        /// Captured diagnostics.
        stderr: String,
    },
    /// A request value cannot be expressed on the engine's command line.
    #[error("{flag} value `{value}` contains the reserved separator `{separator}`")]
    Unrepresentable {
        /// Flag the value was destined for.
        flag: &'static str,
        /// Offending value.
        value: String,
        /// Separator the value collides with.
        separator: &'static str,
    },
    /// Domain failure reported by the engine.
    #[error("{0}")]
    Domain(String),
}

/// Document generation engine the orchestrator delegates to.
///
/// Calls block until the engine finishes. An `Ok(false)` (or a non-success
/// exit code from [`filter`](Self::filter)) means the engine failed without
/// raising; the orchestrator treats it as a failure all the same.
pub trait AuthoringEngine {
    /// Assemble markdown into a model.
    fn assemble(&self, request: &AssembleRequest) -> Result<bool, EngineError>;

    /// Generate markdown from a profile and component definitions.
    fn generate(&self, request: &GenerateRequest) -> Result<bool, EngineError>;

    /// Produce a filtered copy of an artifact, returning the engine exit code.
    fn filter(&self, request: &FilterRequest) -> Result<i32, EngineError>;
}

impl<E: AuthoringEngine + ?Sized> AuthoringEngine for &E {
    fn assemble(&self, request: &AssembleRequest) -> Result<bool, EngineError> {
        (**self).assemble(request)
    }

    fn generate(&self, request: &GenerateRequest) -> Result<bool, EngineError> {
        (**self).generate(request)
    }

    fn filter(&self, request: &FilterRequest) -> Result<i32, EngineError> {
        (**self).filter(request)
    }
}
