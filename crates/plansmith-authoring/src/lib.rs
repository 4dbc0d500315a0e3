//! ---
//! plansmith_section: "04-authoring-orchestration"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "SSP authoring orchestration over the relationship index."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Authoring orchestration for system security plans.
//!
//! [`SspAuthoring`] validates each request against the relationship index and
//! the workspace before delegating the document work to an
//! [`AuthoringEngine`].

use std::fmt;

use plansmith_index::IndexError;

pub mod engine;
pub mod metrics;
pub mod process;
pub mod ssp;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod workspace;

pub use engine::{
    AssembleRequest, AuthoringEngine, EngineError, FilterRequest, GenerateRequest,
    SUCCESS_EXIT_CODE,
};
pub use metrics::AuthoringMetrics;
pub use process::ProcessEngine;
pub use ssp::{FilterArtifact, NewArtifact, SspAuthoring, MAIN_COMPONENT_TITLE};
pub use workspace::{
    ComponentDefinition, DefinedComponent, FsWorkspace, ModelKind, Profile, Workspace,
    WorkspaceError, WorkspaceModel,
};

/// Result alias used throughout the authoring crate.
pub type Result<T> = std::result::Result<T, AuthoringError>;

/// Orchestration operations, used as log and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Markdown to model assembly.
    Assemble,
    /// Model to markdown generation.
    Regenerate,
    /// Index registration followed by generation.
    CreateNew,
    /// Derived artifact produced by filtering another one.
    CreateFiltered,
}

impl Operation {
    /// Stable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Assemble => "assemble",
            Operation::Regenerate => "regenerate",
            Operation::CreateNew => "create-new",
            Operation::CreateFiltered => "create-filtered",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for authoring operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthoringError {
    /// Failure raised by the relationship index.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// A profile or component definition named in a request is not in the workspace.
    #[error("{kind} `{name}` does not exist in the workspace")]
    ReferenceNotFound {
        /// Kind of the missing model.
        kind: ModelKind,
        /// Name that failed to resolve.
        name: String,
    },
    /// A workspace model exists but could not be read.
    #[error("unable to load {kind} `{name}`: {source}")]
    Workspace {
        /// Kind of the model.
        kind: ModelKind,
        /// Model name.
        name: String,
        /// Underlying failure.
        #[source]
        source: WorkspaceError,
    },
    /// The authoring engine reported failure or raised an error.
    #[error("{operation} failed for `{artifact}`: {message}")]
    OrchestrationFailure {
        /// Operation that failed.
        operation: Operation,
        /// Artifact the operation ran against.
        artifact: String,
        /// Engine message, or a description of the unsuccessful result.
        message: String,
    },
    /// A path or name that does not identify a single artifact.
    #[error("`{reference}` does not name an artifact")]
    InvalidReference {
        /// Offending reference.
        reference: String,
    },
    /// A new artifact named no component definitions.
    #[error("`{artifact}` needs at least one component definition")]
    NoComponents {
        /// Artifact being created.
        artifact: String,
    },
}

/// Coarse classification of [`AuthoringError`] so callers can pick retry or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required index lookup missed.
    NotFound,
    /// Workspace reference missing or unreadable.
    ReferenceNotFound,
    /// Engine reported failure or raised.
    OrchestrationFailure,
    /// Index store failed structural validation on load.
    CorruptIndex,
    /// Index store could not be read or written.
    Storage,
    /// Request named something that is not an artifact, or left out its
    /// component definitions.
    InvalidReference,
}

impl ErrorKind {
    /// Stable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::ReferenceNotFound => "reference-not-found",
            ErrorKind::OrchestrationFailure => "orchestration-failure",
            ErrorKind::CorruptIndex => "corrupt-index",
            ErrorKind::Storage => "storage",
            ErrorKind::InvalidReference => "invalid-reference",
        }
    }
}

impl AuthoringError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthoringError::Index(IndexError::NotFound { .. }) => ErrorKind::NotFound,
            AuthoringError::Index(IndexError::Corrupt { .. } | IndexError::Malformed { .. }) => {
                ErrorKind::CorruptIndex
            }
            AuthoringError::Index(IndexError::Io { .. } | IndexError::Json(_)) => ErrorKind::Storage,
            AuthoringError::ReferenceNotFound { .. } | AuthoringError::Workspace { .. } => {
                ErrorKind::ReferenceNotFound
            }
            AuthoringError::OrchestrationFailure { .. } => ErrorKind::OrchestrationFailure,
            AuthoringError::InvalidReference { .. } | AuthoringError::NoComponents { .. } => {
                ErrorKind::InvalidReference
            }
        }
    }

    pub(crate) fn engine(operation: Operation, artifact: &str, message: impl Into<String>) -> Self {
        AuthoringError::OrchestrationFailure {
            operation,
            artifact: artifact.to_owned(),
            message: message.into(),
        }
    }
}
