//! ---
//! plansmith_section: "03-logging"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Structured logging context and lifecycle events."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
#![warn(missing_docs)]

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

#[doc(hidden)]
pub use tracing;

/// Initialize a baseline tracing subscriber suitable for development and tests.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}

/// Logging context handed to the index and the orchestrator at construction.
///
/// Every event emitted through the crate macros carries these fields, so a
/// log line can always be traced back to the workspace and artifact involved.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogContext {
    /// Logical service emitting the event (`plansmithctl`, a test name, ...).
    pub service: Option<String>,
    /// Workspace root the operation runs against.
    pub workspace: Option<String>,
    /// Artifact the event refers to.
    pub artifact: Option<String>,
    /// Orchestration operation in flight.
    pub operation: Option<String>,
}

impl LogContext {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attach a workspace root.
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    /// Attach an artifact name.
    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    /// Attach an operation name.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Derive a child context scoped to one artifact operation.
    pub fn scoped(&self, operation: &str, artifact: &str) -> Self {
        self.clone()
            .with_operation(operation)
            .with_artifact(artifact)
    }

    #[doc(hidden)]
    pub fn field(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or("")
    }
}

/// Outcome attached to lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation was skipped because its effect was already in place.
    Skipped,
    /// The operation failed.
    Fault,
}

impl OperationOutcome {
    /// Stable lowercase label used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationOutcome::Success => "success",
            OperationOutcome::Skipped => "skipped",
            OperationOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized lifecycle event for an orchestration operation.
pub fn log_operation(
    context: &LogContext,
    operation: &str,
    message: &str,
    outcome: OperationOutcome,
) {
    match outcome {
        OperationOutcome::Fault => tracing::error!(
            operation,
            outcome = outcome.as_str(),
            service = LogContext::field(&context.service),
            workspace = LogContext::field(&context.workspace),
            artifact = LogContext::field(&context.artifact),
            message = %message
        ),
        _ => tracing::info!(
            operation,
            outcome = outcome.as_str(),
            service = LogContext::field(&context.service),
            workspace = LogContext::field(&context.workspace),
            artifact = LogContext::field(&context.artifact),
            message = %message
        ),
    }
}
