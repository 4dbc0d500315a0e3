//! ---
//! plansmith_section: "04-authoring-orchestration"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "SSP authoring orchestration over the relationship index."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
use std::sync::Arc;

use prometheus::{IntCounterVec, Opts, Registry};

use crate::{ErrorKind, Operation};

/// Metrics published by the authoring orchestrator.
#[derive(Clone)]
pub struct AuthoringMetrics {
    operations: IntCounterVec,
    failures: IntCounterVec,
    registry: Arc<Registry>,
}

impl AuthoringMetrics {
    /// Register all authoring metrics with the provided registry.
    pub fn new(registry: Arc<Registry>) -> prometheus::Result<Self> {
        let operations = IntCounterVec::new(
            Opts::new(
                "plansmith_operations_total",
                "Total number of authoring operations attempted",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(operations.clone()))?;

        let failures = IntCounterVec::new(
            Opts::new(
                "plansmith_operation_failures_total",
                "Total number of authoring operations that failed, by error kind",
            ),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(failures.clone()))?;

        Ok(Self {
            operations,
            failures,
            registry,
        })
    }

    /// Registry the metrics are published to.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Record an attempted operation.
    pub fn record_operation(&self, operation: Operation) {
        self.operations
            .with_label_values(&[operation.as_str()])
            .inc();
    }

    /// Record a failed operation.
    pub fn record_failure(&self, operation: Operation, kind: ErrorKind) {
        self.failures
            .with_label_values(&[operation.as_str(), kind.as_str()])
            .inc();
    }

    /// Attempts recorded for `operation`.
    pub fn operations(&self, operation: Operation) -> u64 {
        self.operations
            .with_label_values(&[operation.as_str()])
            .get()
    }

    /// Failures recorded for `operation` with the given kind.
    pub fn failures(&self, operation: Operation, kind: ErrorKind) -> u64 {
        self.failures
            .with_label_values(&[operation.as_str(), kind.as_str()])
            .get()
    }
}

impl std::fmt::Debug for AuthoringMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthoringMetrics").finish_non_exhaustive()
    }
}
