//! ---
//! plansmith_section: "01-core-functionality"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Shared primitives and utilities for the authoring tools."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
//! Shared configuration and tracing setup for the Plansmith workspace.
//! Library crates never read configuration or install subscribers on their
//! own; binaries load an [`AppConfig`] here and pass the relevant pieces down.

pub mod config;
pub mod logging;

pub use config::{AppConfig, EngineConfig, LoadedAppConfig, LoggingConfig, WorkspaceConfig};
pub use logging::{init_tracing, LogFormat};
