//! ---
//! plansmith_section: "05-control-cli"
//! plansmith_subsection: "binary"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Control CLI for administrators of Plansmith workspaces."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use plansmith_authoring::{AuthoringMetrics, FsWorkspace, ProcessEngine, SspAuthoring};
use plansmith_common::{init_tracing, AppConfig, LoadedAppConfig};
use plansmith_index::RelationshipIndex;
use plansmith_logging::{authoring_debug, LogContext};
use prometheus::{Registry, TextEncoder};

const SERVICE: &str = "plansmithctl";
const CONFIG_CANDIDATES: [&str; 2] = ["plansmith.toml", "configs/plansmith.toml"];

/// Orchestrator as wired by the CLI.
pub type Authoring = SspAuthoring<FsWorkspace, ProcessEngine>;

/// Resolved configuration plus the handles every command needs.
#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    source: Option<PathBuf>,
    root: PathBuf,
    registry: Arc<Registry>,
    context: LogContext,
}

impl Session {
    /// Load configuration and apply command-line overrides.
    pub fn load(config_path: Option<&Path>, workspace: Option<&Path>) -> Result<Self> {
        let loaded = match config_path {
            Some(path) => LoadedAppConfig {
                config: AppConfig::from_path(path)?,
                source: Some(path.to_path_buf()),
            },
            None => AppConfig::load_or_default(&CONFIG_CANDIDATES)?,
        };
        let mut config = loaded.config;
        if let Some(root) = workspace {
            config.workspace.root = root.to_path_buf();
        }
        let root = config.workspace.root_path()?;
        let context = LogContext::new()
            .with_service(SERVICE)
            .with_workspace(root.display().to_string());
        Ok(Self {
            config,
            source: loaded.source,
            root,
            registry: Arc::new(Registry::new()),
            context,
        })
    }

    /// Install the configured subscriber, falling back to the development one.
    pub fn init_logging(&self) {
        if let Err(err) = init_tracing(SERVICE, &self.config.logging) {
            plansmith_logging::init();
            eprintln!("file logging unavailable ({err:#}); logging to the terminal only");
        }
        match &self.source {
            Some(path) => authoring_debug!(
                context = self.context,
                "configuration loaded from {}",
                path.display()
            ),
            None => authoring_debug!(context = self.context, "using built-in configuration"),
        }
    }

    /// Open the relationship index of the workspace.
    pub fn open_index(&self) -> Result<RelationshipIndex> {
        let path = self.config.workspace.index_path()?;
        RelationshipIndex::open(&path, self.context.clone())
            .with_context(|| format!("unable to open relationship index {}", path.display()))
    }

    /// Directory generated markdown is written under.
    pub fn markdown_root(&self) -> Result<PathBuf> {
        self.config.workspace.markdown_path()
    }

    /// Orchestrator over the workspace, the configured engine and the index.
    pub fn authoring(&self) -> Result<Authoring> {
        let index = self.open_index()?;
        let engine = ProcessEngine::new(self.config.engine.program.clone(), &self.root)
            .with_args(self.config.engine.args.iter().cloned());
        let metrics = AuthoringMetrics::new(self.registry.clone())
            .context("unable to register authoring metrics")?;
        Ok(SspAuthoring::new(
            FsWorkspace::new(&self.root),
            engine,
            index,
            self.context.clone(),
        )
        .with_metrics(metrics))
    }

    /// Write the gathered metrics to stderr in the Prometheus text format.
    pub fn print_metrics(&self) -> Result<()> {
        let rendered = TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .context("unable to encode metrics")?;
        eprint!("{rendered}");
        Ok(())
    }
}
