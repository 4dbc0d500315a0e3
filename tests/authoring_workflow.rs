//! ---
//! plansmith_section: "15-testing-qa-runbook"
//! plansmith_subsection: "integration-tests"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "End-to-end authoring workflow across configuration, index and orchestrator."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use plansmith_authoring::testing::{
    write_component_definition, write_profile, EngineCall, RecordingEngine,
};
use plansmith_authoring::{
    AuthoringMetrics, ErrorKind, FilterArtifact, FsWorkspace, NewArtifact, Operation,
    SspAuthoring, MAIN_COMPONENT_TITLE,
};
use plansmith_common::AppConfig;
use plansmith_index::RelationshipIndex;
use plansmith_logging::LogContext;
use prometheus::Registry;
use tempfile::tempdir;

fn write_config(dir: &Path) -> Result<AppConfig> {
    let path = dir.join("plansmith.toml");
    fs::write(
        &path,
        format!(
            "[workspace]\nroot = \"{}\"\nindex_file = \"state/ssp-index.json\"\nmarkdown_dir = \"md_ssp\"\n\n[logging]\ndirectory = \"{}\"\n",
            dir.display(),
            dir.join("logs").display()
        ),
    )?;
    AppConfig::from_path(&path)
}

#[test]
fn create_regenerate_assemble_and_filter() -> Result<()> {
    let dir = tempdir()?;
    let config = write_config(dir.path())?;
    write_profile(dir.path(), "fedramp_moderate")?;
    write_component_definition(dir.path(), "platform", &["Kubernetes", "Object Storage"])?;
    write_component_definition(dir.path(), "app", &["Web Frontend"])?;

    let context = LogContext::new()
        .with_service("authoring-workflow")
        .with_workspace(dir.path().display().to_string());
    let index = RelationshipIndex::open(config.workspace.index_path()?, context.clone())?;
    let registry = Arc::new(Registry::new());
    let metrics = AuthoringMetrics::new(registry.clone())?;
    let mut authoring = SspAuthoring::new(
        FsWorkspace::new(config.workspace.root_path()?),
        RecordingEngine::new(),
        index,
        context.clone(),
    )
    .with_metrics(metrics.clone());
    let markdown_root = config.workspace.markdown_path()?;

    authoring.create_new(
        &NewArtifact::new("prod_ssp", "fedramp_moderate", ["platform", "app"])
            .with_header_override("headers/prod.yaml"),
        &markdown_root,
    )?;
    authoring.assemble(&markdown_root.join("prod_ssp"), "1.0.0")?;
    authoring.create_filtered(
        &FilterArtifact::new("platform_ssp", "prod_ssp")
            .with_components(["platform"])
            .with_control_origination(["sp-system"]),
    )?;
    let err = authoring
        .regenerate(Path::new("platform_ssp"), &markdown_root)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let calls = authoring.engine().calls();
    assert_eq!(calls.len(), 3);
    match &calls[0] {
        EngineCall::Generate(request) => {
            assert_eq!(request.output, markdown_root.join("prod_ssp"));
            assert_eq!(request.compdefs, "platform,app");
            assert_eq!(request.yaml_header, "headers/prod.yaml");
            assert_eq!(request.leveraged_ssp, "");
        }
        other => panic!("expected generate, got {other:?}"),
    }
    match &calls[1] {
        EngineCall::Assemble(request) => {
            assert_eq!(request.name, "prod_ssp");
            assert_eq!(request.version, "1.0.0");
            assert_eq!(request.compdefs, "platform,app");
        }
        other => panic!("expected assemble, got {other:?}"),
    }
    match &calls[2] {
        EngineCall::Filter(request) => {
            assert_eq!(
                request.components,
                Some(vec![
                    MAIN_COMPONENT_TITLE.to_owned(),
                    "Kubernetes".to_owned(),
                    "Object Storage".to_owned()
                ])
            );
            assert_eq!(request.control_origination, Some(vec!["sp-system".to_owned()]));
        }
        other => panic!("expected filter, got {other:?}"),
    }

    // only create_new reached the store
    let reopened = RelationshipIndex::open(config.workspace.index_path()?, context)?;
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.lookup_components("prod_ssp")?, ["platform", "app"]);

    assert_eq!(metrics.operations(Operation::CreateNew), 1);
    assert_eq!(metrics.operations(Operation::Regenerate), 1);
    assert_eq!(metrics.failures(Operation::Regenerate, ErrorKind::NotFound), 1);
    assert!(!registry.gather().is_empty());
    Ok(())
}

#[test]
fn reload_discards_unsaved_additions() -> Result<()> {
    let dir = tempdir()?;
    let config = write_config(dir.path())?;
    let mut index = RelationshipIndex::open(config.workspace.index_path()?, LogContext::new())?;
    index.add(plansmith_index::IndexEntry::new("draft", "p", ["c"]));
    assert!(index.contains("draft"));
    index.reload()?;
    assert!(!index.contains("draft"));
    Ok(())
}
