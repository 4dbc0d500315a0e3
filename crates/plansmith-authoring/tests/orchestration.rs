//! ---
//! plansmith_section: "04-authoring-orchestration"
//! plansmith_subsection: "integration-tests"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Orchestrator behaviour against a real index store and workspace."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use plansmith_authoring::testing::{
    write_component_definition, write_profile, RecordingEngine, ScriptedOutcome,
};
use plansmith_authoring::{
    AuthoringError, ErrorKind, FilterArtifact, FsWorkspace, ModelKind, NewArtifact, SspAuthoring,
};
use plansmith_index::{IndexEntry, RelationshipIndex};
use plansmith_logging::LogContext;
use tempfile::{tempdir, TempDir};

fn context() -> LogContext {
    LogContext::new().with_service("orchestration-tests")
}

fn index_path(dir: &TempDir) -> PathBuf {
    dir.path().join("ssp-index.json")
}

fn authoring(dir: &TempDir) -> Result<SspAuthoring<FsWorkspace, RecordingEngine>> {
    let index = RelationshipIndex::open(index_path(dir), context())?;
    Ok(SspAuthoring::new(
        FsWorkspace::new(dir.path()),
        RecordingEngine::new(),
        index,
        context(),
    ))
}

fn seeded_workspace() -> Result<TempDir> {
    let dir = tempdir()?;
    write_profile(dir.path(), "simplified_nist_profile")?;
    write_component_definition(dir.path(), "test_comp", &["Component A"])?;
    write_component_definition(dir.path(), "c2", &["X", "Y"])?;
    Ok(dir)
}

#[test]
fn create_new_with_unknown_profile_leaves_store_untouched() -> Result<()> {
    let dir = seeded_workspace()?;
    let mut authoring = authoring(&dir)?;
    let before = fs::read_to_string(index_path(&dir))?;

    let err = authoring
        .create_new(
            &NewArtifact::new("new_ssp", "fake_profile", ["test_comp"]),
            Path::new("md_ssp"),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);
    assert_eq!(
        err.to_string(),
        "profile `fake_profile` does not exist in the workspace"
    );

    assert_eq!(fs::read_to_string(index_path(&dir))?, before);
    let reopened = RelationshipIndex::open(index_path(&dir), context())?;
    assert!(!reopened.contains("new_ssp"));
    Ok(())
}

#[test]
fn create_new_with_unknown_component_names_it() -> Result<()> {
    let dir = seeded_workspace()?;
    let mut authoring = authoring(&dir)?;

    let err = authoring
        .create_new(
            &NewArtifact::new("new_ssp", "simplified_nist_profile", ["test_comp", "fake_comp"]),
            Path::new("md_ssp"),
        )
        .unwrap_err();
    match err {
        AuthoringError::ReferenceNotFound { kind, name } => {
            assert_eq!(kind, ModelKind::ComponentDefinition);
            assert_eq!(name, "fake_comp");
        }
        other => panic!("unexpected error: {other}"),
    }
    let reopened = RelationshipIndex::open(index_path(&dir), context())?;
    assert!(reopened.is_empty());
    assert!(authoring.engine().calls().is_empty());
    Ok(())
}

#[test]
fn create_new_keeps_entry_when_generation_fails() -> Result<()> {
    let dir = seeded_workspace()?;
    let mut authoring = authoring(&dir)?;
    authoring
        .engine()
        .set_outcome(ScriptedOutcome::Error("markdown directory is read-only".into()));

    let artifact = NewArtifact::new("new_ssp", "simplified_nist_profile", ["test_comp"])
        .with_header_override("headers/new_ssp.yaml");
    let err = authoring
        .create_new(&artifact, Path::new("md_ssp"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OrchestrationFailure);

    let reopened = RelationshipIndex::open(index_path(&dir), context())?;
    assert_eq!(reopened.lookup_profile("new_ssp")?, "simplified_nist_profile");
    assert_eq!(
        reopened.lookup_header_override("new_ssp"),
        Some("headers/new_ssp.yaml")
    );

    authoring.engine().set_outcome(ScriptedOutcome::Success);
    authoring.regenerate(Path::new("new_ssp"), Path::new("md_ssp"))?;
    let generated = authoring.engine().generate_calls();
    assert_eq!(generated.len(), 2);
    assert_eq!(generated[1].yaml_header, "headers/new_ssp.yaml");
    Ok(())
}

#[test]
fn repeated_create_new_does_not_rewrite_store() -> Result<()> {
    let dir = seeded_workspace()?;
    let mut authoring = authoring(&dir)?;
    let artifact = NewArtifact::new("new_ssp", "simplified_nist_profile", ["test_comp"]);

    authoring.create_new(&artifact, Path::new("md_ssp"))?;
    // same content, different layout; a skipped persist leaves it as is
    let compact = r#"{"new_ssp":{"profile":"simplified_nist_profile","component_definitions":["test_comp"],"leveraged_ssp":null,"yaml_header":null}}"#;
    fs::write(index_path(&dir), compact)?;
    authoring.create_new(&artifact, Path::new("md_ssp"))?;

    assert_eq!(fs::read_to_string(index_path(&dir))?, compact);
    assert_eq!(authoring.engine().generate_calls().len(), 2);
    Ok(())
}

#[test]
fn create_filtered_never_touches_index() -> Result<()> {
    let dir = seeded_workspace()?;
    let mut authoring = authoring(&dir)?;
    authoring
        .index_mut()
        .add(IndexEntry::new("doc-1", "simplified_nist_profile", ["c2"]));
    authoring.index().write_out()?;
    let before = fs::read_to_string(index_path(&dir))?;

    authoring.create_filtered(
        &FilterArtifact::new("doc-2", "doc-1")
            .with_profile("simplified_nist_profile")
            .with_components(["c2"])
            .with_version("1.1"),
    )?;

    let filtered = authoring.engine().filter_calls();
    assert_eq!(
        filtered[0].components,
        Some(vec!["This System".to_owned(), "X".to_owned(), "Y".to_owned()])
    );
    assert_eq!(filtered[0].profile.as_deref(), Some("simplified_nist_profile"));
    assert_eq!(filtered[0].version, "1.1");
    assert!(!authoring.index().contains("doc-2"));
    assert_eq!(fs::read_to_string(index_path(&dir))?, before);
    Ok(())
}

#[test]
fn create_filtered_checks_profile_reference() -> Result<()> {
    let dir = seeded_workspace()?;
    let authoring = authoring(&dir)?;
    let err = authoring
        .create_filtered(&FilterArtifact::new("doc-2", "doc-1").with_profile("fake_profile"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);
    assert!(authoring.engine().calls().is_empty());
    Ok(())
}

#[test]
fn corrupt_store_surfaces_on_open() -> Result<()> {
    let dir = tempdir()?;
    fs::write(
        index_path(&dir),
        r#"{"doc-1": {"profile": "p1", "leveraged_ssp": null}}"#,
    )?;
    let err = RelationshipIndex::open(index_path(&dir), context()).unwrap_err();
    assert_eq!(AuthoringError::from(err).kind(), ErrorKind::CorruptIndex);
    Ok(())
}

#[cfg(unix)]
mod process_engine {
    use std::os::unix::fs::PermissionsExt;

    use plansmith_authoring::{ErrorKind, ProcessEngine, SspAuthoring};

    use super::*;

    fn fake_engine(dir: &Path, exit_code: i32) -> Result<PathBuf> {
        let script = dir.join("fake-trestle");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"$(pwd)/engine-args.txt\"\necho 'engine says no' >&2\nexit {exit_code}\n"
            ),
        )?;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))?;
        Ok(script)
    }

    #[test]
    fn regenerate_invokes_engine_in_workspace_root() -> Result<()> {
        let dir = seeded_workspace()?;
        let script = fake_engine(dir.path(), 0)?;
        let mut index = RelationshipIndex::open(index_path(&dir), context())?;
        index.add(IndexEntry::new("doc-1", "simplified_nist_profile", ["test_comp", "c2"]));
        let authoring = SspAuthoring::new(
            FsWorkspace::new(dir.path()),
            ProcessEngine::new(script.display().to_string(), dir.path()),
            index,
            context(),
        );

        authoring.regenerate(Path::new("doc-1"), Path::new("md_ssp"))?;

        let args = fs::read_to_string(dir.path().join("engine-args.txt"))?;
        let args: Vec<_> = args.lines().collect();
        assert_eq!(&args[..2], ["author", "ssp-generate"]);
        assert!(args.windows(2).any(|pair| pair == ["--compdefs", "test_comp,c2"]));
        assert!(args.windows(2).any(|pair| pair == ["--output", "md_ssp/doc-1"]));
        assert!(args.contains(&"--include-all-parts"));
        assert!(!args.contains(&"--leveraged-ssp"));
        Ok(())
    }

    #[test]
    fn failing_engine_message_reaches_caller() -> Result<()> {
        let dir = seeded_workspace()?;
        let script = fake_engine(dir.path(), 2)?;
        let authoring = SspAuthoring::new(
            FsWorkspace::new(dir.path()),
            ProcessEngine::new(script.display().to_string(), dir.path()),
            RelationshipIndex::open(index_path(&dir), context())?,
            context(),
        );

        let err = authoring
            .create_filtered(&FilterArtifact::new("doc-2", "doc-1"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OrchestrationFailure);
        let message = err.to_string();
        assert!(message.contains("exited with code 2"), "{message}");
        assert!(message.contains("engine says no"), "{message}");
        Ok(())
    }
}
