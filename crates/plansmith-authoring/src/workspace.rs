//! ---
//! plansmith_section: "04-authoring-orchestration"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "SSP authoring orchestration over the relationship index."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
//! Workspace reference resolution for profiles and component definitions.
//!
//! Models live at `<root>/<kind dir>/<name>/<kind stem>.{json,yaml,yml}` and
//! wrap their content in a single top-level key named after the kind. Only
//! the fields orchestration reads are modelled here.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Extensions tried when resolving a model, in priority order.
pub const MODEL_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Kinds of workspace model the orchestrator resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Control baseline.
    Profile,
    /// Bundle of components implementing controls.
    ComponentDefinition,
}

impl ModelKind {
    /// Directory under the workspace root holding models of this kind.
    pub fn directory(&self) -> &'static str {
        match self {
            ModelKind::Profile => "profiles",
            ModelKind::ComponentDefinition => "component-definitions",
        }
    }

    /// File stem of the model file and its top-level document key.
    pub fn stem(&self) -> &'static str {
        match self {
            ModelKind::Profile => "profile",
            ModelKind::ComponentDefinition => "component-definition",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Profile => f.write_str("profile"),
            ModelKind::ComponentDefinition => f.write_str("component definition"),
        }
    }
}

/// A model type that can be loaded from the workspace.
pub trait WorkspaceModel: DeserializeOwned {
    /// Kind used for path resolution.
    const KIND: ModelKind;
}

/// Document metadata shared by all models.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Document version string.
    #[serde(default)]
    pub version: Option<String>,
}

/// Control baseline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Profile {
    /// Document identifier.
    #[serde(default)]
    pub uuid: Option<String>,
    /// Document metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Catalogs or profiles this baseline imports from.
    #[serde(default)]
    pub imports: Vec<ProfileImport>,
}

/// Import statement of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileImport {
    /// Reference to the imported catalog or profile.
    pub href: String,
}

impl WorkspaceModel for Profile {
    const KIND: ModelKind = ModelKind::Profile;
}

/// Named bundle of components.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComponentDefinition {
    /// Document identifier.
    #[serde(default)]
    pub uuid: Option<String>,
    /// Document metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Components defined by this document.
    #[serde(default)]
    pub components: Vec<DefinedComponent>,
}

impl ComponentDefinition {
    /// Titles of the defined components, in document order.
    pub fn component_titles(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|component| component.title.as_str())
    }
}

/// Component declared by a component definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DefinedComponent {
    /// Component identifier.
    #[serde(default)]
    pub uuid: Option<String>,
    /// Component type (`software`, `service`, `validation`, ...).
    #[serde(default, rename = "type")]
    pub component_type: Option<String>,
    /// Component title, used to select components when filtering.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

impl WorkspaceModel for ComponentDefinition {
    const KIND: ModelKind = ModelKind::ComponentDefinition;
}

/// Error raised while resolving or reading workspace models.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// No model of that kind and name exists.
    #[error("{kind} `{name}` not found in workspace")]
    NotFound {
        /// Kind searched for.
        kind: ModelKind,
        /// Name searched for.
        name: String,
    },
    /// The model file could not be read.
    #[error("unable to read {}: {source}", path.display())]
    Io {
        /// Model file.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The model file is not valid JSON for the model.
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        /// Model file.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// The model file is not valid YAML for the model.
    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        /// Model file.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_yaml::Error,
    },
    /// The document lacks the top-level key for its kind.
    #[error("{} has no top-level `{key}` key", path.display())]
    MissingRoot {
        /// Model file.
        path: PathBuf,
        /// Expected key.
        key: &'static str,
    },
}

/// Access to the models of an authoring workspace.
pub trait Workspace {
    /// Workspace root directory.
    fn root(&self) -> &Path;

    /// Location of the named model, or `None` when it does not exist.
    fn resolve_path(&self, name: &str, kind: ModelKind) -> Option<PathBuf>;

    /// Load the named model together with the file it was read from.
    fn load<M: WorkspaceModel>(&self, name: &str) -> Result<(M, PathBuf), WorkspaceError> {
        let path = self
            .resolve_path(name, M::KIND)
            .ok_or_else(|| WorkspaceError::NotFound {
                kind: M::KIND,
                name: name.to_owned(),
            })?;
        let raw = fs::read_to_string(&path).map_err(|source| WorkspaceError::Io {
            path: path.clone(),
            source,
        })?;
        let model = parse_model::<M>(&path, &raw)?;
        Ok((model, path))
    }
}

/// Workspace laid out on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    /// Workspace rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory that holds the model files for `name`.
    pub fn model_dir(&self, name: &str, kind: ModelKind) -> PathBuf {
        self.root.join(kind.directory()).join(name)
    }
}

impl Workspace for FsWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_path(&self, name: &str, kind: ModelKind) -> Option<PathBuf> {
        if !is_plain_name(name) {
            return None;
        }
        let dir = self.model_dir(name, kind);
        MODEL_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{ext}", kind.stem())))
            .find(|candidate| candidate.is_file())
    }
}

// Names are single path components; anything else could escape the root.
pub(crate) fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}

fn parse_model<M: WorkspaceModel>(path: &Path, raw: &str) -> Result<M, WorkspaceError> {
    let key = M::KIND.stem();
    let missing_root = || WorkspaceError::MissingRoot {
        path: path.to_path_buf(),
        key,
    };
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );

    if is_yaml {
        let yaml_err = |source| WorkspaceError::Yaml {
            path: path.to_path_buf(),
            source,
        };
        let mut document: serde_yaml::Mapping = serde_yaml::from_str(raw).map_err(yaml_err)?;
        let inner = document.remove(key).ok_or_else(missing_root)?;
        serde_yaml::from_value(inner).map_err(yaml_err)
    } else {
        let json_err = |source| WorkspaceError::Json {
            path: path.to_path_buf(),
            source,
        };
        let mut document: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(raw).map_err(json_err)?;
        let inner = document.remove(key).ok_or_else(missing_root)?;
        serde_json::from_value(inner).map_err(json_err)
    }
}
