//! ---
//! plansmith_section: "02-relationship-index"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Artifact relationship index and its durable store."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

/// Generation inputs recorded for one authored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Artifact name, unique within the index.
    pub name: String,
    /// Control baseline the artifact's requirements come from.
    pub profile: String,
    /// Component definitions contributing implementations, in order.
    pub components: Vec<String>,
    /// Artifact this one inherits implementations from.
    pub leveraged_artifact: Option<String>,
    /// Header customization file merged into generated output.
    pub header_override: Option<String>,
}

impl IndexEntry {
    /// Construct an entry with no inheritance parent and the default header.
    pub fn new(
        name: impl Into<String>,
        profile: impl Into<String>,
        components: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            profile: profile.into(),
            components: components.into_iter().map(Into::into).collect(),
            leveraged_artifact: None,
            header_override: None,
        }
    }

    /// Set the leveraged artifact. Empty names are treated as absent.
    pub fn with_leveraged(mut self, leveraged: Option<String>) -> Self {
        self.leveraged_artifact = leveraged.filter(|name| !name.is_empty());
        self
    }

    /// Set the header override path. Empty paths are treated as absent.
    pub fn with_header_override(mut self, header: Option<String>) -> Self {
        self.header_override = header.filter(|path| !path.is_empty());
        self
    }

    /// Component definitions joined the way the authoring engine expects them.
    pub fn joined_components(&self) -> String {
        self.components.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_optionals_are_absent() {
        let entry = IndexEntry::new("ssp", "prof", ["comp"])
            .with_leveraged(Some(String::new()))
            .with_header_override(Some(String::new()));
        assert!(entry.leveraged_artifact.is_none());
        assert!(entry.header_override.is_none());
    }

    #[test]
    fn joins_components_in_order() {
        let entry = IndexEntry::new("ssp", "prof", ["comp-b", "comp-a"]);
        assert_eq!(entry.joined_components(), "comp-b,comp-a");
    }
}
