//! ---
//! plansmith_section: "02-relationship-index"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Artifact relationship index and its durable store."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Relationship index recording, per authored artifact, the profile and
//! component definitions it is generated from plus its optional inheritance
//! parent and header customization.

use std::path::PathBuf;

/// Result alias used throughout the index crate.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Error type for the relationship index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A required lookup named an artifact the index does not hold.
    #[error("artifact `{artifact}` does not exist in the index")]
    NotFound {
        /// Artifact that was looked up.
        artifact: String,
    },
    /// A stored record violates the entry invariants.
    #[error("index entry for `{artifact}` is corrupt: {reason}")]
    Corrupt {
        /// Artifact whose record was rejected.
        artifact: String,
        /// What was wrong with the record.
        reason: String,
    },
    /// The store is not a JSON object keyed by artifact name.
    #[error("index store {} is not a valid index document: {source}", path.display())]
    Malformed {
        /// Store location.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// Wrapper for IO errors encountered while reading or writing the store.
    #[error("io error on index store {}: {source}", path.display())]
    Io {
        /// Store location.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Wrapper for JSON serialization issues on write.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IndexError {
    /// Artifact the error refers to, when there is one.
    pub fn artifact(&self) -> Option<&str> {
        match self {
            IndexError::NotFound { artifact } | IndexError::Corrupt { artifact, .. } => {
                Some(artifact)
            }
            _ => None,
        }
    }
}

pub mod entry;
pub mod index;
pub mod store;

pub use entry::IndexEntry;
pub use index::RelationshipIndex;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_artifact() {
        let err = IndexError::NotFound {
            artifact: "ssp-a".into(),
        };
        assert_eq!(format!("{err}"), "artifact `ssp-a` does not exist in the index");
        assert_eq!(err.artifact(), Some("ssp-a"));

        let err = IndexError::Corrupt {
            artifact: "ssp-b".into(),
            reason: "missing profile".into(),
        };
        assert_eq!(err.artifact(), Some("ssp-b"));
        assert!(format!("{err}").contains("missing profile"));
    }
}
