//! ---
//! plansmith_section: "02-relationship-index"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Artifact relationship index and its durable store."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
//! On-disk codec for the index store.
//!
//! The store is one pretty-printed JSON object keyed by artifact name:
//!
//! ```json
//! {
//!   "ssp-name": {
//!     "profile": "profile",
//!     "component_definitions": ["comp-a", "comp-b"],
//!     "leveraged_ssp": null,
//!     "yaml_header": "ssp-name.yaml"
//!   }
//! }
//! ```
//!
//! Writes always emit all four keys. Reads tolerate the two optional keys
//! being missing or `null`.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::entry::IndexEntry;
use crate::{IndexError, Result};

/// Key holding the profile name.
pub const PROFILE_KEY: &str = "profile";
/// Key holding the ordered component definition names.
pub const COMPONENT_DEFINITIONS_KEY: &str = "component_definitions";
/// Key holding the optional leveraged artifact.
pub const LEVERAGED_KEY: &str = "leveraged_ssp";
/// Key holding the optional header override path.
pub const HEADER_KEY: &str = "yaml_header";

#[derive(Debug, Deserialize)]
struct StoredRecord {
    // Outer `None` means the key is missing, inner `None` an explicit null.
    #[serde(default, with = "serde_with::rust::double_option")]
    profile: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    component_definitions: Option<Option<Vec<String>>>,
    #[serde(default)]
    leveraged_ssp: Option<String>,
    #[serde(default)]
    yaml_header: Option<String>,
}

#[derive(Debug, Serialize)]
struct StoredRecordRef<'a> {
    profile: &'a str,
    component_definitions: &'a [String],
    leveraged_ssp: Option<&'a str>,
    yaml_header: Option<&'a str>,
}

impl<'a> From<&'a IndexEntry> for StoredRecordRef<'a> {
    fn from(entry: &'a IndexEntry) -> Self {
        Self {
            profile: &entry.profile,
            component_definitions: &entry.components,
            leveraged_ssp: entry.leveraged_artifact.as_deref(),
            yaml_header: entry.header_override.as_deref(),
        }
    }
}

/// Result of decoding a store document.
#[derive(Debug, Default)]
pub struct DecodedStore {
    /// Complete entries keyed by artifact name.
    pub entries: BTreeMap<String, IndexEntry>,
    /// Records whose profile and component definitions were both `null`.
    pub placeholders: Vec<String>,
}

/// Decode a store document. Any invalid record fails the whole decode.
pub fn decode(path: &Path, bytes: &[u8]) -> Result<DecodedStore> {
    let document: BTreeMap<String, serde_json::Value> =
        serde_json::from_slice(bytes).map_err(|source| IndexError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    let mut decoded = DecodedStore::default();
    for (name, value) in document {
        let record: StoredRecord =
            serde_json::from_value(value).map_err(|err| IndexError::Corrupt {
                artifact: name.clone(),
                reason: err.to_string(),
            })?;

        let (profile, components) = match (record.profile, record.component_definitions) {
            (None, _) => return Err(missing(&name, PROFILE_KEY)),
            (_, None) => return Err(missing(&name, COMPONENT_DEFINITIONS_KEY)),
            (Some(Some(_)), Some(Some(components))) if components.is_empty() => {
                return Err(no_components(&name))
            }
            (Some(Some(profile)), Some(Some(components))) => (profile, components),
            (Some(None), Some(None)) => {
                decoded.placeholders.push(name);
                continue;
            }
            (Some(None), Some(Some(_))) => return Err(missing(&name, PROFILE_KEY)),
            (Some(Some(_)), Some(None)) => return Err(missing(&name, COMPONENT_DEFINITIONS_KEY)),
        };

        let entry = IndexEntry::new(name.clone(), profile, components)
            .with_leveraged(record.leveraged_ssp)
            .with_header_override(record.yaml_header);
        decoded.entries.insert(name, entry);
    }
    Ok(decoded)
}

fn missing(artifact: &str, key: &str) -> IndexError {
    IndexError::Corrupt {
        artifact: artifact.to_owned(),
        reason: format!("`{key}` is absent; profile and component data must be set together"),
    }
}

fn no_components(artifact: &str) -> IndexError {
    IndexError::Corrupt {
        artifact: artifact.to_owned(),
        reason: format!("`{COMPONENT_DEFINITIONS_KEY}` is empty"),
    }
}

/// Encode entries into the store document.
///
/// Entries without component definitions are refused so the store never
/// holds a record that [`decode`] would reject.
pub fn encode<'a>(entries: impl IntoIterator<Item = &'a IndexEntry>) -> Result<Vec<u8>> {
    let mut document = BTreeMap::new();
    for entry in entries {
        if entry.components.is_empty() {
            return Err(no_components(&entry.name));
        }
        document.insert(entry.name.as_str(), StoredRecordRef::from(entry));
    }
    let mut bytes = serde_json::to_vec_pretty(&document)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Replace the file at `path` with `bytes` so readers see either the old or
/// the new contents, never a partial write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_err)?;

    let staged = NamedTempFile::new_in(parent).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(staged.as_file());
        writer.write_all(bytes).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
    }
    staged.as_file().sync_all().map_err(io_err)?;
    staged.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_str(raw: &str) -> Result<DecodedStore> {
        decode(Path::new("ssp-index.json"), raw.as_bytes())
    }

    #[test]
    fn decodes_complete_record() {
        let decoded = decode_str(
            r#"{
                "ssp-name": {
                    "profile": "profile",
                    "component_definitions": ["comp-a", "comp-b"],
                    "leveraged_ssp": "leveraged-ssp-name",
                    "yaml_header": "ssp-name.yaml"
                }
            }"#,
        )
        .unwrap();
        let entry = &decoded.entries["ssp-name"];
        assert_eq!(entry.profile, "profile");
        assert_eq!(entry.components, vec!["comp-a", "comp-b"]);
        assert_eq!(entry.leveraged_artifact.as_deref(), Some("leveraged-ssp-name"));
        assert_eq!(entry.header_override.as_deref(), Some("ssp-name.yaml"));
    }

    #[test]
    fn optional_keys_may_be_missing_or_null() {
        let decoded = decode_str(
            r#"{
                "a": {"profile": "p", "component_definitions": ["c"]},
                "b": {"profile": "p", "component_definitions": ["c"], "leveraged_ssp": null, "yaml_header": null}
            }"#,
        )
        .unwrap();
        for name in ["a", "b"] {
            assert!(decoded.entries[name].leveraged_artifact.is_none());
            assert!(decoded.entries[name].header_override.is_none());
        }
    }

    #[test]
    fn missing_component_definitions_is_corrupt() {
        let err = decode_str(r#"{"ssp-x": {"profile": "p"}}"#).unwrap_err();
        assert!(matches!(err, IndexError::Corrupt { ref artifact, .. } if artifact == "ssp-x"));
    }

    #[test]
    fn half_null_pair_is_corrupt() {
        let err = decode_str(r#"{"ssp-y": {"profile": null, "component_definitions": ["c"]}}"#)
            .unwrap_err();
        assert!(matches!(err, IndexError::Corrupt { ref artifact, .. } if artifact == "ssp-y"));
    }

    #[test]
    fn empty_component_definitions_is_corrupt() {
        let err = decode_str(r#"{"ssp-e": {"profile": "p", "component_definitions": []}}"#)
            .unwrap_err();
        assert!(matches!(err, IndexError::Corrupt { ref artifact, .. } if artifact == "ssp-e"));
        assert!(err.to_string().contains("is empty"));
    }

    #[test]
    fn encode_refuses_entry_without_components() {
        let kept = IndexEntry::new("a", "p", ["c"]);
        let empty = IndexEntry::new("b", "p", Vec::<String>::new());
        let err = encode([&kept, &empty]).unwrap_err();
        assert!(matches!(err, IndexError::Corrupt { ref artifact, .. } if artifact == "b"));
    }

    #[test]
    fn null_pair_is_a_placeholder() {
        let decoded = decode_str(
            r#"{"ssp-z": {"profile": null, "component_definitions": null, "leveraged_ssp": "l"}}"#,
        )
        .unwrap();
        assert!(decoded.entries.is_empty());
        assert_eq!(decoded.placeholders, vec!["ssp-z".to_owned()]);
    }

    #[test]
    fn non_object_document_is_malformed() {
        let err = decode_str("[1, 2]").unwrap_err();
        assert!(matches!(err, IndexError::Malformed { .. }));
    }

    #[test]
    fn wrongly_typed_record_is_corrupt() {
        let err = decode_str(r#"{"ssp-w": {"profile": 7, "component_definitions": ["c"]}}"#)
            .unwrap_err();
        assert!(matches!(err, IndexError::Corrupt { ref artifact, .. } if artifact == "ssp-w"));
    }

    #[test]
    fn encode_emits_all_four_keys() {
        let entry = IndexEntry::new("ssp", "prof", ["comp"]);
        let bytes = encode([&entry]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let record = value["ssp"].as_object().unwrap();
        assert_eq!(record.len(), 4);
        assert!(record[LEVERAGED_KEY].is_null());
        assert!(record[HEADER_KEY].is_null());
        assert_eq!(record[PROFILE_KEY], "prof");
        assert_eq!(record[COMPONENT_DEFINITIONS_KEY][0], "comp");
    }
}
