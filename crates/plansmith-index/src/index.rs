//! ---
//! plansmith_section: "02-relationship-index"
//! plansmith_subsection: "module"
//! plansmith_type: "source"
//! plansmith_scope: "code"
//! plansmith_description: "Artifact relationship index and its durable store."
//! plansmith_version: "v0.0.0-prealpha"
//! plansmith_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use plansmith_logging::{authoring_debug, authoring_info, authoring_warn, LogContext};

use crate::entry::IndexEntry;
use crate::store;
use crate::{IndexError, Result};

/// In-memory relationship index backed by a single JSON store.
///
/// The in-memory map is the source of truth for a session: [`add`](Self::add)
/// only touches memory, [`write_out`](Self::write_out) replaces the store with
/// a full snapshot, and [`reload`](Self::reload) discards memory and re-reads
/// the store.
///
/// There is no locking around load, mutate and write-out. Two processes
/// sharing a store race, and the last `write_out` wins; additions made by the
/// other process since its last load are lost. The atomic replace only
/// guarantees that readers never see a torn file.
#[derive(Debug)]
pub struct RelationshipIndex {
    path: PathBuf,
    entries: BTreeMap<String, IndexEntry>,
    context: LogContext,
}

impl RelationshipIndex {
    /// Open the index at `path`, creating an empty store if none exists.
    pub fn open(path: impl Into<PathBuf>, context: LogContext) -> Result<Self> {
        let mut index = Self {
            path: path.into(),
            entries: BTreeMap::new(),
            context,
        };
        index.reload()?;
        Ok(index)
    }

    /// Location of the backing store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Discard in-memory state and re-read the store.
    ///
    /// On failure the index is left empty rather than partially loaded.
    pub fn reload(&mut self) -> Result<()> {
        self.entries.clear();

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                authoring_info!(
                    context = self.context,
                    "index store {} not found; initialising empty store",
                    self.path.display()
                );
                return store::write_atomic(&self.path, b"{}\n");
            }
            Err(source) => {
                return Err(IndexError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let decoded = store::decode(&self.path, &bytes)?;
        for name in &decoded.placeholders {
            authoring_warn!(
                context = self.context.clone().with_artifact(name.as_str()),
                "index record has neither profile nor component definitions; ignoring it"
            );
        }
        self.entries = decoded.entries;
        authoring_debug!(
            context = self.context,
            "loaded {} index entries from {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Component definitions recorded for `name`.
    pub fn lookup_components(&self, name: &str) -> Result<&[String]> {
        self.required(name).map(|entry| entry.components.as_slice())
    }

    /// Profile recorded for `name`.
    pub fn lookup_profile(&self, name: &str) -> Result<&str> {
        self.required(name).map(|entry| entry.profile.as_str())
    }

    /// Leveraged artifact recorded for `name`, if any. Unknown names yield `None`.
    pub fn lookup_leveraged(&self, name: &str) -> Option<&str> {
        let leveraged = self
            .entries
            .get(name)
            .and_then(|entry| entry.leveraged_artifact.as_deref());
        if leveraged.is_none() {
            authoring_debug!(context = self.context, "no leveraged artifact recorded for {name}");
        }
        leveraged
    }

    /// Header override recorded for `name`, if any. Unknown names yield `None`.
    pub fn lookup_header_override(&self, name: &str) -> Option<&str> {
        let header = self
            .entries
            .get(name)
            .and_then(|entry| entry.header_override.as_deref());
        if header.is_none() {
            authoring_debug!(context = self.context, "no header override recorded for {name}");
        }
        header
    }

    /// Insert or replace an entry in memory. Returns the entry it replaced.
    ///
    /// Profile and component names are not checked against any workspace.
    pub fn add(&mut self, entry: IndexEntry) -> Option<IndexEntry> {
        authoring_debug!(
            context = self.context.clone().with_artifact(entry.name.as_str()),
            "adding index entry with profile {} and {} component definitions",
            entry.profile,
            entry.components.len()
        );
        self.entries.insert(entry.name.clone(), entry)
    }

    /// Drop the in-memory entry for `name`. Returns the entry removed.
    pub fn remove(&mut self, name: &str) -> Option<IndexEntry> {
        self.entries.remove(name)
    }

    /// Replace the store with a snapshot of the in-memory entries.
    pub fn write_out(&self) -> Result<()> {
        let bytes = store::encode(self.entries.values())?;
        store::write_atomic(&self.path, &bytes)?;
        authoring_info!(
            context = self.context,
            "wrote {} index entries to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Entry recorded for `name`, if any.
    pub fn entry(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.get(name)
    }

    /// Whether `name` has an entry.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All entries in artifact-name order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// Number of entries held in memory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn required(&self, name: &str) -> Result<&IndexEntry> {
        self.entries.get(name).ok_or_else(|| IndexError::NotFound {
            artifact: name.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(dir: &Path) -> RelationshipIndex {
        RelationshipIndex::open(dir.join("ssp-index.json"), LogContext::default()).unwrap()
    }

    #[test]
    fn open_bootstraps_missing_store() {
        let dir = tempdir().unwrap();
        let index = open(dir.path());
        assert!(index.is_empty());
        let raw = fs::read_to_string(index.path()).unwrap();
        assert_eq!(raw.trim(), "{}");

        // bootstrap is idempotent
        let again = open(dir.path());
        assert!(again.is_empty());
    }

    #[test]
    fn added_entries_are_visible_before_write_out() {
        let dir = tempdir().unwrap();
        let mut index = open(dir.path());
        index.add(IndexEntry::new("new_ssp", "test_prof", ["my_comp", "another_comp"]));

        assert_eq!(index.lookup_profile("new_ssp").unwrap(), "test_prof");
        assert_eq!(
            index.lookup_components("new_ssp").unwrap(),
            ["my_comp".to_owned(), "another_comp".to_owned()]
        );
        assert!(index.lookup_leveraged("new_ssp").is_none());
        assert!(index.lookup_header_override("new_ssp").is_none());
    }

    #[test]
    fn add_replaces_existing_entry() {
        let dir = tempdir().unwrap();
        let mut index = open(dir.path());
        assert!(index.add(IndexEntry::new("ssp", "p1", ["c1"])).is_none());
        let replaced = index
            .add(IndexEntry::new("ssp", "p2", ["c2"]).with_leveraged(Some("base".into())))
            .unwrap();
        assert_eq!(replaced.profile, "p1");
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup_profile("ssp").unwrap(), "p2");
        assert_eq!(index.lookup_leveraged("ssp"), Some("base"));
    }

    #[test]
    fn remove_only_touches_memory() {
        let dir = tempdir().unwrap();
        let mut index = open(dir.path());
        index.add(IndexEntry::new("ssp", "p", ["c"]));
        index.write_out().unwrap();

        let removed = index.remove("ssp").unwrap();
        assert_eq!(removed.profile, "p");
        assert!(index.remove("ssp").is_none());
        assert!(!index.contains("ssp"));

        index.reload().unwrap();
        assert!(index.contains("ssp"));
    }

    #[test]
    fn required_lookups_fail_for_unknown_artifact() {
        let dir = tempdir().unwrap();
        let index = open(dir.path());
        let err = index.lookup_profile("ghost").unwrap_err();
        assert!(matches!(err, IndexError::NotFound { ref artifact } if artifact == "ghost"));
        let err = index.lookup_components("ghost").unwrap_err();
        assert_eq!(err.artifact(), Some("ghost"));
    }

    #[test]
    fn reload_drops_unpersisted_entries() {
        let dir = tempdir().unwrap();
        let mut index = open(dir.path());
        index.add(IndexEntry::new("kept", "p", ["c"]));
        index.write_out().unwrap();
        index.add(IndexEntry::new("dropped", "p", ["c"]));

        index.reload().unwrap();
        assert!(index.contains("kept"));
        assert!(!index.contains("dropped"));
    }

    #[test]
    fn corrupt_reload_leaves_index_empty() {
        let dir = tempdir().unwrap();
        let mut index = open(dir.path());
        index.add(IndexEntry::new("good", "p", ["c"]));
        index.write_out().unwrap();

        fs::write(
            index.path(),
            r#"{"good": {"profile": "p", "component_definitions": ["c"]}, "bad": {"component_definitions": ["c"]}}"#,
        )
        .unwrap();

        let err = index.reload().unwrap_err();
        assert_eq!(err.artifact(), Some("bad"));
        assert!(index.is_empty());
    }

    #[test]
    fn write_out_leaves_no_staging_files() {
        let dir = tempdir().unwrap();
        let mut index = open(dir.path());
        index.add(IndexEntry::new("ssp", "p", ["c"]));
        index.write_out().unwrap();
        index.write_out().unwrap();

        let files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("ssp-index.json")]);
    }
}
