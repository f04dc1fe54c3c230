// durable persistence of the mapping table, one atomic unit
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::table::{MappingTable, SlotAssignment};
use crate::core::types::{Sequence, SlotId, SlotStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read mapping table {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Fatal for the whole run: reinitializing would invalidate every
    /// previously published identifier.
    #[error("corrupt mapping table {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to persist mapping table {}: {reason}", .path.display())]
    Persist { path: PathBuf, reason: String },
}

/// Persisted document: two named sections, round-trips every field including
/// orphaned entries.
///
/// ```json
/// {
///   "slot_ids": { "<source_key>": { "id": "1-01", "status": "orphaned" } },
///   "category_counters": { "1": 2 }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
struct MappingDoc {
    slot_ids: BTreeMap<String, SlotEntry>,
    category_counters: BTreeMap<String, Sequence>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SlotEntry {
    id: String,
    status: SlotStatus,
}

pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted table. A missing file is a first run, not an
    /// error; anything unreadable or inconsistent is fatal.
    pub fn load(&self) -> Result<MappingTable, StoreError> {
        if !self.path.exists() {
            return Ok(MappingTable::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        let doc: MappingDoc =
            serde_json::from_str(&contents).map_err(|e| self.corrupt(e.to_string()))?;

        let mut slots = BTreeMap::new();
        for (source_key, entry) in doc.slot_ids {
            let slot_id: SlotId = entry
                .id
                .parse()
                .map_err(|e| self.corrupt(format!("{source_key:?}: {e}")))?;
            slots.insert(
                source_key,
                SlotAssignment {
                    category: slot_id.category,
                    sequence: slot_id.sequence,
                    status: entry.status,
                },
            );
        }

        let mut counters = BTreeMap::new();
        for (category, next_sequence) in doc.category_counters {
            let category = category
                .parse()
                .map_err(|_| self.corrupt(format!("bad counter key {category:?}")))?;
            counters.insert(category, next_sequence);
        }

        MappingTable::from_parts(slots, counters).map_err(|e| self.corrupt(e.to_string()))
    }

    /// Atomically replace the persisted table: write to a temp file in the
    /// destination directory, then rename over the target. Called exactly
    /// once per run, after every decision is final.
    pub fn save(&self, table: &MappingTable) -> Result<(), StoreError> {
        let doc = MappingDoc {
            slot_ids: table
                .iter_slots()
                .map(|(key, slot)| {
                    (
                        key.to_string(),
                        SlotEntry {
                            id: slot.slot_id().to_string(),
                            status: slot.status,
                        },
                    )
                })
                .collect(),
            category_counters: table
                .iter_counters()
                .map(|(c, n)| (c.to_string(), n))
                .collect(),
        };

        let contents = serde_json::to_string_pretty(&doc)
            .map_err(|e| self.persist_err(format!("failed to render document: {e}")))?;

        self.atomic_write(contents.as_bytes())
    }

    fn atomic_write(&self, data: &[u8]) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| self.persist_err("path has no parent directory".to_string()))?;
        fs::create_dir_all(dir)
            .map_err(|e| self.persist_err(format!("failed to create {}: {e}", dir.display())))?;

        let temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            self.persist_err(format!("failed to create temp file in {}: {e}", dir.display()))
        })?;
        fs::write(temp.path(), data)
            .map_err(|e| self.persist_err(format!("failed to write temp file: {e}")))?;
        temp.persist(&self.path)
            .map_err(|e| self.persist_err(e.to_string()))?;

        Ok(())
    }

    fn corrupt(&self, reason: String) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }

    fn persist_err(&self, reason: String) -> StoreError {
        StoreError::Persist {
            path: self.path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> MappingStore {
        MappingStore::new(dir.path().join("data").join("session_id_mapping.json"))
    }

    #[test]
    fn missing_file_loads_an_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let table = store.load().unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn roundtrip_preserves_slots_counters_and_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut table = MappingTable::new();
        table.assign("a", 1).unwrap();
        table.assign("b", 1).unwrap();
        table.assign("c", 2).unwrap();
        // orphan "a" so both statuses are exercised
        let mut seen = BTreeSet::new();
        seen.insert("b".to_string());
        seen.insert("c".to_string());
        table.mark_orphans(&seen);

        store.save(&table).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.get("a").unwrap().status, SlotStatus::Orphaned);
        assert_eq!(loaded.next_sequence(1), 3);
    }

    #[test]
    fn roundtrip_of_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let table = MappingTable::new();
        store.save(&table).unwrap();
        assert_eq!(store.load().unwrap(), table);
    }

    #[test]
    fn save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut table = MappingTable::new();
        table.assign("a", 1).unwrap();
        store.save(&table).unwrap();

        table.assign("b", 1).unwrap();
        store.save(&table).unwrap();

        assert_eq!(store.load().unwrap(), table);
    }

    #[test]
    fn unparsable_document_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn malformed_slot_id_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"{
  "slot_ids": { "a": { "id": "acd101", "status": "active" } },
  "category_counters": { "1": 2 }
}"#,
        )
        .unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn counter_behind_issued_sequence_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        // slot 1-02 exists but the counter claims the next sequence is 2
        fs::write(
            store.path(),
            r#"{
  "slot_ids": { "a": { "id": "1-02", "status": "active" } },
  "category_counters": { "1": 2 }
}"#,
        )
        .unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn persisted_document_uses_the_two_named_sections() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut table = MappingTable::new();
        table.assign("abc-123", 1).unwrap();
        store.save(&table).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["slot_ids"]["abc-123"]["id"], "1-01");
        assert_eq!(value["slot_ids"]["abc-123"]["status"], "active");
        assert_eq!(value["category_counters"]["1"], 2);
    }
}
