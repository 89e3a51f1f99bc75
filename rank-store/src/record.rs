use std::{
    fs,
    path::{Path, PathBuf},
};

use board_api::OwnerId;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, StoreError},
    table::RankTable,
};

pub const TABLE_SCHEMA_VERSION: u32 = 1;

/// Persisted shape of the whole table: one record under a fixed path, not
/// per-owner rows. Entries are written in descending score order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableRecord {
    pub schema_version: u32,
    pub entries: Vec<TableRecordEntry>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TableRecordEntry {
    pub owner: OwnerId,
    pub score: i64,
}

impl From<&RankTable> for TableRecord {
    fn from(table: &RankTable) -> Self {
        Self {
            schema_version: TABLE_SCHEMA_VERSION,
            entries: table
                .iter_descending()
                .map(|entry| TableRecordEntry {
                    owner: entry.owner,
                    score: entry.score,
                })
                .collect(),
        }
    }
}

impl From<TableRecord> for RankTable {
    fn from(record: TableRecord) -> Self {
        let mut table = RankTable::new();
        for entry in record.entries {
            table.update(entry.owner, entry.score);
        }
        table
    }
}

/// Durable load/save of the table record under a fixed, well-known location.
pub trait TableStore: Send + Sync {
    /// `None` means no record exists yet; callers start from an empty table.
    fn load(&self) -> Result<Option<TableRecord>>;

    /// Persists the full record. There is no partial save path.
    fn save(&self, record: &TableRecord) -> Result<()>;
}

/// File-backed gateway storing the record as a single json document.
pub struct FileTableStore {
    path: PathBuf,
}

impl FileTableStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableStore for FileTableStore {
    fn load(&self) -> Result<Option<TableRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let record: TableRecord = serde_json::from_slice(&bytes)?;
        if record.schema_version != TABLE_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                found: record.schema_version,
                expected: TABLE_SCHEMA_VERSION,
            });
        }
        Ok(Some(record))
    }

    fn save(&self, record: &TableRecord) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(record)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use uuid::Uuid;

    #[test]
    fn save_then_load_round_trips_the_table() {
        let dir = tempdir().unwrap();
        let gateway = FileTableStore::new(dir.path().join("standings.json"));

        let mut table = RankTable::new();
        table.update(Uuid::from_u128(1), 100);
        table.update(Uuid::from_u128(2), -5);
        table.update(Uuid::from_u128(3), i64::MAX);

        gateway.save(&TableRecord::from(&table)).unwrap();
        let loaded = gateway.load().unwrap().expect("record exists");
        assert_eq!(loaded.schema_version, TABLE_SCHEMA_VERSION);
        assert_eq!(RankTable::from(loaded), table);
    }

    #[test]
    fn missing_file_loads_as_absent() {
        let dir = tempdir().unwrap();
        let gateway = FileTableStore::new(dir.path().join("standings.json"));
        assert!(gateway.load().unwrap().is_none());
    }

    #[test]
    fn empty_file_loads_as_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("standings.json");
        fs::write(&path, b"").unwrap();
        assert!(FileTableStore::new(&path).load().unwrap().is_none());
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("standings.json");
        fs::write(&path, br#"{"schema_version":2,"entries":[]}"#).unwrap();

        let err = FileTableStore::new(&path).load().unwrap_err();
        assert!(matches!(
            err,
            StoreError::SchemaMismatch {
                found: 2,
                expected: TABLE_SCHEMA_VERSION
            }
        ));
    }
}
