use board_api::OwnerId;
use parking_lot::RwLock;

use crate::{
    record::TableRecord,
    table::{RankEntry, RankTable},
};

/// Shared owner of the live [`RankTable`].
///
/// All runtime mutation goes through this type. The rebuild path never
/// mutates the live table in place; it builds a replacement off to the side
/// and swaps it in with [`RankStore::replace_all`].
pub struct RankStore {
    table: RwLock<RankTable>,
}

impl RankStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(RankTable::new()),
        }
    }

    pub fn from_table(table: RankTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Inserts or overwrites the owner's score. Always succeeds.
    pub fn update(&self, owner: OwnerId, score: i64) {
        self.table.write().update(owner, score);
    }

    /// Deletes the owner's entry; no-op if absent.
    pub fn remove(&self, owner: &OwnerId) -> bool {
        self.table.write().remove(owner)
    }

    pub fn get(&self, owner: &OwnerId) -> Option<i64> {
        self.table.read().get(owner)
    }

    pub fn contains(&self, owner: &OwnerId) -> bool {
        self.table.read().contains(owner)
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Point-in-time snapshot in descending score order. Safe to walk while
    /// other threads mutate the store; evictions decided from the snapshot go
    /// back through [`RankStore::remove`].
    pub fn snapshot_descending(&self) -> Vec<RankEntry> {
        self.table.read().iter_descending().collect()
    }

    /// Swaps the entire table in one operation. Readers observe either the
    /// old table or the new one, never a partially replaced state.
    pub fn replace_all(&self, table: RankTable) {
        *self.table.write() = table;
    }

    /// Snapshot for persistence, so storage I/O runs with no lock held.
    pub fn export_record(&self) -> TableRecord {
        TableRecord::from(&*self.table.read())
    }
}

impl Default for RankStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn replace_all_discards_previous_contents() {
        let store = RankStore::new();
        let stale = Uuid::from_u128(1);
        store.update(stale, 999);

        let mut fresh = RankTable::new();
        let kept = Uuid::from_u128(2);
        fresh.update(kept, 5);
        store.replace_all(fresh);

        assert!(!store.contains(&stale));
        assert_eq!(store.get(&kept), Some(5));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_is_detached_from_later_mutations() {
        let store = RankStore::new();
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        store.update(a, 10);
        store.update(b, 20);

        let snapshot = store.snapshot_descending();
        store.remove(&b);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].owner, b);
        assert_eq!(store.snapshot_descending().len(), 1);
    }
}
