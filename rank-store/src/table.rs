use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
};

use board_api::OwnerId;

/// One entry of the ranked view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankEntry {
    pub owner: OwnerId,
    pub score: i64,
}

/// Ordering key for the descending view. Higher scores sort first; equal
/// scores fall back to owner id ascending so traversal order is stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RankKey {
    score: i64,
    owner: OwnerId,
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.owner.cmp(&other.owner))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Mapping from owner to current score plus a derived descending ordering.
/// Both sides are updated together, so the ordering is never stale relative
/// to the last completed mutation.
#[derive(Clone, Debug, Default)]
pub struct RankTable {
    scores: HashMap<OwnerId, i64>,
    order: BTreeSet<RankKey>,
}

impl RankTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the owner or overwrites their previous score.
    pub fn update(&mut self, owner: OwnerId, score: i64) {
        if let Some(previous) = self.scores.insert(owner, score) {
            self.order.remove(&RankKey {
                score: previous,
                owner,
            });
        }
        self.order.insert(RankKey { score, owner });
    }

    /// Deletes the owner's entry. Returns false if it was absent.
    pub fn remove(&mut self, owner: &OwnerId) -> bool {
        match self.scores.remove(owner) {
            Some(score) => {
                self.order.remove(&RankKey {
                    score,
                    owner: *owner,
                });
                true
            }
            None => false,
        }
    }

    pub fn get(&self, owner: &OwnerId) -> Option<i64> {
        self.scores.get(owner).copied()
    }

    pub fn contains(&self, owner: &OwnerId) -> bool {
        self.scores.contains_key(owner)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Entries in descending score order, ties by owner id ascending.
    pub fn iter_descending(&self) -> impl Iterator<Item = RankEntry> + '_ {
        self.order.iter().map(|key| RankEntry {
            owner: key.owner,
            score: key.score,
        })
    }
}

/// Mapping equality: same owners with the same scores.
impl PartialEq for RankTable {
    fn eq(&self, other: &Self) -> bool {
        self.scores == other.scores
    }
}

impl Eq for RankTable {}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn owner(n: u128) -> OwnerId {
        Uuid::from_u128(n)
    }

    #[test]
    fn descending_order_without_duplicates() {
        let mut table = RankTable::new();
        table.update(owner(1), 100);
        table.update(owner(2), 50);
        table.update(owner(3), 75);
        table.update(owner(2), 120);

        let entries: Vec<_> = table.iter_descending().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], RankEntry { owner: owner(2), score: 120 });
        assert_eq!(entries[1], RankEntry { owner: owner(1), score: 100 });
        assert_eq!(entries[2], RankEntry { owner: owner(3), score: 75 });

        let mut seen: Vec<_> = entries.iter().map(|e| e.owner).collect();
        seen.dedup();
        assert_eq!(seen.len(), entries.len());
    }

    #[test]
    fn update_then_remove_leaves_no_trace() {
        let mut table = RankTable::new();
        table.update(owner(7), 10);
        table.update(owner(7), 42);
        assert!(table.remove(&owner(7)));
        assert!(!table.contains(&owner(7)));
        assert_eq!(table.iter_descending().count(), 0);
        assert!(!table.remove(&owner(7)));
    }

    #[test]
    fn equal_scores_break_ties_by_owner_id() {
        let mut table = RankTable::new();
        table.update(owner(9), 50);
        table.update(owner(3), 50);
        table.update(owner(6), 50);

        let owners: Vec<_> = table.iter_descending().map(|e| e.owner).collect();
        assert_eq!(owners, vec![owner(3), owner(6), owner(9)]);
    }

    #[test]
    fn mapping_equality_ignores_insertion_order() {
        let mut a = RankTable::new();
        a.update(owner(1), 10);
        a.update(owner(2), 20);
        let mut b = RankTable::new();
        b.update(owner(2), 20);
        b.update(owner(1), 10);
        assert_eq!(a, b);

        b.update(owner(1), 11);
        assert_ne!(a, b);
    }
}
