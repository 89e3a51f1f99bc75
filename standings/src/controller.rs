use std::sync::Arc;

use board_api::{Eligibility, EligibilityProbe, EntryDecoration, OwnerId, PopulationScan};
use parking_lot::Mutex;
use rank_store::{FileTableStore, RankStore, RankTable, TableStore};
use rebuild_engine::{RebuildConfig, RebuildEngine, RebuildOutcome, RebuildTicket};

use crate::{
    config::StandingsConfig,
    error::{Result, StandingsError},
};

/// One placement in the ranked view. Ranks are 1-based, assigned purely by
/// descending score order among currently eligible owners, and stable only
/// within a single call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankedEntry {
    pub rank: usize,
    pub owner: OwnerId,
    pub score: i64,
}

/// Lifecycle of the in-memory table. A table becomes `Ready` by loading a
/// persisted record, by completing a rebuild, or by being mutated directly;
/// the first query on an `Uninitialized` table triggers one implicit rebuild
/// and every caller arriving meanwhile waits on the same ticket.
enum TableState {
    Uninitialized,
    Loading(Arc<RebuildTicket>),
    Ready,
}

pub struct StandingsController {
    config: StandingsConfig,
    store: Arc<RankStore>,
    gateway: Arc<dyn TableStore>,
    probe: Arc<dyn EligibilityProbe>,
    rebuild: RebuildEngine,
    decoration: Option<Arc<dyn EntryDecoration>>,
    table_state: Mutex<TableState>,
}

impl StandingsController {
    /// Wires the controller with a file-backed gateway under the config's
    /// state dir.
    pub fn bootstrap(
        config: StandingsConfig,
        probe: Arc<dyn EligibilityProbe>,
        scan: Arc<dyn PopulationScan>,
        decoration: Option<Arc<dyn EntryDecoration>>,
    ) -> Result<Self> {
        config.ensure_dirs()?;
        let gateway = Arc::new(FileTableStore::new(config.table_path()));
        Self::with_gateway(config, gateway, probe, scan, decoration)
    }

    pub fn with_gateway(
        config: StandingsConfig,
        gateway: Arc<dyn TableStore>,
        probe: Arc<dyn EligibilityProbe>,
        scan: Arc<dyn PopulationScan>,
        decoration: Option<Arc<dyn EntryDecoration>>,
    ) -> Result<Self> {
        let (store, table_state) = match gateway.load()? {
            Some(record) => (
                RankStore::from_table(RankTable::from(record)),
                TableState::Ready,
            ),
            None => (RankStore::new(), TableState::Uninitialized),
        };
        let store = Arc::new(store);
        let rebuild = RebuildEngine::new(
            RebuildConfig {
                label: config.label.clone(),
                progress_interval: config.rebuild_progress_interval,
            },
            Arc::clone(&store),
            scan,
            Arc::clone(&gateway),
        );
        Ok(Self {
            config,
            store,
            gateway,
            probe,
            rebuild,
            decoration,
            table_state: Mutex::new(table_state),
        })
    }

    /// Records a score change for an owner. An owner with an explicit
    /// negative eligibility verdict is dropped instead of ranked, keeping the
    /// table bounded by the actually-eligible population.
    pub fn record_score(&self, owner: OwnerId, score: i64) -> Result<()> {
        match self.probe.check(owner) {
            Eligibility::Ineligible => {
                self.store.remove(&owner);
            }
            Eligibility::Eligible | Eligibility::Unknown => {
                self.store.update(owner, score);
            }
        }
        self.mark_ready();
        self.persist()
    }

    /// Removes the owner from the standings.
    pub fn drop_owner(&self, owner: OwnerId) -> Result<()> {
        self.store.remove(&owner);
        self.mark_ready();
        self.persist()
    }

    /// Top `n` currently-eligible owners in descending score order. Owners
    /// observed ineligible are evicted from the live table and skipped;
    /// traversal stops once `n` eligible entries are collected.
    pub fn top_n(&self, n: usize) -> Result<Vec<RankedEntry>> {
        self.ensure_ready()?;
        let snapshot = self.store.snapshot_descending();
        let mut ranked = Vec::with_capacity(n.min(snapshot.len()));
        for entry in snapshot {
            if ranked.len() == n {
                break;
            }
            if self.probe.check(entry.owner) == Eligibility::Ineligible {
                self.store.remove(&entry.owner);
                continue;
            }
            ranked.push(RankedEntry {
                rank: ranked.len() + 1,
                owner: entry.owner,
                score: entry.score,
            });
        }
        Ok(ranked)
    }

    /// Explicit rebuild request; coalesces with any rebuild already running.
    pub fn rebuild(&self) -> Arc<RebuildTicket> {
        let ticket = self.rebuild.trigger();
        let mut state = self.table_state.lock();
        if matches!(*state, TableState::Uninitialized) {
            *state = TableState::Loading(Arc::clone(&ticket));
        }
        ticket
    }

    pub fn cancel_rebuild(&self) {
        self.rebuild.cancel();
    }

    /// Writes the current table through the gateway. A table that was never
    /// loaded, rebuilt, or mutated is not written at all.
    pub fn persist(&self) -> Result<()> {
        if matches!(*self.table_state.lock(), TableState::Uninitialized) {
            return Ok(());
        }
        let record = self.store.export_record();
        self.gateway.save(&record)?;
        Ok(())
    }

    /// Whether the optional per-entry integration offers an action for this
    /// owner. An absent integration means no action, never an error.
    pub fn has_decoration(&self, owner: OwnerId) -> bool {
        self.decoration
            .as_ref()
            .map(|d| d.available_for(owner))
            .unwrap_or(false)
    }

    pub fn score_of(&self, owner: OwnerId) -> Option<i64> {
        self.store.get(&owner)
    }

    pub fn config(&self) -> &StandingsConfig {
        &self.config
    }

    fn mark_ready(&self) {
        let mut state = self.table_state.lock();
        if matches!(*state, TableState::Uninitialized) {
            *state = TableState::Ready;
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        let ticket = {
            let mut state = self.table_state.lock();
            match &*state {
                TableState::Ready => return Ok(()),
                TableState::Loading(ticket) => Arc::clone(ticket),
                TableState::Uninitialized => {
                    let ticket = self.rebuild.trigger();
                    *state = TableState::Loading(Arc::clone(&ticket));
                    ticket
                }
            }
        };

        let outcome = ticket.wait();
        let mut state = self.table_state.lock();
        match outcome {
            RebuildOutcome::Completed { .. } => {
                *state = TableState::Ready;
                Ok(())
            }
            RebuildOutcome::Cancelled => {
                Self::reset_if_same(&mut state, &ticket);
                Err(StandingsError::RebuildCancelled)
            }
            RebuildOutcome::Failed { message } => {
                Self::reset_if_same(&mut state, &ticket);
                Err(StandingsError::RebuildFailed { message })
            }
        }
    }

    /// Returns to `Uninitialized` only if no newer rebuild has taken over the
    /// loading slot in the meantime.
    fn reset_if_same(state: &mut TableState, ticket: &Arc<RebuildTicket>) {
        if let TableState::Loading(current) = state {
            if Arc::ptr_eq(current, ticket) {
                *state = TableState::Uninitialized;
            }
        }
    }
}
