//! Full-population rebuild of the standings table.
//!
//! A rebuild folds the population scan into a fresh [`RankTable`] off to the
//! side, swaps it into the live [`RankStore`] in one operation, then persists
//! the result. At most one rebuild runs at a time; concurrent requests join
//! the in-flight one through its [`RebuildTicket`].

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use board_api::PopulationScan;
use log::{error, info, warn};
use parking_lot::{Condvar, Mutex};
use rank_store::{RankStore, RankTable, TableRecord, TableStore};
use uuid::Uuid;

const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

#[derive(Clone)]
pub struct RebuildConfig {
    pub label: String,
    /// Emit a progress line after this many scanned records. Advisory only.
    pub progress_interval: u64,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            label: "dev".to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Population records pulled from the scan.
    pub scanned: u64,
    /// Owner records folded into the fresh table.
    pub kept: u64,
    /// Records dropped for a malformed identifier.
    pub skipped: u64,
}

#[derive(Clone, Debug)]
pub enum RebuildOutcome {
    /// The fresh table was swapped in. `persist_error` reports a save that
    /// failed afterwards; the in-memory table is authoritative either way.
    Completed {
        stats: RebuildStats,
        persist_error: Option<String>,
    },
    /// Cancelled before the swap; the live table was left untouched.
    Cancelled,
    /// The population scan could not be opened.
    Failed { message: String },
}

impl RebuildOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RebuildOutcome::Completed { .. })
    }
}

/// Completion handle shared by every caller of an in-flight rebuild.
/// Resolution is sticky; late waiters return immediately.
pub struct RebuildTicket {
    outcome: Mutex<Option<RebuildOutcome>>,
    resolved: Condvar,
}

impl RebuildTicket {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(None),
            resolved: Condvar::new(),
        })
    }

    fn resolve(&self, outcome: RebuildOutcome) {
        let mut guard = self.outcome.lock();
        *guard = Some(outcome);
        self.resolved.notify_all();
    }

    /// Blocks until the rebuild resolves.
    pub fn wait(&self) -> RebuildOutcome {
        let mut guard = self.outcome.lock();
        loop {
            if let Some(outcome) = guard.as_ref() {
                return outcome.clone();
            }
            self.resolved.wait(&mut guard);
        }
    }

    pub fn outcome(&self) -> Option<RebuildOutcome> {
        self.outcome.lock().clone()
    }
}

pub struct RebuildEngine {
    inner: Arc<RebuildInner>,
}

impl RebuildEngine {
    pub fn new(
        mut config: RebuildConfig,
        store: Arc<RankStore>,
        scan: Arc<dyn PopulationScan>,
        gateway: Arc<dyn TableStore>,
    ) -> Self {
        config.progress_interval = config.progress_interval.max(1);
        Self {
            inner: Arc::new(RebuildInner {
                config,
                store,
                scan,
                gateway,
                state: Mutex::new(RebuildState::Idle),
            }),
        }
    }

    /// Starts a rebuild, or joins the one already in flight.
    pub fn trigger(&self) -> Arc<RebuildTicket> {
        let mut state = self.inner.state.lock();
        if let RebuildState::Running(in_flight) = &*state {
            return Arc::clone(&in_flight.ticket);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let ticket = RebuildTicket::new();
        let runner = Arc::clone(&self.inner);
        let cancel_clone = Arc::clone(&cancel);
        let ticket_clone = Arc::clone(&ticket);
        let spawned = thread::Builder::new()
            .name(format!("{}-rebuild", self.inner.config.label))
            .spawn(move || runner.run(cancel_clone, ticket_clone));
        match spawned {
            Ok(_) => {
                info!("[{}] standings rebuild starting", self.inner.config.label);
                *state = RebuildState::Running(InFlight {
                    cancel,
                    ticket: Arc::clone(&ticket),
                });
            }
            Err(err) => {
                error!(
                    "[{}] failed to spawn rebuild thread: {err}",
                    self.inner.config.label
                );
                ticket.resolve(RebuildOutcome::Failed {
                    message: err.to_string(),
                });
            }
        }
        ticket
    }

    /// Requests cancellation of the in-flight rebuild, if any.
    pub fn cancel(&self) {
        let state = self.inner.state.lock();
        if let RebuildState::Running(in_flight) = &*state {
            in_flight.cancel.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(&*self.inner.state.lock(), RebuildState::Running(_))
    }
}

struct RebuildInner {
    config: RebuildConfig,
    store: Arc<RankStore>,
    scan: Arc<dyn PopulationScan>,
    gateway: Arc<dyn TableStore>,
    state: Mutex<RebuildState>,
}

enum RebuildState {
    Idle,
    Running(InFlight),
}

struct InFlight {
    cancel: Arc<AtomicBool>,
    ticket: Arc<RebuildTicket>,
}

impl RebuildInner {
    fn run(self: Arc<Self>, cancel: Arc<AtomicBool>, ticket: Arc<RebuildTicket>) {
        let outcome = self.execute(&cancel);
        match &outcome {
            RebuildOutcome::Completed {
                stats,
                persist_error,
            } => {
                info!(
                    "[{}] standings rebuild complete: scanned={}, kept={}, skipped={}",
                    self.config.label, stats.scanned, stats.kept, stats.skipped
                );
                if let Some(err) = persist_error {
                    error!("[{}] rebuilt standings not persisted: {err}", self.config.label);
                }
            }
            RebuildOutcome::Cancelled => {
                info!("[{}] standings rebuild cancelled", self.config.label);
            }
            RebuildOutcome::Failed { message } => {
                error!("[{}] standings rebuild failed: {message}", self.config.label);
            }
        }
        *self.state.lock() = RebuildState::Idle;
        ticket.resolve(outcome);
    }

    fn execute(&self, cancel: &AtomicBool) -> RebuildOutcome {
        let records = match self.scan.records() {
            Ok(records) => records,
            Err(err) => {
                return RebuildOutcome::Failed {
                    message: err.to_string(),
                }
            }
        };

        let mut fresh = RankTable::new();
        let mut stats = RebuildStats::default();
        for record in records {
            if cancel.load(Ordering::Relaxed) {
                return RebuildOutcome::Cancelled;
            }
            stats.scanned += 1;
            if stats.scanned % self.config.progress_interval == 0 {
                info!(
                    "[{}] processed {} population records",
                    self.config.label, stats.scanned
                );
            }
            let owner = match Uuid::parse_str(&record.entity_id) {
                Ok(owner) => owner,
                Err(err) => {
                    warn!(
                        "[{}] skipping malformed owner id {:?}: {err}",
                        self.config.label, record.entity_id
                    );
                    stats.skipped += 1;
                    continue;
                }
            };
            if !record.is_owner {
                continue;
            }
            fresh.update(owner, record.score);
            stats.kept += 1;
        }

        let record = TableRecord::from(&fresh);
        self.store.replace_all(fresh);
        let persist_error = match self.gateway.save(&record) {
            Ok(()) => None,
            Err(err) => Some(err.to_string()),
        };
        RebuildOutcome::Completed {
            stats,
            persist_error,
        }
    }
}
