//! Seam traits between the standings core and its collaborators.

use thiserror::Error;
use uuid::Uuid;

/// Unique identifier of a ranked owner.
pub type OwnerId = Uuid;

/// Verdict from the eligibility collaborator.
///
/// `Unknown` covers owners the collaborator has never seen (for example,
/// currently offline) as well as collaborator failures; implementations must
/// map both to `Unknown` rather than `Ineligible`. Only an explicit
/// `Ineligible` verdict ever removes an owner from the standings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible,
    Unknown,
}

pub trait EligibilityProbe: Send + Sync {
    fn check(&self, owner: OwnerId) -> Eligibility;
}

/// One record from the authoritative population store.
///
/// The identifier arrives as the backing store's raw string; consumers parse
/// it and skip records that do not hold an [`OwnerId`].
#[derive(Clone, Debug)]
pub struct PopulationRecord {
    pub entity_id: String,
    pub score: i64,
    pub is_owner: bool,
}

/// Full-population iteration supplied by the backing store. Consumed once
/// per rebuild; no ordering is assumed.
pub trait PopulationScan: Send + Sync {
    fn records(&self) -> Result<Box<dyn Iterator<Item = PopulationRecord> + Send + '_>, ScanError>;
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("population scan failed: {source}")]
    Failure {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Optional per-entry capability offered by an unrelated integration.
/// Absence of the integration is a normal, zero-effect state.
pub trait EntryDecoration: Send + Sync {
    fn available_for(&self, owner: OwnerId) -> bool;
}
