//! Standings facade over the rank store, eligibility probe, rebuild engine,
//! and persistence gateway.
//!
//! The crate exposes:
//! - [`StandingsController`]: the API other subsystems call.
//! - [`StandingsConfig`]: state-dir layout and tuning knobs.

pub mod config;
pub mod controller;
pub mod error;

pub use config::StandingsConfig;
pub use controller::{RankedEntry, StandingsController};
pub use error::{Result, StandingsError};
pub use rebuild_engine::{RebuildOutcome, RebuildStats, RebuildTicket};
