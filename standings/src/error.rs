use rank_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StandingsError>;

#[derive(Debug, Error)]
pub enum StandingsError {
    #[error("table store error: {0}")]
    Store(#[from] StoreError),
    #[error("standings rebuild failed: {message}")]
    RebuildFailed { message: String },
    #[error("standings rebuild was cancelled before completion")]
    RebuildCancelled,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
