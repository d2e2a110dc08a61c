use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, LeaderboardError>;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// Store failures pass through untouched; nothing is retried.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("unknown aggregate rule \"{0}\" (expected sum, min or max)")]
    InvalidAggregate(String),
    #[error("expected {expected} weights (one per source leaderboard), got {actual}")]
    InvalidWeights { expected: usize, actual: usize },
    #[error("weight {0} is not a finite number")]
    NonFiniteWeight(f64),
}
