/// The ordered score store a `Leaderboard` delegates to.
///
/// One logical sorted set per leaderboard name. Every primitive is atomic on
/// its own; the core composes them and never holds state of its own.
use thiserror::Error;

use crate::types::{Aggregate, CombineMode, RankOrder};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (connection loss, timeout).
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store was reached but rejected or failed the request.
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Sorted-set primitives, keyed by leaderboard name.
///
/// Ranks are zero-based. Equal scores order lexically by member id in
/// `RankOrder::Ascending`, and exactly reversed in `RankOrder::Descending`.
/// A name with no members does not exist; the first write creates it.
pub trait OrderedStore: Send + Sync {
    /// Insert `member` or overwrite its score.
    fn upsert(&self, name: &str, member: &str, score: f64) -> StoreResult<()>;

    /// Remove `member`. Returns whether it was present.
    fn delete(&self, name: &str, member: &str) -> StoreResult<bool>;

    /// Atomically add `delta` to the member's score, creating it at `delta`
    /// if absent. Returns the new score.
    fn increment_score(&self, name: &str, member: &str, delta: f64) -> StoreResult<f64>;

    fn score_of(&self, name: &str, member: &str) -> StoreResult<Option<f64>>;

    fn exists(&self, name: &str, member: &str) -> StoreResult<bool>;

    fn rank(&self, name: &str, member: &str, order: RankOrder) -> StoreResult<Option<u64>>;

    /// Members with ranks in `start..=end`, in `order`, with scores.
    /// Bounds past the last member are clamped; an empty range yields nothing.
    fn range_by_rank(
        &self,
        name: &str,
        start: u64,
        end: u64,
        order: RankOrder,
    ) -> StoreResult<Vec<(String, f64)>>;

    /// Members with `min <= score <= max`, in `order`, with scores.
    fn range_by_score(
        &self,
        name: &str,
        min: f64,
        max: f64,
        order: RankOrder,
    ) -> StoreResult<Vec<(String, f64)>>;

    fn count_in_score_range(&self, name: &str, min: f64, max: f64) -> StoreResult<u64>;

    /// Remove every member with `min <= score <= max`. Returns how many went.
    fn delete_in_score_range(&self, name: &str, min: f64, max: f64) -> StoreResult<u64>;

    fn cardinality(&self, name: &str) -> StoreResult<u64>;

    /// Drop the whole set. Returns whether it existed.
    fn delete_all(&self, name: &str) -> StoreResult<bool>;

    /// Weighted union or intersection of `sources` written to `destination`,
    /// replacing whatever was there. `weights` pairs up with `sources`.
    /// Returns the destination's member count.
    fn combine(
        &self,
        destination: &str,
        sources: &[&str],
        weights: &[f64],
        aggregate: Aggregate,
        mode: CombineMode,
    ) -> StoreResult<u64>;
}
