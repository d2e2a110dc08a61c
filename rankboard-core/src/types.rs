use std::fmt;
use std::str::FromStr;

use crate::error::LeaderboardError;

/// A member as seen by a ranking query.
///
/// Never stored, always computed fresh from the backing store.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedMember {
    pub member: String,
    /// `None` only for `ranked_in_list(.., false)`, which skips the score lookup.
    pub score: Option<f64>,
    /// One-based, in the direction the query was made.
    pub rank: u64,
}

/// Direction of a rank or range query.
///
/// `Descending` puts the highest score first and is what "leaders" means.
/// Ties are ordered lexically by member id in `Ascending` order and exactly
/// reversed in `Descending` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RankOrder {
    #[default]
    Descending,
    Ascending,
}

/// How scores of a member present in several inputs are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Aggregate {
    #[default]
    Sum,
    Min,
    Max,
}

impl Aggregate {
    pub fn apply(self, acc: f64, value: f64) -> f64 {
        match self {
            Aggregate::Sum => acc + value,
            Aggregate::Min => acc.min(value),
            Aggregate::Max => acc.max(value),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregate {
    type Err = LeaderboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregate::Sum),
            "min" => Ok(Aggregate::Min),
            "max" => Ok(Aggregate::Max),
            _ => Err(LeaderboardError::InvalidAggregate(s.to_string())),
        }
    }
}

/// Set-algebra mode for `OrderedStore::combine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombineMode {
    Union,
    Intersect,
}

/// Options for `merge_leaderboards()` / `intersect_leaderboards()`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombineOptions {
    /// One weight per source leaderboard, in the same order as the source names.
    /// `None` weights every source at 1.0. The calling leaderboard is always 1.0.
    pub weights: Option<Vec<f64>>,
    pub aggregate: Aggregate,
}

impl CombineOptions {
    pub fn with_aggregate(aggregate: Aggregate) -> Self {
        CombineOptions { weights: None, aggregate }
    }
}
