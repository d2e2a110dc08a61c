//! rankboard-core: Leaderboards over an ordered score store.
//!
//! Members, scores, one-based ranks, clamped pages, "around me" windows and
//! weighted merge/intersect. The storage itself sits behind the `OrderedStore`
//! trait; `MemoryStore` is the in-process implementation. No IO here.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use rankboard_core::{Leaderboard, MemoryStore, RankOrder};
//!
//! let store = Arc::new(MemoryStore::new());
//! let board = Leaderboard::new("highscores", store);
//!
//! for (member, score) in [("ada", 42.0), ("brian", 17.0), ("cleo", 99.0)] {
//!     board.add_member(member, score)?;
//! }
//!
//! assert_eq!(board.rank_for("ada", RankOrder::Descending)?, Some(2));
//!
//! for m in board.leaders(1)? {
//!     println!("#{} {} {:?}", m.rank, m.member, m.score);
//! }
//! # Ok::<(), rankboard_core::LeaderboardError>(())
//! ```

mod combine;
pub mod constants;
pub mod error;
pub mod leaderboard;
pub mod memory;
pub mod rank;
pub mod store;
pub mod types;

// Re-export primary public API at crate root.
pub use constants::DEFAULT_PAGE_SIZE;
pub use error::{LeaderboardError, Result};
pub use leaderboard::Leaderboard;
pub use memory::{MemoryStore, Snapshot};
pub use store::{OrderedStore, StoreError, StoreResult};
pub use types::{Aggregate, CombineMode, CombineOptions, RankOrder, RankedMember};
