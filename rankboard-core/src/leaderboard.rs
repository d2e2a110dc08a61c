/// A named leaderboard over an `OrderedStore`.
///
/// Holds only its name, a page size and a handle to the store. Every query goes
/// to the store; nothing (not even the member count) is cached here.
use std::sync::Arc;

use tracing::debug;

use crate::combine;
use crate::constants::DEFAULT_PAGE_SIZE;
use crate::error::Result;
use crate::rank;
use crate::store::OrderedStore;
use crate::types::{CombineMode, CombineOptions, RankOrder, RankedMember};

pub struct Leaderboard<S: ?Sized> {
    name: String,
    page_size: usize,
    store: Arc<S>,
}

impl<S: ?Sized> Clone for Leaderboard<S> {
    fn clone(&self) -> Self {
        Leaderboard {
            name: self.name.clone(),
            page_size: self.page_size,
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for Leaderboard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Leaderboard")
            .field("name", &self.name)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl<S: OrderedStore + ?Sized> Leaderboard<S> {
    /// Leaderboard with `DEFAULT_PAGE_SIZE`. The backing set is created by the
    /// first member added; there is no separate create step.
    pub fn new(name: impl Into<String>, store: Arc<S>) -> Self {
        Self::with_page_size(name, store, DEFAULT_PAGE_SIZE)
    }

    /// A page size of 0 is replaced with `DEFAULT_PAGE_SIZE`.
    pub fn with_page_size(name: impl Into<String>, store: Arc<S>, page_size: usize) -> Self {
        Leaderboard {
            name: name.into(),
            page_size: rank::normalize_page_size(page_size),
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Only affects this handle's pagination. 0 resets to `DEFAULT_PAGE_SIZE`.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = rank::normalize_page_size(page_size);
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Membership and score mutation
    // -----------------------------------------------------------------------

    /// Insert `member` or overwrite its score.
    pub fn add_member(&self, member: &str, score: f64) -> Result<()> {
        debug!(leaderboard = %self.name, member, score, "add member");
        self.store.upsert(&self.name, member, score)?;
        Ok(())
    }

    /// Returns whether the member was present. Absent members are not an error.
    pub fn remove_member(&self, member: &str) -> Result<bool> {
        debug!(leaderboard = %self.name, member, "remove member");
        Ok(self.store.delete(&self.name, member)?)
    }

    /// Add `delta` to the member's score in one atomic store call, creating
    /// the member at `delta` if absent. Returns the new score.
    pub fn change_score_for(&self, member: &str, delta: f64) -> Result<f64> {
        debug!(leaderboard = %self.name, member, delta, "change score");
        Ok(self.store.increment_score(&self.name, member, delta)?)
    }

    /// Remove every member whose score is within `min..=max`. Returns how many.
    pub fn remove_members_in_score_range(&self, min: f64, max: f64) -> Result<u64> {
        let removed = self.store.delete_in_score_range(&self.name, min, max)?;
        debug!(leaderboard = %self.name, min, max, removed, "remove score range");
        Ok(removed)
    }

    pub fn check_member(&self, member: &str) -> Result<bool> {
        Ok(self.store.exists(&self.name, member)?)
    }

    /// Drop the whole leaderboard from the store.
    pub fn clear(&self) -> Result<bool> {
        debug!(leaderboard = %self.name, "clear");
        Ok(self.store.delete_all(&self.name)?)
    }

    // -----------------------------------------------------------------------
    // Counts and pagination
    // -----------------------------------------------------------------------

    pub fn total_members(&self) -> Result<u64> {
        Ok(self.store.cardinality(&self.name)?)
    }

    /// At least 1, even for an empty leaderboard.
    pub fn total_pages(&self) -> Result<u64> {
        Ok(rank::total_pages(self.total_members()?, self.page_size))
    }

    pub fn total_members_in_score_range(&self, min: f64, max: f64) -> Result<u64> {
        Ok(self.store.count_in_score_range(&self.name, min, max)?)
    }

    /// Zero-based inclusive store ranks covered by `page` right now.
    pub fn page_bounds(&self, page: i64) -> Result<(u64, u64)> {
        Ok(rank::page_bounds(page, self.total_members()?, self.page_size))
    }

    // -----------------------------------------------------------------------
    // Single-member lookups
    // -----------------------------------------------------------------------

    /// One-based rank, or `None` if the member is absent.
    pub fn rank_for(&self, member: &str, order: RankOrder) -> Result<Option<u64>> {
        Ok(self
            .store
            .rank(&self.name, member, order)?
            .map(rank::to_one_based))
    }

    pub fn score_for(&self, member: &str) -> Result<Option<f64>> {
        Ok(self.store.score_of(&self.name, member)?)
    }

    /// Score and descending rank together. `None` if the member is absent
    /// (or disappears between the two lookups).
    pub fn score_and_rank_for(&self, member: &str) -> Result<Option<RankedMember>> {
        let Some(score) = self.score_for(member)? else {
            return Ok(None);
        };
        let Some(rank) = self.rank_for(member, RankOrder::Descending)? else {
            return Ok(None);
        };
        Ok(Some(RankedMember {
            member: member.to_string(),
            score: Some(score),
            rank,
        }))
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// Highest scores first. Pages outside `1..=total_pages()` clamp.
    pub fn leaders(&self, page: i64) -> Result<Vec<RankedMember>> {
        self.leaders_in_order(page, RankOrder::Descending)
    }

    /// A page in either direction; ranks are one-based in that direction.
    pub fn leaders_in_order(&self, page: i64, order: RankOrder) -> Result<Vec<RankedMember>> {
        let total = self.total_members()?;
        if total == 0 {
            return Ok(Vec::new());
        }
        let (start, end) = rank::page_bounds(page, total, self.page_size);
        let members = self.store.range_by_rank(&self.name, start, end, order)?;
        Ok(ranked_from(start, members))
    }

    /// A window of up to `page_size` members centred on `member` by descending
    /// rank. Empty if the member is absent. Near the bottom the window is cut
    /// short rather than shifted up.
    pub fn around_me(&self, member: &str) -> Result<Vec<RankedMember>> {
        let Some(native_rank) = self.store.rank(&self.name, member, RankOrder::Descending)? else {
            return Ok(Vec::new());
        };
        let total = self.total_members()?;
        let (start, end) = rank::around_bounds(native_rank, total, self.page_size);
        let members = self
            .store
            .range_by_rank(&self.name, start, end, RankOrder::Descending)?;
        Ok(ranked_from(start, members))
    }

    /// Descending rank (and score, if `with_scores`) for each id, in input
    /// order. Ids that are not members are left out.
    pub fn ranked_in_list<N: AsRef<str>>(
        &self,
        members: &[N],
        with_scores: bool,
    ) -> Result<Vec<RankedMember>> {
        let mut ranked = Vec::with_capacity(members.len());
        for member in members {
            let member = member.as_ref();
            let Some(rank) = self.rank_for(member, RankOrder::Descending)? else {
                continue;
            };
            let score = if with_scores {
                match self.score_for(member)? {
                    Some(score) => Some(score),
                    None => continue,
                }
            } else {
                None
            };
            ranked.push(RankedMember {
                member: member.to_string(),
                score,
                rank,
            });
        }
        Ok(ranked)
    }

    /// Members with `min <= score <= max`, highest first, with descending ranks.
    pub fn members_in_score_range(&self, min: f64, max: f64) -> Result<Vec<RankedMember>> {
        let members = self
            .store
            .range_by_score(&self.name, min, max, RankOrder::Descending)?;
        let Some((first, _)) = members.first() else {
            return Ok(Vec::new());
        };
        match self.store.rank(&self.name, first, RankOrder::Descending)? {
            Some(start) => Ok(ranked_from(start, members)),
            None => {
                let ids: Vec<&str> = members.iter().map(|(m, _)| m.as_str()).collect();
                self.ranked_in_list(ids.as_slice(), true)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Combination
    // -----------------------------------------------------------------------

    /// Union of this leaderboard and `sources` into `destination`, replacing it.
    /// Returns the destination's member count.
    pub fn merge_leaderboards<N: AsRef<str>>(
        &self,
        destination: &str,
        sources: &[N],
        options: &CombineOptions,
    ) -> Result<u64> {
        self.combine(destination, sources, options, CombineMode::Union)
    }

    /// Like `merge_leaderboards()`, but only members present in this
    /// leaderboard and every source survive.
    pub fn intersect_leaderboards<N: AsRef<str>>(
        &self,
        destination: &str,
        sources: &[N],
        options: &CombineOptions,
    ) -> Result<u64> {
        self.combine(destination, sources, options, CombineMode::Intersect)
    }

    fn combine<N: AsRef<str>>(
        &self,
        destination: &str,
        sources: &[N],
        options: &CombineOptions,
        mode: CombineMode,
    ) -> Result<u64> {
        let plan = combine::plan(&self.name, sources, options)?;
        let count = self.store.combine(
            destination,
            &plan.sources,
            &plan.weights,
            plan.aggregate,
            mode,
        )?;
        debug!(
            leaderboard = %self.name,
            destination,
            ?mode,
            aggregate = %plan.aggregate,
            sources = plan.sources.len(),
            count,
            "combine leaderboards"
        );
        Ok(count)
    }
}

/// Attach one-based ranks to a contiguous run that starts at native `start`.
fn ranked_from(start: u64, members: Vec<(String, f64)>) -> Vec<RankedMember> {
    members
        .into_iter()
        .enumerate()
        .map(|(offset, (member, score))| RankedMember {
            member,
            score: Some(score),
            rank: rank::to_one_based(start + offset as u64),
        })
        .collect()
}
