/// In-process `OrderedStore`.
///
/// Each leaderboard name maps to a sorted set kept as a hash index (member ->
/// score) plus a `BTreeSet` ordered by (score, member). Every trait method takes
/// the lock once, so each primitive is atomic with respect to the others.
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::RwLock;

use crate::store::{OrderedStore, StoreError, StoreResult};
use crate::types::{Aggregate, CombineMode, RankOrder};

#[derive(Debug, Clone)]
struct Entry {
    score: f64,
    member: String,
}

impl Entry {
    fn new(score: f64, member: &str) -> Self {
        Entry { score, member: member.to_string() }
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.member.cmp(&other.member))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

#[derive(Debug, Default, Clone)]
struct SortedSet {
    scores: HashMap<String, f64>,
    order: BTreeSet<Entry>,
}

impl SortedSet {
    fn from_scores(scores: HashMap<String, f64>) -> Self {
        let order = scores.iter().map(|(m, &s)| Entry::new(s, m)).collect();
        SortedSet { scores, order }
    }

    fn len(&self) -> u64 {
        self.scores.len() as u64
    }

    fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn insert(&mut self, member: &str, score: f64) {
        if let Some(old) = self.scores.insert(member.to_string(), score) {
            self.order.remove(&Entry::new(old, member));
        }
        self.order.insert(Entry::new(score, member));
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(old) => {
                self.order.remove(&Entry::new(old, member));
                true
            }
            None => false,
        }
    }

    fn rank(&self, member: &str, order: RankOrder) -> Option<u64> {
        let score = *self.scores.get(member)?;
        let below = self.order.range(..Entry::new(score, member)).count() as u64;
        Some(match order {
            RankOrder::Ascending => below,
            RankOrder::Descending => self.len() - 1 - below,
        })
    }

    fn range_by_rank(&self, start: u64, end: u64, order: RankOrder) -> Vec<(String, f64)> {
        if start > end || start >= self.len() {
            return Vec::new();
        }
        let end = end.min(self.len() - 1);
        let skip = start as usize;
        let take = (end - start + 1) as usize;
        let pick = |e: &Entry| (e.member.clone(), e.score);
        match order {
            RankOrder::Ascending => self.order.iter().skip(skip).take(take).map(pick).collect(),
            RankOrder::Descending => {
                self.order.iter().rev().skip(skip).take(take).map(pick).collect()
            }
        }
    }

    /// Entries with `min <= score <= max`, ascending.
    fn in_score_range(&self, min: f64, max: f64) -> impl Iterator<Item = &Entry> + '_ {
        // The empty string sorts before every member id, so this is the first
        // entry with score == min.
        let floor = Entry::new(min + 0.0, "");
        let empty = min.is_nan() || max.is_nan() || min > max;
        self.order
            .range(floor..)
            .take_while(move |e| !empty && e.score <= max)
    }
}

/// Serializable copy of every leaderboard in a `MemoryStore`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub leaderboards: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    sets: RwLock<HashMap<String, SortedSet>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot. Empty leaderboards are skipped.
    pub fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        let mut sets = HashMap::with_capacity(snapshot.leaderboards.len());
        for (name, members) in snapshot.leaderboards {
            if members.is_empty() {
                continue;
            }
            let mut scores = HashMap::with_capacity(members.len());
            for (member, score) in members {
                let score = check_score(score).map_err(|e| {
                    StoreError::Backend(format!("snapshot score for {member} in {name}: {e}"))
                })?;
                scores.insert(member, score);
            }
            sets.insert(name, SortedSet::from_scores(scores));
        }
        Ok(MemoryStore { sets: RwLock::new(sets) })
    }

    pub fn snapshot(&self) -> Snapshot {
        let sets = self.sets.read();
        let leaderboards = sets
            .iter()
            .map(|(name, set)| {
                let members = set.scores.iter().map(|(m, &s)| (m.clone(), s)).collect();
                (name.clone(), members)
            })
            .collect();
        Snapshot { leaderboards }
    }

    /// Names of every non-empty leaderboard, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sets.read().keys().cloned().collect();
        names.sort();
        names
    }
}

/// Scores must be finite. `-0.0` is stored as `0.0` so the two tie.
fn check_score(score: f64) -> StoreResult<f64> {
    if score.is_finite() {
        Ok(score + 0.0)
    } else {
        Err(StoreError::Backend(format!("score {score} is not a finite number")))
    }
}

fn weighted(score: f64, weight: f64) -> f64 {
    score * weight + 0.0
}

impl OrderedStore for MemoryStore {
    fn upsert(&self, name: &str, member: &str, score: f64) -> StoreResult<()> {
        let score = check_score(score)?;
        self.sets
            .write()
            .entry(name.to_string())
            .or_default()
            .insert(member, score);
        Ok(())
    }

    fn delete(&self, name: &str, member: &str) -> StoreResult<bool> {
        let mut sets = self.sets.write();
        let Some(set) = sets.get_mut(name) else {
            return Ok(false);
        };
        let removed = set.remove(member);
        if set.is_empty() {
            sets.remove(name);
        }
        Ok(removed)
    }

    fn increment_score(&self, name: &str, member: &str, delta: f64) -> StoreResult<f64> {
        let mut sets = self.sets.write();
        let current = sets
            .get(name)
            .and_then(|set| set.scores.get(member).copied())
            .unwrap_or(0.0);
        let score = check_score(current + delta)?;
        sets.entry(name.to_string()).or_default().insert(member, score);
        Ok(score)
    }

    fn score_of(&self, name: &str, member: &str) -> StoreResult<Option<f64>> {
        Ok(self
            .sets
            .read()
            .get(name)
            .and_then(|set| set.scores.get(member).copied()))
    }

    fn exists(&self, name: &str, member: &str) -> StoreResult<bool> {
        Ok(self
            .sets
            .read()
            .get(name)
            .is_some_and(|set| set.scores.contains_key(member)))
    }

    fn rank(&self, name: &str, member: &str, order: RankOrder) -> StoreResult<Option<u64>> {
        Ok(self.sets.read().get(name).and_then(|set| set.rank(member, order)))
    }

    fn range_by_rank(
        &self,
        name: &str,
        start: u64,
        end: u64,
        order: RankOrder,
    ) -> StoreResult<Vec<(String, f64)>> {
        Ok(self
            .sets
            .read()
            .get(name)
            .map(|set| set.range_by_rank(start, end, order))
            .unwrap_or_default())
    }

    fn range_by_score(
        &self,
        name: &str,
        min: f64,
        max: f64,
        order: RankOrder,
    ) -> StoreResult<Vec<(String, f64)>> {
        let sets = self.sets.read();
        let Some(set) = sets.get(name) else {
            return Ok(Vec::new());
        };
        let pick = |e: &Entry| (e.member.clone(), e.score);
        Ok(match order {
            RankOrder::Ascending => set.in_score_range(min, max).map(pick).collect(),
            RankOrder::Descending => {
                let mut members: Vec<(String, f64)> =
                    set.in_score_range(min, max).map(pick).collect();
                members.reverse();
                members
            }
        })
    }

    fn count_in_score_range(&self, name: &str, min: f64, max: f64) -> StoreResult<u64> {
        Ok(self
            .sets
            .read()
            .get(name)
            .map(|set| set.in_score_range(min, max).count() as u64)
            .unwrap_or(0))
    }

    fn delete_in_score_range(&self, name: &str, min: f64, max: f64) -> StoreResult<u64> {
        let mut sets = self.sets.write();
        let Some(set) = sets.get_mut(name) else {
            return Ok(0);
        };
        let doomed: Vec<String> = set
            .in_score_range(min, max)
            .map(|e| e.member.clone())
            .collect();
        for member in &doomed {
            set.remove(member);
        }
        if set.is_empty() {
            sets.remove(name);
        }
        Ok(doomed.len() as u64)
    }

    fn cardinality(&self, name: &str) -> StoreResult<u64> {
        Ok(self.sets.read().get(name).map(SortedSet::len).unwrap_or(0))
    }

    fn delete_all(&self, name: &str) -> StoreResult<bool> {
        Ok(self.sets.write().remove(name).is_some())
    }

    fn combine(
        &self,
        destination: &str,
        sources: &[&str],
        weights: &[f64],
        aggregate: Aggregate,
        mode: CombineMode,
    ) -> StoreResult<u64> {
        if sources.len() != weights.len() {
            return Err(StoreError::Backend(format!(
                "{} sources but {} weights",
                sources.len(),
                weights.len()
            )));
        }

        let mut sets = self.sets.write();
        let inputs: Vec<(Option<&SortedSet>, f64)> = sources
            .iter()
            .zip(weights)
            .map(|(name, &weight)| (sets.get(*name), weight))
            .collect();

        let mut combined: HashMap<String, f64> = HashMap::new();
        match mode {
            CombineMode::Union => {
                for (set, weight) in inputs.iter().filter_map(|(s, w)| s.map(|s| (s, *w))) {
                    for (member, &score) in &set.scores {
                        let value = weighted(score, weight);
                        combined
                            .entry(member.clone())
                            .and_modify(|acc| *acc = aggregate.apply(*acc, value))
                            .or_insert(value);
                    }
                }
            }
            CombineMode::Intersect => {
                if let Some(present) = inputs
                    .iter()
                    .map(|(s, w)| s.map(|s| (s, *w)))
                    .collect::<Option<Vec<_>>>()
                {
                    if let Some(((first, first_weight), rest)) = present.split_first() {
                        'members: for (member, &score) in &first.scores {
                            let mut acc = weighted(score, *first_weight);
                            for (set, weight) in rest {
                                let Some(&s) = set.scores.get(member) else {
                                    continue 'members;
                                };
                                acc = aggregate.apply(acc, weighted(s, *weight));
                            }
                            combined.insert(member.clone(), acc);
                        }
                    }
                }
            }
        }
        drop(inputs);

        for (member, value) in combined.iter_mut() {
            *value = check_score(*value).map_err(|e| {
                StoreError::Backend(format!("combined score for {member} in {destination}: {e}"))
            })?;
        }

        sets.remove(destination);
        let count = combined.len() as u64;
        if count > 0 {
            sets.insert(destination.to_string(), SortedSet::from_scores(combined));
        }
        tracing::trace!(destination, ?mode, %aggregate, count, "combined sorted sets");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(name: &str, members: &[(&str, f64)]) -> MemoryStore {
        let store = MemoryStore::new();
        for &(member, score) in members {
            store.upsert(name, member, score).unwrap();
        }
        store
    }

    #[test]
    fn test_upsert_overwrites_score() {
        let store = store_with("lb", &[("a", 1.0)]);
        store.upsert("lb", "a", 7.0).unwrap();
        assert_eq!(store.cardinality("lb").unwrap(), 1);
        assert_eq!(store.score_of("lb", "a").unwrap(), Some(7.0));
    }

    #[test]
    fn test_upsert_rejects_nan() {
        let store = MemoryStore::new();
        assert!(store.upsert("lb", "a", f64::NAN).is_err());
        assert_eq!(store.cardinality("lb").unwrap(), 0);
    }

    #[test]
    fn test_ties_order_lexically_and_reverse() {
        let store = store_with(
            "lb",
            &[("carol", 5.0), ("alice", 5.0), ("bob", 5.0), ("dave", 1.0)],
        );
        let asc: Vec<String> = store
            .range_by_rank("lb", 0, 3, RankOrder::Ascending)
            .unwrap()
            .into_iter()
            .map(|(m, _)| m)
            .collect();
        assert_eq!(asc, vec!["dave", "alice", "bob", "carol"]);

        let desc: Vec<String> = store
            .range_by_rank("lb", 0, 3, RankOrder::Descending)
            .unwrap()
            .into_iter()
            .map(|(m, _)| m)
            .collect();
        assert_eq!(desc, vec!["carol", "bob", "alice", "dave"]);

        assert_eq!(store.rank("lb", "alice", RankOrder::Ascending).unwrap(), Some(1));
        assert_eq!(store.rank("lb", "alice", RankOrder::Descending).unwrap(), Some(2));
    }

    #[test]
    fn test_range_by_rank_clamps_and_handles_empty() {
        let store = store_with("lb", &[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        assert_eq!(store.range_by_rank("lb", 1, 99, RankOrder::Descending).unwrap().len(), 2);
        assert!(store.range_by_rank("lb", 3, 5, RankOrder::Descending).unwrap().is_empty());
        assert!(store.range_by_rank("lb", 2, 1, RankOrder::Ascending).unwrap().is_empty());
        assert!(store.range_by_rank("missing", 0, 10, RankOrder::Ascending).unwrap().is_empty());
    }

    #[test]
    fn test_score_range_is_inclusive() {
        let store = store_with(
            "lb",
            &[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0), ("e", 5.0)],
        );
        assert_eq!(store.count_in_score_range("lb", 2.0, 4.0).unwrap(), 3);
        assert_eq!(store.count_in_score_range("lb", 4.0, 2.0).unwrap(), 0);
        let everything = store.count_in_score_range("lb", f64::NEG_INFINITY, f64::INFINITY);
        assert_eq!(everything.unwrap(), 5);

        let desc = store.range_by_score("lb", 2.0, 4.0, RankOrder::Descending).unwrap();
        let expected = vec![
            ("d".to_string(), 4.0),
            ("c".to_string(), 3.0),
            ("b".to_string(), 2.0),
        ];
        assert_eq!(desc, expected);
    }

    #[test]
    fn test_delete_in_score_range() {
        let store = store_with("lb", &[("a", 1.0), ("b", 100.0), ("c", 101.0), ("d", 2.0)]);
        assert_eq!(store.delete_in_score_range("lb", 100.0, 101.0).unwrap(), 2);
        assert_eq!(store.cardinality("lb").unwrap(), 2);
        assert_eq!(store.score_of("lb", "d").unwrap(), Some(2.0));
        assert!(!store.exists("lb", "b").unwrap());
    }

    #[test]
    fn test_empty_set_ceases_to_exist() {
        let store = store_with("lb", &[("a", 1.0)]);
        assert_eq!(store.names(), vec!["lb".to_string()]);
        assert!(store.delete("lb", "a").unwrap());
        assert!(!store.delete("lb", "a").unwrap());
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_increment_creates_and_accumulates() {
        let store = MemoryStore::new();
        assert_eq!(store.increment_score("lb", "a", 3.0).unwrap(), 3.0);
        assert_eq!(store.increment_score("lb", "a", -5.0).unwrap(), -2.0);
        assert_eq!(store.rank("lb", "a", RankOrder::Descending).unwrap(), Some(0));
    }

    #[test]
    fn test_upsert_rejects_infinite_scores() {
        let store = MemoryStore::new();
        assert!(matches!(store.upsert("lb", "a", f64::INFINITY), Err(StoreError::Backend(_))));
        assert!(store.upsert("lb", "a", f64::NEG_INFINITY).is_err());
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_increment_overflow_leaves_score_untouched() {
        let store = store_with("lb", &[("a", f64::MAX)]);
        assert!(store.increment_score("lb", "a", f64::MAX).is_err());
        assert_eq!(store.score_of("lb", "a").unwrap(), Some(f64::MAX));
    }

    #[test]
    fn test_negative_zero_ties_with_zero() {
        let store = store_with("lb", &[("a", 0.0), ("b", -0.0)]);
        assert_eq!(store.count_in_score_range("lb", 0.0, 0.0).unwrap(), 2);
        assert_eq!(store.rank("lb", "a", RankOrder::Ascending).unwrap(), Some(0));
        assert_eq!(store.rank("lb", "b", RankOrder::Ascending).unwrap(), Some(1));
        assert!(store.score_of("lb", "b").unwrap().unwrap().is_sign_positive());

        assert_eq!(store.delete_in_score_range("lb", 0.0, 0.0).unwrap(), 2);
        assert_eq!(store.cardinality("lb").unwrap(), 0);
    }

    #[test]
    fn test_zero_weight_on_negative_score_is_plain_zero() {
        let store = store_with("x", &[("a", 0.0)]);
        store.upsert("y", "b", -4.0).unwrap();
        store
            .combine("xy", &["x", "y"], &[1.0, 0.0], Aggregate::Sum, CombineMode::Union)
            .unwrap();
        assert_eq!(store.count_in_score_range("xy", 0.0, 0.0).unwrap(), 2);
        assert_eq!(store.rank("xy", "b", RankOrder::Ascending).unwrap(), Some(1));
    }

    #[test]
    fn test_combine_overflow_keeps_destination() {
        let store = store_with("x", &[("a", f64::MAX)]);
        store.upsert("y", "a", f64::MAX).unwrap();
        store.upsert("dest", "kept", 1.0).unwrap();
        let err = store
            .combine("dest", &["x", "y"], &[1.0, 1.0], Aggregate::Sum, CombineMode::Union)
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(store.exists("dest", "kept").unwrap());
    }

    #[test]
    fn test_snapshot_rejects_non_finite_and_normalizes_zero() {
        let mut snapshot = Snapshot::default();
        snapshot
            .leaderboards
            .entry("lb".to_string())
            .or_default()
            .insert("z".to_string(), -0.0);
        let store = MemoryStore::from_snapshot(snapshot.clone()).unwrap();
        assert!(store.score_of("lb", "z").unwrap().unwrap().is_sign_positive());

        snapshot
            .leaderboards
            .get_mut("lb")
            .unwrap()
            .insert("inf".to_string(), f64::INFINITY);
        assert!(MemoryStore::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_combine_union_weighted_sum() {
        let store = store_with("x", &[("a", 1.0), ("b", 2.0)]);
        store.upsert("y", "b", 10.0).unwrap();
        store.upsert("y", "c", 20.0).unwrap();

        let count = store
            .combine("xy", &["x", "y"], &[1.0, 0.5], Aggregate::Sum, CombineMode::Union)
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.score_of("xy", "a").unwrap(), Some(1.0));
        assert_eq!(store.score_of("xy", "b").unwrap(), Some(7.0));
        assert_eq!(store.score_of("xy", "c").unwrap(), Some(10.0));
    }

    #[test]
    fn test_combine_intersect_missing_source_is_empty() {
        let store = store_with("x", &[("a", 1.0)]);
        store.upsert("dest", "stale", 1.0).unwrap();
        let count = store
            .combine("dest", &["x", "nope"], &[1.0, 1.0], Aggregate::Max, CombineMode::Intersect)
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(store.cardinality("dest").unwrap(), 0);
    }

    #[test]
    fn test_combine_replaces_destination_that_is_also_a_source() {
        let store = store_with("x", &[("a", 1.0)]);
        store.upsert("y", "a", 2.0).unwrap();
        store.upsert("y", "b", 3.0).unwrap();
        let count = store
            .combine("x", &["x", "y"], &[1.0, 1.0], Aggregate::Min, CombineMode::Intersect)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.score_of("x", "a").unwrap(), Some(1.0));
        assert!(!store.exists("x", "b").unwrap());
    }

    #[test]
    fn test_combine_rejects_weight_mismatch() {
        let store = store_with("x", &[("a", 1.0)]);
        let err = store
            .combine("d", &["x"], &[1.0, 2.0], Aggregate::Sum, CombineMode::Union)
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let store = store_with("x", &[("a", 1.0), ("b", 2.5)]);
        store.upsert("y", "c", -3.0).unwrap();

        let restored = MemoryStore::from_snapshot(store.snapshot()).unwrap();
        assert_eq!(restored.names(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(restored.rank("x", "b", RankOrder::Descending).unwrap(), Some(0));
        assert_eq!(restored.score_of("y", "c").unwrap(), Some(-3.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_snapshot_json_shape() {
        let store = store_with("x", &[("a", 1.0)]);
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json, serde_json::json!({ "leaderboards": { "x": { "a": 1.0 } } }));
    }
}
