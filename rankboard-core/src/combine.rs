/// Merge/intersect planning.
///
/// Turns a caller's source list and options into the exact argument vectors for
/// one `OrderedStore::combine` call. All validation happens here so a bad
/// request never reaches the store.
use crate::constants::DEFAULT_WEIGHT;
use crate::error::{LeaderboardError, Result};
use crate::types::{Aggregate, CombineOptions};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CombinePlan<'a> {
    /// The calling leaderboard first, then the sources in caller order.
    pub sources: Vec<&'a str>,
    /// Parallel to `sources`.
    pub weights: Vec<f64>,
    pub aggregate: Aggregate,
}

pub(crate) fn plan<'a, N: AsRef<str>>(
    own_name: &'a str,
    source_names: &'a [N],
    options: &CombineOptions,
) -> Result<CombinePlan<'a>> {
    let source_weights = match options.weights {
        Some(ref weights) => {
            if weights.len() != source_names.len() {
                return Err(LeaderboardError::InvalidWeights {
                    expected: source_names.len(),
                    actual: weights.len(),
                });
            }
            if let Some(&bad) = weights.iter().find(|w| !w.is_finite()) {
                return Err(LeaderboardError::NonFiniteWeight(bad));
            }
            weights.clone()
        }
        None => vec![DEFAULT_WEIGHT; source_names.len()],
    };

    let mut sources = Vec::with_capacity(source_names.len() + 1);
    sources.push(own_name);
    sources.extend(source_names.iter().map(AsRef::as_ref));

    let mut weights = Vec::with_capacity(sources.len());
    weights.push(DEFAULT_WEIGHT);
    weights.extend(source_weights);

    Ok(CombinePlan {
        sources,
        weights,
        aggregate: options.aggregate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_defaults_to_unit_weights() {
        let plan = plan("foo", &["bar", "baz"], &CombineOptions::default()).unwrap();
        assert_eq!(plan.sources, vec!["foo", "bar", "baz"]);
        assert_eq!(plan.weights, vec![1.0, 1.0, 1.0]);
        assert_eq!(plan.aggregate, Aggregate::Sum);
    }

    #[test]
    fn test_plan_keeps_own_weight_at_one() {
        let options = CombineOptions {
            weights: Some(vec![2.0, 0.5]),
            aggregate: Aggregate::Max,
        };
        let names = vec!["bar".to_string(), "baz".to_string()];
        let plan = plan("foo", &names, &options).unwrap();
        assert_eq!(plan.weights, vec![1.0, 2.0, 0.5]);
        assert_eq!(plan.aggregate, Aggregate::Max);
    }

    #[test]
    fn test_plan_rejects_wrong_weight_count() {
        let options = CombineOptions {
            weights: Some(vec![2.0]),
            aggregate: Aggregate::Sum,
        };
        let err = plan("foo", &["bar", "baz"], &options).unwrap_err();
        assert!(matches!(err, LeaderboardError::InvalidWeights { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_plan_rejects_non_finite_weight() {
        let options = CombineOptions {
            weights: Some(vec![f64::INFINITY]),
            aggregate: Aggregate::Sum,
        };
        let err = plan("foo", &["bar"], &options).unwrap_err();
        assert!(matches!(err, LeaderboardError::NonFiniteWeight(w) if w.is_infinite()));
    }

    #[test]
    fn test_plan_with_no_sources() {
        let plan = plan::<&str>("foo", &[], &CombineOptions::default()).unwrap();
        assert_eq!(plan.sources, vec!["foo"]);
        assert_eq!(plan.weights, vec![1.0]);
    }
}
