/// Page size used when none is given, or when the given one is not positive.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Weight applied to the calling leaderboard's own scores during merge/intersect.
/// Source leaderboards default to the same weight unless the caller supplies one.
pub const DEFAULT_WEIGHT: f64 = 1.0;
