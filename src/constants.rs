/// Default projection horizon for construction what-if simulations.
pub const SIM_HORIZON_TURNS: u32 = 30;

/// Horizon for site growth-rate scoring: rings that take longer than this
/// to come into work contribute nothing.
pub const GROWTH_HORIZON_TURNS: i32 = 50;

/// How many unresearched techs deep the tactics layer looks when generating
/// candidates.
pub const TECH_LOOKAHEAD_DEPTH: u32 = 2;

/// Below this sustainable research rate the player is considered broke and
/// city-site scoring is suppressed entirely.
pub const MIN_RESEARCH_RATE_FOR_EXPANSION: i32 = 30;

/// Below this research rate the selection cascade prefers gold relief over
/// research output.
pub const LOW_RESEARCH_RATE: i32 = 50;

/// Sites whose per-yield-type value falls below this percentage of the best
/// observed site are dropped from ranking.
pub const SITE_YIELD_FILTER_PERCENT: i32 = 40;

/// Two live settlers are never targeted within this step distance of each
/// other.
pub const SETTLER_TARGET_SEPARATION: u32 = 2;

/// Rank cutoff divisor for production-gated tactic branches: a city
/// qualifies when its rank is within the top third.
pub const PRODUCTION_RANK_DIVISOR: usize = 3;

/// Per-turn production treated as high output regardless of the city's
/// rank among its peers.
pub const HIGH_PRODUCTION_OUTPUT: i32 = 10;
