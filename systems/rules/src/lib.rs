#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rule catalog and difficulty ramp for False Friends rounds.
//!
//! Every function here is pure and total over round numbers: the same round
//! always yields the same rule and pacing. Difficulty never decreases as the
//! round number grows, and every quantity is clamped so that arbitrarily deep
//! rounds stay playable.

use std::time::Duration;

use false_friends_core::{
    AttributeKind, AttributeSet, GameConfig, PoolSize, RoundNumber, RoundPacing, RuleDefinition,
    SpawnIntervalCurve, ATTRIBUTE_COUNT,
};

/// Attributes active in the first round.
const INITIAL_ACTIVE_ATTRIBUTES: u32 = 2;
/// Rounds played before another attribute joins the rule.
const ROUNDS_PER_NEW_ATTRIBUTE: u32 = 2;
/// Rounds played before every active pool grows by one value.
const ROUNDS_PER_POOL_STEP: u32 = 3;
/// Rounds played before the minimum hit requirement grows by one.
const ROUNDS_PER_EXTRA_HIT: u32 = 3;

const NEAR_MISS_BASE: f64 = 0.2;
const NEAR_MISS_SLOPE: f64 = 0.05;
/// Upper bound of the near-miss probability.
pub const NEAR_MISS_CAP: f64 = 0.8;

const NEAR_VALUE_BASE: f64 = 0.35;
const NEAR_VALUE_SLOPE: f64 = 0.05;
/// Upper bound of the near-value probability.
pub const NEAR_VALUE_CAP: f64 = 0.9;

/// Pools at or below this size favour values adjacent to the friend's.
pub const NEAR_VALUE_POOL_THRESHOLD: u8 = 4;

/// Returns the rule governing `round`.
#[must_use]
pub fn rule_for_round(round: RoundNumber) -> RuleDefinition {
    let depth = round.depth();
    let active_count = active_attribute_count(depth);
    let active: AttributeSet = AttributeKind::ALL
        .into_iter()
        .take(active_count)
        .collect();

    let mut pools = [PoolSize::MIN; ATTRIBUTE_COUNT];
    for kind in AttributeKind::ALL {
        pools[kind.index()] = pool_size(kind, depth);
    }

    RuleDefinition::new(active, pools)
}

fn active_attribute_count(depth: u32) -> usize {
    let count = INITIAL_ACTIVE_ATTRIBUTES.saturating_add(depth / ROUNDS_PER_NEW_ATTRIBUTE);
    usize::try_from(count)
        .unwrap_or(ATTRIBUTE_COUNT)
        .min(ATTRIBUTE_COUNT)
}

fn pool_size(kind: AttributeKind, depth: u32) -> PoolSize {
    let growth = u8::try_from(depth / ROUNDS_PER_POOL_STEP).unwrap_or(u8::MAX);
    let size = base_pool_size(kind)
        .saturating_add(growth)
        .min(kind.pool_cap());
    PoolSize::new(size)
}

const fn base_pool_size(kind: AttributeKind) -> u8 {
    match kind {
        AttributeKind::Shape | AttributeKind::Color => 3,
        AttributeKind::DotCount | AttributeKind::NotchAngle => 2,
    }
}

/// Delay between consecutive spawns during `round`.
#[must_use]
pub fn spawn_interval(round: RoundNumber, curve: &SpawnIntervalCurve) -> Duration {
    let reduction = curve.step_ms.saturating_mul(u64::from(round.depth()));
    let millis = curve.start_ms.saturating_sub(reduction).max(curve.floor_ms);
    Duration::from_millis(millis)
}

/// Friends the player must click before the queue of `round` drains.
#[must_use]
pub fn minimum_hits(round: RoundNumber, friend_count: u32) -> u32 {
    (1 + round.depth() / ROUNDS_PER_EXTRA_HIT).min(friend_count)
}

/// Probability that a false friend of `round` is built as a near miss.
#[must_use]
pub fn near_miss_probability(round: RoundNumber) -> f64 {
    ramp(round, NEAR_MISS_BASE, NEAR_MISS_SLOPE, NEAR_MISS_CAP)
}

/// Probability that a non-matching value from a small pool is adjacent to the
/// friend's value.
#[must_use]
pub fn near_value_probability(round: RoundNumber) -> f64 {
    ramp(round, NEAR_VALUE_BASE, NEAR_VALUE_SLOPE, NEAR_VALUE_CAP)
}

fn ramp(round: RoundNumber, base: f64, slope: f64, cap: f64) -> f64 {
    (base + slope * f64::from(round.depth())).min(cap)
}

/// Everything the world needs to run a single round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundProfile {
    /// Round the profile describes.
    pub round: RoundNumber,
    /// Rule defining friends.
    pub rule: RuleDefinition,
    /// Timing of the round's tokens.
    pub pacing: RoundPacing,
    /// Friends the player must click to clear the round.
    pub minimum_hits: u32,
}

impl RoundProfile {
    /// Derives the profile of `round` under `config`.
    #[must_use]
    pub fn for_round(round: RoundNumber, config: &GameConfig) -> Self {
        Self {
            round,
            rule: rule_for_round(round),
            pacing: config.pacing(spawn_interval(round, &config.spawn_interval)),
            minimum_hits: minimum_hits(round, config.friend_count),
        }
    }
}
