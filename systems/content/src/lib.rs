#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic round content generation.
//!
//! A round plan is an ordered queue of token blueprints: a fixed number of
//! friends that carry the round's friend vector and false friends that are
//! built to look close to it. False friends are either near misses, which
//! differ on exactly one active attribute, or full mismatches. Whatever path
//! produced a false friend, it is re-checked before acceptance so that no
//! false friend ever satisfies the rule.

pub mod attributes;
pub mod seeds;

use false_friends_core::{
    AttributeKind, AttributeValue, AttributeVector, GameConfig, PlayfieldCell, PlayfieldSize,
    RoundNumber, RoundPlan, RuleDefinition, TokenBlueprint, TokenRole, RNG_STREAM_FRIEND,
    RNG_STREAM_SLOTS,
};
use false_friends_system_rules::near_miss_probability;
use rand::{seq::index, Rng};

pub use attributes::AttributeGenerator;

/// Builds round plans for a fixed token count and friend count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentGenerator {
    object_count: u32,
    friend_count: u32,
    playfield: PlayfieldSize,
}

impl ContentGenerator {
    /// Creates a generator using the counts and playfield of `config`.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self::with_counts(config.object_count, config.friend_count, config.playfield)
    }

    /// Creates a generator with explicit counts.
    ///
    /// The friend count is clamped to the object count and the object count to
    /// the playfield capacity.
    #[must_use]
    pub fn with_counts(object_count: u32, friend_count: u32, playfield: PlayfieldSize) -> Self {
        let object_count = object_count.min(playfield.capacity());
        Self {
            object_count,
            friend_count: friend_count.min(object_count),
            playfield,
        }
    }

    /// Tokens per round.
    #[must_use]
    pub const fn object_count(&self) -> u32 {
        self.object_count
    }

    /// Friends per round.
    #[must_use]
    pub const fn friend_count(&self) -> u32 {
        self.friend_count
    }

    /// Builds the plan of `round` from the round seed.
    ///
    /// The friend vector comes from its own labelled stream, so
    /// [`preview_friend`] with the same seed yields the same friend.
    #[must_use]
    pub fn build_round(&self, round: RoundNumber, rule: &RuleDefinition, seed: u64) -> RoundPlan {
        let friend = preview_friend(rule, seed);
        let mut rng = seeds::stream_rng(seed, RNG_STREAM_SLOTS);
        self.generate(round, rule, friend, &mut rng)
    }

    /// Builds the plan of `round` around `friend` using the injected generator.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        round: RoundNumber,
        rule: &RuleDefinition,
        friend: AttributeVector,
        rng: &mut R,
    ) -> RoundPlan {
        let near_miss = near_miss_probability(round);
        let attributes = AttributeGenerator::for_round(round);
        let friend_slots = choose_friend_slots(self.object_count, self.friend_count, rng);
        let cells = self.assign_cells(rng);

        let mut slots = Vec::with_capacity(friend_slots.len());
        for (is_friend, cell) in friend_slots.into_iter().zip(cells) {
            let (role, vector) = if is_friend {
                (TokenRole::Friend, friend)
            } else {
                synthesize_false_friend(rule, &friend, near_miss, &attributes, rng)
            };
            slots.push(TokenBlueprint {
                role,
                attributes: vector,
                cell,
            });
        }

        RoundPlan::new(round, *rule, friend, slots)
    }

    fn assign_cells<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<PlayfieldCell> {
        let capacity = usize::try_from(self.playfield.capacity()).unwrap_or(usize::MAX);
        let count = usize::try_from(self.object_count).unwrap_or(capacity);
        index::sample(rng, capacity, count.min(capacity))
            .into_vec()
            .into_iter()
            .filter_map(|index| u32::try_from(index).ok())
            .map(|index| self.playfield.cell_at(index))
            .collect()
    }
}

/// Friend vector the round seeded by `seed` will use.
#[must_use]
pub fn preview_friend(rule: &RuleDefinition, seed: u64) -> AttributeVector {
    draw_friend_vector(rule, &mut seeds::stream_rng(seed, RNG_STREAM_FRIEND))
}

/// Draws one value per active attribute; inactive attributes keep the fixed
/// value.
pub fn draw_friend_vector<R: Rng + ?Sized>(rule: &RuleDefinition, rng: &mut R) -> AttributeVector {
    let mut friend = AttributeVector::uniform();
    for kind in rule.active().iter() {
        if let Some(pool) = rule.pool_size(kind) {
            let value = rng.gen_range(0..pool.get());
            friend.set(kind, AttributeValue::new(value));
        }
    }
    friend
}

/// Marks `friend_count` of `object_count` slots as friends, chosen uniformly
/// without replacement.
pub fn choose_friend_slots<R: Rng + ?Sized>(
    object_count: u32,
    friend_count: u32,
    rng: &mut R,
) -> Vec<bool> {
    let length = usize::try_from(object_count).unwrap_or(0);
    let amount = usize::try_from(friend_count).unwrap_or(0).min(length);
    let mut mask = vec![false; length];
    for index in index::sample(rng, length, amount).into_vec() {
        mask[index] = true;
    }
    mask
}

/// Builds a false friend for `friend` under `rule`.
///
/// With probability `near_miss_probability` the vector matches every active
/// attribute but one; otherwise it mismatches every active attribute. A rule
/// with a single active attribute always yields a full mismatch.
pub fn synthesize_false_friend<R: Rng + ?Sized>(
    rule: &RuleDefinition,
    friend: &AttributeVector,
    near_miss_probability: f64,
    attributes: &AttributeGenerator,
    rng: &mut R,
) -> (TokenRole, AttributeVector) {
    let active: Vec<AttributeKind> = rule.active().iter().collect();
    let near_miss = active.len() > 1 && rng.gen_bool(near_miss_probability.clamp(0.0, 1.0));
    let differs_on = near_miss.then(|| active[rng.gen_range(0..active.len())]);

    let mut candidate = *friend;
    for &kind in &active {
        let Some(pool) = rule.pool_size(kind) else {
            continue;
        };
        let should_match = differs_on.is_some_and(|differs| differs != kind);
        let value = attributes.generate(kind, pool, friend.get(kind), should_match, rng);
        candidate.set(kind, value);
    }

    let role = match differs_on {
        Some(differs_on) => TokenRole::NearMiss { differs_on },
        None => TokenRole::FullMismatch,
    };

    match ensure_non_matching(rule, friend, candidate, attributes, rng) {
        (vector, Some(mutated)) => (
            TokenRole::NearMiss {
                differs_on: mutated,
            },
            vector,
        ),
        (vector, None) => (role, vector),
    }
}

/// Forces `candidate` off the friend vector if it accidentally satisfies the
/// rule.
///
/// Returns the accepted vector and the attribute that had to be mutated, if
/// any.
pub fn ensure_non_matching<R: Rng + ?Sized>(
    rule: &RuleDefinition,
    friend: &AttributeVector,
    mut candidate: AttributeVector,
    attributes: &AttributeGenerator,
    rng: &mut R,
) -> (AttributeVector, Option<AttributeKind>) {
    if !rule.matches(&candidate, friend) {
        return (candidate, None);
    }

    let active: Vec<AttributeKind> = rule.active().iter().collect();
    let Some(&kind) = active.get(rng.gen_range(0..active.len().max(1))) else {
        return (candidate, None);
    };
    let Some(pool) = rule.pool_size(kind) else {
        return (candidate, None);
    };
    candidate.set(kind, attributes.non_matching(kind, pool, friend.get(kind), rng));
    (candidate, Some(kind))
}
