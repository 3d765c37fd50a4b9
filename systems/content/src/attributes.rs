//! Per-attribute value generation with near-miss mutation.

use false_friends_core::{AttributeKind, AttributeValue, PoolSize, PoolTopology, RoundNumber};
use false_friends_system_rules::{near_value_probability, NEAR_VALUE_POOL_THRESHOLD};
use rand::Rng;

/// Produces attribute values that either equal or provably differ from the
/// friend's value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttributeGenerator {
    near_value_probability: f64,
}

impl AttributeGenerator {
    /// Creates a generator using the near-value probability of `round`.
    #[must_use]
    pub fn for_round(round: RoundNumber) -> Self {
        Self::new(near_value_probability(round))
    }

    /// Creates a generator with an explicit near-value probability.
    ///
    /// The probability is clamped into `0.0..=1.0`.
    #[must_use]
    pub fn new(near_value_probability: f64) -> Self {
        Self {
            near_value_probability: near_value_probability.clamp(0.0, 1.0),
        }
    }

    /// Returns the friend's value when `should_match` holds and a
    /// non-matching value otherwise.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        kind: AttributeKind,
        pool: PoolSize,
        friend: AttributeValue,
        should_match: bool,
        rng: &mut R,
    ) -> AttributeValue {
        if should_match {
            return friend;
        }
        self.non_matching(kind, pool, friend, rng)
    }

    /// Draws a value from the pool that never equals `friend`.
    ///
    /// Small pools pick a neighbour of the friend's value with the configured
    /// probability; otherwise the value is uniform over the remaining pool.
    pub fn non_matching<R: Rng + ?Sized>(
        &self,
        kind: AttributeKind,
        pool: PoolSize,
        friend: AttributeValue,
        rng: &mut R,
    ) -> AttributeValue {
        let size = pool.get().max(PoolSize::MIN.get());

        if size <= NEAR_VALUE_POOL_THRESHOLD && rng.gen_bool(self.near_value_probability) {
            if let Some(value) = pick_neighbour(kind, size, friend, rng) {
                return value;
            }
        }

        uniform_other(size, friend, rng)
    }
}

fn pick_neighbour<R: Rng + ?Sized>(
    kind: AttributeKind,
    size: u8,
    friend: AttributeValue,
    rng: &mut R,
) -> Option<AttributeValue> {
    let candidates: Vec<AttributeValue> = neighbours(kind, size, friend)
        .into_iter()
        .flatten()
        .filter(|value| value.get() < size && *value != friend)
        .collect();

    match candidates.as_slice() {
        [] => None,
        [only] => Some(*only),
        many => Some(many[rng.gen_range(0..many.len())]),
    }
}

fn neighbours(
    kind: AttributeKind,
    size: u8,
    friend: AttributeValue,
) -> [Option<AttributeValue>; 2] {
    let value = friend.get();
    match kind.topology() {
        PoolTopology::Linear => [
            value.checked_sub(1).map(AttributeValue::new),
            value
                .checked_add(1)
                .filter(|above| *above < size)
                .map(AttributeValue::new),
        ],
        PoolTopology::Circular => {
            let size = u16::from(size);
            let wrapped = u16::from(value) % size;
            [(wrapped + size - 1) % size, (wrapped + 1) % size]
                .map(|index| u8::try_from(index).ok().map(AttributeValue::new))
        }
    }
}

fn uniform_other<R: Rng + ?Sized>(size: u8, friend: AttributeValue, rng: &mut R) -> AttributeValue {
    let draw = rng.gen_range(0..size - 1);
    if draw >= friend.get() {
        AttributeValue::new(draw + 1)
    } else {
        AttributeValue::new(draw)
    }
}
