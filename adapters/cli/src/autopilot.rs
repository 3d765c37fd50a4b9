//! Scripted player used by the headless simulator.

use std::{collections::HashSet, time::Duration};

use false_friends_core::{Phase, TokenId};
use false_friends_world::query::Frame;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Player that judges each token once, after a fixed reaction time.
///
/// Friends are recognised by comparing a token against the rule card, never
/// by peeking at the world's friend flag. False friends are clicked with the
/// configured mistake rate.
#[derive(Debug)]
pub(crate) struct Autopilot {
    reaction: Duration,
    mistake_rate: f64,
    visible: Duration,
    rng: ChaCha8Rng,
    judged: HashSet<TokenId>,
}

impl Autopilot {
    pub(crate) fn new(
        reaction: Duration,
        mistake_rate: f64,
        visible: Duration,
        seed: u64,
    ) -> Self {
        Self {
            reaction,
            mistake_rate: mistake_rate.clamp(0.0, 1.0),
            visible,
            rng: ChaCha8Rng::seed_from_u64(seed),
            judged: HashSet::new(),
        }
    }

    /// Token the player clicks at this instant, if any.
    pub(crate) fn choose(&mut self, frame: &Frame) -> Option<TokenId> {
        if frame.phase != Phase::Playing {
            return None;
        }
        let card = frame.rule_card.as_ref()?;

        for token in &frame.tokens {
            if self.judged.contains(&token.id) {
                continue;
            }
            let seen_for = self.visible.saturating_sub(token.remaining);
            if seen_for < self.reaction {
                continue;
            }
            let _ = self.judged.insert(token.id);

            let looks_right = card.rule().matches(&token.attributes, &card.example());
            if looks_right || self.rng.gen_bool(self.mistake_rate) {
                return Some(token.id);
            }
        }
        None
    }
}
