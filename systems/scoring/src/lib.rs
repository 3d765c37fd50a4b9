#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure scoring rules for False Friends runs.

use std::time::Duration;

use false_friends_core::{GameConfig, RoundNumber};

/// Exponent applied to the round number when computing clear bonuses.
const CLEAR_BONUS_EXPONENT: f64 = 1.2;

/// Scoring parameters captured from the game configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scoring {
    visible: Duration,
    clear_bonus_base: u64,
    false_friend_expiry_bonus: u64,
}

impl Scoring {
    /// Creates scoring rules with explicit parameters.
    #[must_use]
    pub const fn new(
        visible: Duration,
        clear_bonus_base: u64,
        false_friend_expiry_bonus: u64,
    ) -> Self {
        Self {
            visible,
            clear_bonus_base,
            false_friend_expiry_bonus,
        }
    }

    /// Creates scoring rules from `config`.
    #[must_use]
    pub const fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config.visible(),
            config.clear_bonus_base,
            config.false_friend_expiry_bonus,
        )
    }

    /// Points for clicking a friend `reaction` after it spawned.
    ///
    /// Equals the milliseconds of visibility left at the click, so an instant
    /// click earns the full visible duration and a click at or after expiry
    /// earns nothing.
    #[must_use]
    pub fn score_friend_click(&self, reaction: Duration) -> u64 {
        let remaining = self.visible.saturating_sub(reaction);
        u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX)
    }

    /// Bonus for clearing `round`: `floor(base * round^1.2)`.
    #[must_use]
    pub fn round_clear_bonus(&self, round: RoundNumber) -> u64 {
        let scaled =
            self.clear_bonus_base as f64 * f64::from(round.get()).powf(CLEAR_BONUS_EXPONENT);
        scaled.floor() as u64
    }

    /// Bonus for letting a false friend expire unclicked.
    #[must_use]
    pub const fn false_friend_expiry_bonus(&self) -> u64 {
        self.false_friend_expiry_bonus
    }
}
