//! Tunable parameters of a run.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PlayfieldSize, RoundPacing};

/// Every knob the world, the scheduler, and the systems read.
///
/// Durations are expressed in whole milliseconds so the structure maps onto a
/// flat TOML table. Missing fields fall back to [`GameConfig::default`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Key leaderboard entries are grouped under.
    pub key: String,
    /// Tokens spawned per round.
    pub object_count: u32,
    /// Friends among the tokens of a round.
    pub friend_count: u32,
    /// Milliseconds a spawned token remains clickable.
    pub visible_ms: u64,
    /// Spawn interval ramp.
    pub spawn_interval: SpawnIntervalCurve,
    /// Countdown steps shown before the first rule card.
    pub countdown_steps: u32,
    /// Milliseconds per countdown step.
    pub countdown_step_ms: u64,
    /// Milliseconds the rule card stays up before tokens spawn.
    pub rule_card_ms: u64,
    /// Milliseconds between a cleared round and the next rule card.
    pub round_transition_ms: u64,
    /// Base of the round clear bonus.
    pub clear_bonus_base: u64,
    /// Points awarded when a false friend expires unclicked.
    pub false_friend_expiry_bonus: u64,
    /// Cells tokens are placed on.
    pub playfield: PlayfieldSize,
    /// Entries kept per leaderboard.
    pub leaderboard_limit: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            key: "classic".to_owned(),
            object_count: 20,
            friend_count: 4,
            visible_ms: 2_000,
            spawn_interval: SpawnIntervalCurve::default(),
            countdown_steps: 3,
            countdown_step_ms: 1_000,
            rule_card_ms: 2_500,
            round_transition_ms: 800,
            clear_bonus_base: 500,
            false_friend_expiry_bonus: 25,
            playfield: PlayfieldSize::new(6, 5),
            leaderboard_limit: 10,
        }
    }
}

impl GameConfig {
    /// Checks the configuration for values the engine cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.friend_count == 0 {
            return Err(ConfigError::NoFriends);
        }
        if self.friend_count > self.object_count {
            return Err(ConfigError::TooManyFriends {
                friends: self.friend_count,
                objects: self.object_count,
            });
        }
        if self.object_count > self.playfield.capacity() {
            return Err(ConfigError::PlayfieldTooSmall {
                objects: self.object_count,
                cells: self.playfield.capacity(),
            });
        }
        if self.visible_ms == 0 {
            return Err(ConfigError::ZeroDuration("visible_ms"));
        }
        if self.spawn_interval.floor_ms == 0 {
            return Err(ConfigError::ZeroDuration("spawn_interval.floor_ms"));
        }
        if self.spawn_interval.start_ms < self.spawn_interval.floor_ms {
            return Err(ConfigError::IntervalBelowFloor {
                start_ms: self.spawn_interval.start_ms,
                floor_ms: self.spawn_interval.floor_ms,
            });
        }
        if self.countdown_steps == 0 {
            return Err(ConfigError::NoCountdown);
        }
        if self.clear_bonus_base == 0 {
            return Err(ConfigError::ZeroClearBonus);
        }
        Ok(())
    }

    /// Time a spawned token remains clickable.
    #[must_use]
    pub const fn visible(&self) -> Duration {
        Duration::from_millis(self.visible_ms)
    }

    /// Duration of a single countdown step.
    #[must_use]
    pub const fn countdown_step(&self) -> Duration {
        Duration::from_millis(self.countdown_step_ms)
    }

    /// Dwell of the rule card.
    #[must_use]
    pub const fn rule_card(&self) -> Duration {
        Duration::from_millis(self.rule_card_ms)
    }

    /// Pause between a cleared round and the next rule card.
    #[must_use]
    pub const fn round_transition(&self) -> Duration {
        Duration::from_millis(self.round_transition_ms)
    }

    /// Pacing of a round whose spawn interval is `spawn_interval`.
    #[must_use]
    pub const fn pacing(&self, spawn_interval: Duration) -> RoundPacing {
        RoundPacing {
            spawn_interval,
            visible: self.visible(),
        }
    }
}

/// Linear spawn interval ramp clamped to a floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnIntervalCurve {
    /// Interval of the first round in milliseconds.
    pub start_ms: u64,
    /// Milliseconds removed per round.
    pub step_ms: u64,
    /// Shortest interval any round may use.
    pub floor_ms: u64,
}

impl Default for SpawnIntervalCurve {
    fn default() -> Self {
        Self {
            start_ms: 900,
            step_ms: 40,
            floor_ms: 400,
        }
    }
}

/// Reasons a [`GameConfig`] is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A round needs at least one friend.
    #[error("friend_count must be at least 1")]
    NoFriends,
    /// More friends than tokens were requested.
    #[error("friend_count ({friends}) exceeds object_count ({objects})")]
    TooManyFriends {
        /// Requested friends per round.
        friends: u32,
        /// Requested tokens per round.
        objects: u32,
    },
    /// Tokens would have to share playfield cells.
    #[error("object_count ({objects}) exceeds the {cells} playfield cells")]
    PlayfieldTooSmall {
        /// Requested tokens per round.
        objects: u32,
        /// Cells offered by the playfield.
        cells: u32,
    },
    /// A duration that must be positive was zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    /// The spawn interval ramp starts below its own floor.
    #[error("spawn interval start ({start_ms} ms) is below its floor ({floor_ms} ms)")]
    IntervalBelowFloor {
        /// Interval of the first round.
        start_ms: u64,
        /// Interval floor.
        floor_ms: u64,
    },
    /// The countdown has no steps.
    #[error("countdown_steps must be at least 1")]
    NoCountdown,
    /// The clear bonus would never grow.
    #[error("clear_bonus_base must be at least 1")]
    ZeroClearBonus,
}
