#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic round scheduler that turns world events into timed commands.
//!
//! The scheduler owns every pending callback of the active run: countdown
//! steps, the rule card dwell, token spawns, token expiries, and the pause
//! between rounds. Each callback is stamped with the run's [`Generation`] and
//! its due time. Callbacks fire strictly in due-time order, ties broken by the
//! order they were scheduled in, and a new generation drops everything still
//! pending from the previous one.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    time::Duration,
};

use false_friends_core::{Command, Event, GameConfig, Generation, TokenId};

/// Configuration parameters required to construct the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    countdown_step: Duration,
    rule_card: Duration,
    round_transition: Duration,
}

impl Config {
    /// Creates a new configuration from explicit phase dwell durations.
    #[must_use]
    pub const fn new(
        countdown_step: Duration,
        rule_card: Duration,
        round_transition: Duration,
    ) -> Self {
        Self {
            countdown_step,
            rule_card,
            round_transition,
        }
    }

    /// Captures the phase dwell durations of `config`.
    #[must_use]
    pub const fn from_game(config: &GameConfig) -> Self {
        Self::new(
            config.countdown_step(),
            config.rule_card(),
            config.round_transition(),
        )
    }
}

/// Pure system that schedules and fires the timed commands of a run.
#[derive(Debug)]
pub struct RoundScheduler {
    config: Config,
    now: Duration,
    generation: Generation,
    next_sequence: u64,
    pending: BinaryHeap<Reverse<Timer>>,
}

impl RoundScheduler {
    /// Creates a new scheduler using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            now: Duration::ZERO,
            generation: Generation::default(),
            next_sequence: 0,
            pending: BinaryHeap::new(),
        }
    }

    /// Simulation time observed through `Event::TimeAdvanced`.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Generation whose callbacks are currently scheduled.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Number of callbacks waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Due time of the next callback, if any.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.peek().map(|Reverse(timer)| timer.due)
    }

    /// Consumes world events and emits the earliest due command, if any.
    ///
    /// At most one command is emitted per call so that callbacks scheduled by
    /// the consequences of that command are ordered against the ones already
    /// pending. Callers keep invoking `handle` until it stops emitting.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            self.observe(event);
        }

        let Some(Reverse(timer)) = self.pending.peek() else {
            return;
        };
        if timer.due > self.now {
            return;
        }

        if let Some(Reverse(timer)) = self.pending.pop() {
            out.push(timer.into_command());
        }
    }

    fn observe(&mut self, event: &Event) {
        match *event {
            Event::TimeAdvanced { dt } => {
                self.now = self.now.saturating_add(dt);
            }
            Event::RunStarted { generation, .. } | Event::ReturnedToIdle { generation } => {
                self.cancel_all(generation);
            }
            Event::RunEnded { generation, .. } => {
                if generation == self.generation {
                    self.cancel_all(generation);
                }
            }
            Event::CountdownTicked { generation, at, .. } => {
                let due = at.saturating_add(self.config.countdown_step);
                self.schedule(generation, due, TimerAction::AdvancePhase);
            }
            Event::RuleCardShown { generation, at, .. } => {
                let due = at.saturating_add(self.config.rule_card);
                self.schedule(generation, due, TimerAction::AdvancePhase);
            }
            Event::RoundStarted {
                generation,
                token_count,
                pacing,
                started_at,
                ..
            } => {
                for slot in 0..token_count {
                    let offset = pacing.spawn_interval.saturating_mul(slot);
                    let due = started_at.saturating_add(offset);
                    self.schedule(generation, due, TimerAction::SpawnToken { slot });
                }
            }
            Event::TokenSpawned {
                generation,
                token,
                expires_at,
                ..
            } => {
                self.schedule(generation, expires_at, TimerAction::ExpireToken { token });
            }
            Event::RoundCleared { generation, at, .. } => {
                let due = at.saturating_add(self.config.round_transition);
                self.schedule(generation, due, TimerAction::AdvancePhase);
            }
            Event::PhaseChanged { .. }
            | Event::FriendClicked { .. }
            | Event::TokenExpired { .. } => {}
        }
    }

    fn schedule(&mut self, generation: Generation, due: Duration, action: TimerAction) {
        if generation != self.generation {
            tracing::trace!(
                ?generation,
                current = ?self.generation,
                "ignoring event from a superseded generation"
            );
            return;
        }

        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.pending.push(Reverse(Timer {
            due,
            sequence,
            generation,
            action,
        }));
    }

    fn cancel_all(&mut self, generation: Generation) {
        if !self.pending.is_empty() {
            tracing::trace!(
                cancelled = self.pending.len(),
                ?generation,
                "dropping pending callbacks"
            );
        }
        self.pending.clear();
        self.generation = generation;
    }
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    due: Duration,
    sequence: u64,
    generation: Generation,
    action: TimerAction,
}

impl Timer {
    fn into_command(self) -> Command {
        let Self {
            due: at,
            generation,
            action,
            ..
        } = self;
        match action {
            TimerAction::AdvancePhase => Command::AdvancePhase { generation, at },
            TimerAction::SpawnToken { slot } => Command::SpawnToken {
                generation,
                slot,
                at,
            },
            TimerAction::ExpireToken { token } => Command::ExpireToken {
                generation,
                token,
                at,
            },
        }
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.sequence).cmp(&(other.due, other.sequence))
    }
}

#[derive(Clone, Copy, Debug)]
enum TimerAction {
    AdvancePhase,
    SpawnToken { slot: u32 },
    ExpireToken { token: TokenId },
}
