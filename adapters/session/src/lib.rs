#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Drives the world and the round scheduler as a single cooperative loop.
//!
//! A [`Session`] is what a front end talks to: it forwards player intent as
//! commands, advances simulated time, and pumps the scheduler until every
//! callback that fell due has been applied.

use std::time::Duration;

use false_friends_core::{Command, ConfigError, Event, GameConfig, TokenId};
use false_friends_system_scheduler::{Config as SchedulerConfig, RoundScheduler};
use false_friends_world::{self as world, query, World};

/// World plus scheduler, advanced together.
#[derive(Debug)]
pub struct Session {
    world: World,
    scheduler: RoundScheduler,
}

impl Session {
    /// Creates an idle session using the default base seed.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        let scheduler = RoundScheduler::new(SchedulerConfig::from_game(&config));
        Ok(Self {
            world: World::new(config)?,
            scheduler,
        })
    }

    /// Creates an idle session whose runs derive from `base_seed`.
    pub fn with_seed(config: GameConfig, base_seed: u64) -> Result<Self, ConfigError> {
        let scheduler = RoundScheduler::new(SchedulerConfig::from_game(&config));
        Ok(Self {
            world: World::with_seed(config, base_seed)?,
            scheduler,
        })
    }

    /// Read-only access to the world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Applies `command` and every scheduler callback it makes due.
    ///
    /// Returns all events broadcast while the loop ran, in order.
    pub fn submit(&mut self, command: Command) -> Vec<Event> {
        tracing::trace!(?command, "submitting command");
        let mut log = Vec::new();
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        loop {
            let mut commands = Vec::new();
            self.scheduler.handle(&events, &mut commands);
            log.append(&mut events);
            if commands.is_empty() {
                break;
            }
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }

        log
    }

    /// Starts a new run, abandoning the current one.
    pub fn start_run(&mut self) -> Vec<Event> {
        self.submit(Command::StartRun)
    }

    /// Abandons the current run and returns to idle.
    pub fn return_to_idle(&mut self) -> Vec<Event> {
        self.submit(Command::ReturnToIdle)
    }

    /// Advances simulated time by `dt`, firing every callback due within it.
    pub fn advance(&mut self, dt: Duration) -> Vec<Event> {
        self.submit(Command::Tick { dt })
    }

    /// Clicks the token with the provided identifier.
    pub fn click(&mut self, token: TokenId) -> Vec<Event> {
        self.submit(Command::ClickToken { token })
    }

    /// Renderable snapshot of the current instant.
    #[must_use]
    pub fn frame(&self) -> query::Frame {
        query::frame(&self.world)
    }

    /// Time until the next scheduled callback, if any.
    #[must_use]
    pub fn until_next_callback(&self) -> Option<Duration> {
        self.scheduler
            .next_due()
            .map(|due| due.saturating_sub(query::clock(&self.world)))
    }
}
