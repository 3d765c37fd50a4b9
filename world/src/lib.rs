#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative run state for False Friends.
//!
//! The world owns the phase machine of a run, the live tokens of the active
//! round, and the score. It never schedules anything itself: timed work
//! arrives as generation-stamped commands, and callbacks stamped with an older
//! generation are dropped without touching the state.

use std::time::Duration;

use false_friends_core::{
    AttributeVector, Command, ConfigError, DeathCause, Event, GameConfig, Generation, Phase,
    PlayfieldCell, RoundNumber, RoundPlan, RuleDefinition, RunStats, TokenId, WELCOME_BANNER,
};
use false_friends_system_content::{
    preview_friend,
    seeds::{derive_round_seed, derive_run_seed},
    ContentGenerator,
};
use false_friends_system_rules::{rule_for_round, RoundProfile};
use false_friends_system_scoring::Scoring;

const DEFAULT_BASE_SEED: u64 = 0x5eed_f41e_0f7e_2d19;

/// Represents the authoritative False Friends world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    base_seed: u64,
    content: ContentGenerator,
    scoring: Scoring,
    clock: Duration,
    generation: Generation,
    next_token_id: u32,
    run: RunState,
}

impl World {
    /// Creates an idle world using the default base seed.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_seed(config, DEFAULT_BASE_SEED)
    }

    /// Creates an idle world whose runs derive their seeds from `base_seed`.
    pub fn with_seed(config: GameConfig, base_seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            banner: WELCOME_BANNER,
            content: ContentGenerator::new(&config),
            scoring: Scoring::from_config(&config),
            config,
            base_seed,
            clock: Duration::ZERO,
            generation: Generation::default(),
            next_token_id: 0,
            run: RunState::idle(),
        })
    }

    fn is_current(&self, generation: Generation, command: &'static str) -> bool {
        if generation == self.generation {
            return true;
        }
        tracing::trace!(
            command,
            ?generation,
            current = ?self.generation,
            "discarding stale callback"
        );
        false
    }

    fn round_seed(&self) -> u64 {
        derive_round_seed(self.run.seed, self.run.round)
    }

    fn change_phase(&mut self, phase: Phase, out_events: &mut Vec<Event>) {
        tracing::debug!(
            from = ?self.run.phase,
            to = ?phase,
            round = self.run.round.get(),
            "phase change"
        );
        self.run.phase = phase;
        out_events.push(Event::PhaseChanged {
            generation: self.generation,
            phase,
            round: self.run.round,
        });
    }

    fn start_run(&mut self, out_events: &mut Vec<Event>) {
        self.generation = self.generation.next();
        let seed = derive_run_seed(self.base_seed, self.generation);
        self.run = RunState::fresh(seed, self.config.countdown_steps);
        out_events.push(Event::RunStarted {
            generation: self.generation,
            seed,
        });
        self.change_phase(Phase::Countdown, out_events);
        out_events.push(Event::CountdownTicked {
            generation: self.generation,
            remaining: self.run.countdown_remaining,
            at: self.clock,
        });
    }

    fn return_to_idle(&mut self, out_events: &mut Vec<Event>) {
        self.generation = self.generation.next();
        self.run = RunState::idle();
        out_events.push(Event::ReturnedToIdle {
            generation: self.generation,
        });
        self.change_phase(Phase::Idle, out_events);
    }

    fn advance_phase(&mut self, at: Duration, out_events: &mut Vec<Event>) {
        match self.run.phase {
            Phase::Countdown => {
                self.run.countdown_remaining = self.run.countdown_remaining.saturating_sub(1);
                if self.run.countdown_remaining == 0 {
                    self.enter_rule_card(at, out_events);
                } else {
                    out_events.push(Event::CountdownTicked {
                        generation: self.generation,
                        remaining: self.run.countdown_remaining,
                        at,
                    });
                }
            }
            Phase::RuleCard => self.enter_playing(at, out_events),
            Phase::Playing => {
                if self.run.active.as_ref().is_some_and(|round| round.resolved) {
                    self.run.round = self.run.round.next();
                    self.enter_rule_card(at, out_events);
                } else {
                    tracing::trace!("ignoring phase advance of an unresolved round");
                }
            }
            Phase::Idle | Phase::Dead => {}
        }
    }

    fn enter_rule_card(&mut self, at: Duration, out_events: &mut Vec<Event>) {
        let round = self.run.round;
        let rule = rule_for_round(round);
        let example = preview_friend(&rule, self.round_seed());
        self.run.active = None;
        self.run.rule_card = Some(RuleCard {
            round,
            rule,
            example,
        });
        self.change_phase(Phase::RuleCard, out_events);
        out_events.push(Event::RuleCardShown {
            generation: self.generation,
            round,
            rule,
            example,
            at,
        });
    }

    fn enter_playing(&mut self, at: Duration, out_events: &mut Vec<Event>) {
        let round = self.run.round;
        let profile = RoundProfile::for_round(round, &self.config);
        let plan = self
            .content
            .build_round(round, &profile.rule, self.round_seed());
        let token_count = u32::try_from(plan.slots().len()).unwrap_or(u32::MAX);
        tracing::debug!(
            round = round.get(),
            token_count,
            minimum_hits = profile.minimum_hits,
            active = profile.rule.active().len(),
            "round generated"
        );
        self.run.active = Some(ActiveRound::new(plan, profile));
        self.change_phase(Phase::Playing, out_events);
        out_events.push(Event::RoundStarted {
            generation: self.generation,
            round,
            token_count,
            pacing: profile.pacing,
            started_at: at,
        });
    }

    fn spawn_token(&mut self, slot: u32, at: Duration, out_events: &mut Vec<Event>) {
        if self.run.phase != Phase::Playing {
            return;
        }
        let id = TokenId::new(self.next_token_id);
        let Some(round) = self.run.active.as_mut() else {
            return;
        };
        let Some(expires_at) = round.spawn(slot, id, at) else {
            tracing::trace!(slot, "ignoring spawn of an unknown or consumed slot");
            return;
        };
        self.next_token_id = self.next_token_id.wrapping_add(1);
        out_events.push(Event::TokenSpawned {
            generation: self.generation,
            token: id,
            slot,
            expires_at,
        });
    }

    fn expire_token(&mut self, token: TokenId, at: Duration, out_events: &mut Vec<Event>) {
        if self.run.phase != Phase::Playing {
            return;
        }
        let Some(expired) = self.run.active.as_mut().and_then(|round| round.take(token)) else {
            return;
        };

        let bonus = if expired.is_friend {
            self.run.stats.friends_missed = self.run.stats.friends_missed.saturating_add(1);
            0
        } else {
            self.run.stats.false_friends_dodged =
                self.run.stats.false_friends_dodged.saturating_add(1);
            self.scoring.false_friend_expiry_bonus()
        };
        self.run.score = self.run.score.saturating_add(bonus);
        out_events.push(Event::TokenExpired {
            generation: self.generation,
            token,
            was_friend: expired.is_friend,
            bonus,
        });
        self.resolve_if_drained(at, out_events);
    }

    fn click_token(&mut self, token: TokenId, out_events: &mut Vec<Event>) {
        if self.run.phase != Phase::Playing {
            return;
        }
        let Some(clicked) = self.run.active.as_mut().and_then(|round| round.take(token)) else {
            tracing::trace!(token = token.get(), "click on a token that is not live");
            return;
        };

        if !clicked.is_friend {
            self.end_run(DeathCause::WrongClick { token }, out_events);
            return;
        }

        let reaction = self.clock.saturating_sub(clicked.spawned_at);
        let points = self.scoring.score_friend_click(reaction);
        self.run.score = self.run.score.saturating_add(points);
        if let Some(round) = self.run.active.as_mut() {
            round.hits = round.hits.saturating_add(1);
        }
        let stats = &mut self.run.stats;
        stats.friends_clicked = stats.friends_clicked.saturating_add(1);
        stats.best_reaction = Some(match stats.best_reaction {
            Some(best) => best.min(reaction),
            None => reaction,
        });
        out_events.push(Event::FriendClicked {
            token,
            reaction,
            points,
        });
        self.resolve_if_drained(self.clock, out_events);
    }

    fn resolve_if_drained(&mut self, at: Duration, out_events: &mut Vec<Event>) {
        let Some(round) = self.run.active.as_mut() else {
            return;
        };
        if round.resolved || !round.is_drained() {
            return;
        }

        let hits = round.hits;
        let required = round.profile.minimum_hits;
        if hits < required {
            self.end_run(DeathCause::QuotaMissed { hits, required }, out_events);
            return;
        }

        round.resolved = true;
        let bonus = self.scoring.round_clear_bonus(self.run.round);
        self.run.score = self.run.score.saturating_add(bonus);
        self.run.rounds_cleared = self.run.rounds_cleared.saturating_add(1);
        tracing::debug!(
            round = self.run.round.get(),
            hits,
            bonus,
            score = self.run.score,
            "round cleared"
        );
        out_events.push(Event::RoundCleared {
            generation: self.generation,
            round: self.run.round,
            hits,
            bonus,
            at,
        });
    }

    fn end_run(&mut self, cause: DeathCause, out_events: &mut Vec<Event>) {
        self.run.active = None;
        self.run.death = Some(cause);
        self.change_phase(Phase::Dead, out_events);
        tracing::info!(
            ?cause,
            score = self.run.score,
            rounds_cleared = self.run.rounds_cleared,
            "run ended"
        );
        out_events.push(Event::RunEnded {
            generation: self.generation,
            cause,
            score: self.run.score,
            rounds_cleared: self.run.rounds_cleared,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartRun => world.start_run(out_events),
        Command::ReturnToIdle => world.return_to_idle(out_events),
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::AdvancePhase { generation, at } => {
            if world.is_current(generation, "advance_phase") {
                world.advance_phase(at, out_events);
            }
        }
        Command::SpawnToken {
            generation,
            slot,
            at,
        } => {
            if world.is_current(generation, "spawn_token") {
                world.spawn_token(slot, at, out_events);
            }
        }
        Command::ExpireToken {
            generation,
            token,
            at,
        } => {
            if world.is_current(generation, "expire_token") {
                world.expire_token(token, at, out_events);
            }
        }
        Command::ClickToken { token } => world.click_token(token, out_events),
    }
}

/// Rule card of the upcoming round together with its example friend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleCard {
    round: RoundNumber,
    rule: RuleDefinition,
    example: AttributeVector,
}

impl RuleCard {
    /// Round the card announces.
    #[must_use]
    pub const fn round(&self) -> RoundNumber {
        self.round
    }

    /// Rule defining friends for the round.
    #[must_use]
    pub const fn rule(&self) -> &RuleDefinition {
        &self.rule
    }

    /// Friend vector the round will use.
    #[must_use]
    pub const fn example(&self) -> AttributeVector {
        self.example
    }

    /// One readable line per active attribute, e.g. `"color: blue"`.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.rule
            .active()
            .iter()
            .map(|kind| format!("{}: {}", kind.name(), kind.describe(self.example.get(kind))))
            .collect()
    }
}

#[derive(Debug)]
struct RunState {
    phase: Phase,
    round: RoundNumber,
    score: u64,
    rounds_cleared: u32,
    stats: RunStats,
    countdown_remaining: u32,
    seed: u64,
    rule_card: Option<RuleCard>,
    active: Option<ActiveRound>,
    death: Option<DeathCause>,
}

impl RunState {
    fn idle() -> Self {
        Self::with_phase(Phase::Idle, 0, 0)
    }

    fn fresh(seed: u64, countdown_steps: u32) -> Self {
        Self::with_phase(Phase::Countdown, seed, countdown_steps)
    }

    fn with_phase(phase: Phase, seed: u64, countdown_remaining: u32) -> Self {
        Self {
            phase,
            round: RoundNumber::FIRST,
            score: 0,
            rounds_cleared: 0,
            stats: RunStats::default(),
            countdown_remaining,
            seed,
            rule_card: None,
            active: None,
            death: None,
        }
    }
}

#[derive(Debug)]
struct ActiveRound {
    plan: RoundPlan,
    profile: RoundProfile,
    spawned: Vec<bool>,
    tokens: Vec<Token>,
    consumed: usize,
    hits: u32,
    resolved: bool,
}

impl ActiveRound {
    fn new(plan: RoundPlan, profile: RoundProfile) -> Self {
        Self {
            spawned: vec![false; plan.slots().len()],
            tokens: Vec::new(),
            consumed: 0,
            hits: 0,
            resolved: false,
            plan,
            profile,
        }
    }

    fn spawn(&mut self, slot: u32, id: TokenId, at: Duration) -> Option<Duration> {
        if self.resolved {
            return None;
        }
        let index = usize::try_from(slot).ok()?;
        let blueprint = *self.plan.slot(slot)?;
        let spawned = self.spawned.get_mut(index)?;
        if *spawned {
            return None;
        }
        *spawned = true;

        let expires_at = at.saturating_add(self.profile.pacing.visible);
        self.tokens.push(Token {
            id,
            is_friend: blueprint.role.is_friend(),
            attributes: blueprint.attributes,
            cell: blueprint.cell,
            spawned_at: at,
            expires_at,
        });
        Some(expires_at)
    }

    fn take(&mut self, id: TokenId) -> Option<Token> {
        let index = self.tokens.iter().position(|token| token.id == id)?;
        self.consumed += 1;
        Some(self.tokens.swap_remove(index))
    }

    fn is_drained(&self) -> bool {
        self.consumed == self.plan.slots().len()
    }
}

#[derive(Clone, Copy, Debug)]
struct Token {
    id: TokenId,
    is_friend: bool,
    attributes: AttributeVector,
    cell: PlayfieldCell,
    spawned_at: Duration,
    expires_at: Duration,
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use false_friends_core::{
        AttributeVector, DeathCause, GameConfig, Generation, Phase, PlayfieldCell, RoundNumber,
        RunStats, TokenId, TokenSnapshot, TokenView,
    };

    use super::{RuleCard, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Current simulation time.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Generation owning the current run, or the idle state.
    #[must_use]
    pub fn generation(world: &World) -> Generation {
        world.generation
    }

    /// Active phase.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.run.phase
    }

    /// Round the run is on.
    #[must_use]
    pub fn round(world: &World) -> RoundNumber {
        world.run.round
    }

    /// Score accumulated by the current run.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.run.score
    }

    /// Rounds cleared by the current run.
    #[must_use]
    pub fn rounds_cleared(world: &World) -> u32 {
        world.run.rounds_cleared
    }

    /// Seed the current run derives its rounds from.
    #[must_use]
    pub fn run_seed(world: &World) -> u64 {
        world.run.seed
    }

    /// Counters accumulated by the current run.
    #[must_use]
    pub fn stats(world: &World) -> RunStats {
        world.run.stats
    }

    /// Reason the run ended, once it has.
    #[must_use]
    pub fn death_cause(world: &World) -> Option<DeathCause> {
        world.run.death
    }

    /// Rule card of the current or most recently announced round.
    #[must_use]
    pub fn rule_card(world: &World) -> Option<&RuleCard> {
        world.run.rule_card.as_ref()
    }

    /// Progress of the round being played.
    #[must_use]
    pub fn round_progress(world: &World) -> Option<RoundProgress> {
        world.run.active.as_ref().map(|round| RoundProgress {
            hits: round.hits,
            minimum_hits: round.profile.minimum_hits,
            consumed: round.consumed,
            total: round.plan.slots().len(),
            resolved: round.resolved,
        })
    }

    /// Captures a read-only view of the live tokens.
    #[must_use]
    pub fn token_view(world: &World) -> TokenView {
        let snapshots = world
            .run
            .active
            .iter()
            .flat_map(|round| round.tokens.iter())
            .map(|token| TokenSnapshot {
                id: token.id,
                is_friend: token.is_friend,
                attributes: token.attributes,
                cell: token.cell,
                spawned_at: token.spawned_at,
                expires_at: token.expires_at,
            })
            .collect();
        TokenView::from_snapshots(snapshots)
    }

    /// Everything a renderer needs to draw the current instant.
    ///
    /// Frame tokens omit the friend flag; only the attributes give a friend
    /// away.
    #[must_use]
    pub fn frame(world: &World) -> Frame {
        let tokens = token_view(world)
            .iter()
            .map(|snapshot| FrameToken {
                id: snapshot.id,
                attributes: snapshot.attributes,
                cell: snapshot.cell,
                remaining: snapshot.expires_at.saturating_sub(world.clock),
            })
            .collect();
        Frame {
            phase: world.run.phase,
            round: world.run.round,
            score: world.run.score,
            rounds_cleared: world.run.rounds_cleared,
            countdown: (world.run.phase == Phase::Countdown)
                .then_some(world.run.countdown_remaining),
            rule_card: world.run.rule_card,
            tokens,
        }
    }

    /// Hit tally of the round being played.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RoundProgress {
        /// Friends clicked so far.
        pub hits: u32,
        /// Friends required to clear the round.
        pub minimum_hits: u32,
        /// Tokens clicked or expired so far.
        pub consumed: usize,
        /// Tokens in the round plan.
        pub total: usize,
        /// Whether the round was cleared and waits for the next rule card.
        pub resolved: bool,
    }

    /// Renderable snapshot of the world.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Frame {
        /// Active phase.
        pub phase: Phase,
        /// Round the run is on.
        pub round: RoundNumber,
        /// Score of the run.
        pub score: u64,
        /// Rounds cleared by the run.
        pub rounds_cleared: u32,
        /// Countdown steps left while counting down.
        pub countdown: Option<u32>,
        /// Rule card of the current or last announced round.
        pub rule_card: Option<RuleCard>,
        /// Live tokens ordered by identifier.
        pub tokens: Vec<FrameToken>,
    }

    /// Renderable state of a live token.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FrameToken {
        /// Identifier clicks refer to.
        pub id: TokenId,
        /// Attribute values the token is drawn with.
        pub attributes: AttributeVector,
        /// Playfield cell the token occupies.
        pub cell: PlayfieldCell,
        /// Visibility left before the token expires.
        pub remaining: Duration,
    }
}
