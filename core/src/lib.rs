#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the False Friends engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and the scheduler submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Every timed command carries the
//! [`Generation`] it was scheduled under so that callbacks outliving their run
//! are recognised and discarded.

use std::time::Duration;

use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;

mod config;

pub use config::{ConfigError, GameConfig, SpawnIntervalCurve};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to False Friends.";

/// Label of the random stream that draws a round's friend vector.
pub const RNG_STREAM_FRIEND: &str = "friend";
/// Label of the random stream that lays out friend slots, false friends, and
/// playfield cells.
pub const RNG_STREAM_SLOTS: &str = "slots";

/// Lifecycle phase of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No run is active; the experience waits for a start request.
    Idle,
    /// The pre-run countdown is ticking.
    Countdown,
    /// The rule card for the upcoming round is displayed.
    RuleCard,
    /// Tokens are spawning and the player may click them.
    Playing,
    /// The run ended; only a new start or a return to idle leaves this phase.
    Dead,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Starts a fresh run, abandoning whatever run was in progress.
    StartRun,
    /// Abandons the current run and returns to the idle phase.
    ReturnToIdle,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Completes the dwell of the current phase.
    AdvancePhase {
        /// Generation the callback was scheduled under.
        generation: Generation,
        /// Simulation time the callback was due.
        at: Duration,
    },
    /// Spawns the token occupying the provided slot of the active round.
    SpawnToken {
        /// Generation the callback was scheduled under.
        generation: Generation,
        /// Zero-based slot index within the round plan.
        slot: u32,
        /// Simulation time the spawn was due.
        at: Duration,
    },
    /// Expires a spawned token that was not clicked in time.
    ExpireToken {
        /// Generation the callback was scheduled under.
        generation: Generation,
        /// Token whose visibility elapsed.
        token: TokenId,
        /// Simulation time the expiry was due.
        at: Duration,
    },
    /// Player clicked the token with the provided identifier.
    ClickToken {
        /// Token targeted by the click.
        token: TokenId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a new run began under a fresh generation.
    RunStarted {
        /// Generation that owns the new run.
        generation: Generation,
        /// Seed every round of the run derives from.
        seed: u64,
    },
    /// Announces that the world returned to idle under a fresh generation.
    ReturnedToIdle {
        /// Generation that invalidated every pending callback.
        generation: Generation,
    },
    /// Announces the phase that became active after processing a command.
    PhaseChanged {
        /// Generation of the run that changed phase.
        generation: Generation,
        /// Newly active phase.
        phase: Phase,
        /// Round the run is on after the change.
        round: RoundNumber,
    },
    /// Reports a countdown step; the final step is followed by the rule card.
    CountdownTicked {
        /// Generation of the counting run.
        generation: Generation,
        /// Countdown steps left before the rule card appears.
        remaining: u32,
        /// Simulation time the step started.
        at: Duration,
    },
    /// Reports that the rule card for a round is shown.
    RuleCardShown {
        /// Generation of the run.
        generation: Generation,
        /// Round the rule governs.
        round: RoundNumber,
        /// Rule that defines friends for the round.
        rule: RuleDefinition,
        /// Friend vector the round will use, rendered as an example.
        example: AttributeVector,
        /// Simulation time the card appeared.
        at: Duration,
    },
    /// Reports that a round's token queue is ready to be spawned.
    RoundStarted {
        /// Generation of the run.
        generation: Generation,
        /// Round that started.
        round: RoundNumber,
        /// Number of token slots that will spawn.
        token_count: u32,
        /// Timing applied to the round's tokens.
        pacing: RoundPacing,
        /// Simulation time the round started.
        started_at: Duration,
    },
    /// Confirms that a token appeared on the playfield.
    TokenSpawned {
        /// Generation of the run.
        generation: Generation,
        /// Identifier assigned to the token.
        token: TokenId,
        /// Slot of the round plan the token came from.
        slot: u32,
        /// Simulation time the token expires unless clicked.
        expires_at: Duration,
    },
    /// Confirms that a friend was clicked and scored.
    FriendClicked {
        /// Token that was clicked.
        token: TokenId,
        /// Time elapsed between spawn and click.
        reaction: Duration,
        /// Points awarded for the click.
        points: u64,
    },
    /// Confirms that a token expired without being clicked.
    TokenExpired {
        /// Generation of the run.
        generation: Generation,
        /// Token that expired.
        token: TokenId,
        /// Whether the expired token was a friend.
        was_friend: bool,
        /// Points awarded for the expiry.
        bonus: u64,
    },
    /// Reports that the round's queue drained with enough hits.
    RoundCleared {
        /// Generation of the run.
        generation: Generation,
        /// Round that was cleared.
        round: RoundNumber,
        /// Friends clicked during the round.
        hits: u32,
        /// Clear bonus added to the score.
        bonus: u64,
        /// Simulation time the round resolved.
        at: Duration,
    },
    /// Reports that the run ended.
    RunEnded {
        /// Generation of the run that ended.
        generation: Generation,
        /// Reason the run ended.
        cause: DeathCause,
        /// Final score of the run.
        score: u64,
        /// Number of rounds cleared before the run ended.
        rounds_cleared: u32,
    },
}

/// Reason a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// The player clicked a false friend.
    WrongClick {
        /// False friend that was clicked.
        token: TokenId,
    },
    /// The token queue drained before the player reached the minimum hits.
    QuotaMissed {
        /// Friends clicked during the round.
        hits: u32,
        /// Friends the round required.
        required: u32,
    },
}

/// Raw values that do not describe a valid contract value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Round numbers start at one.
    #[error("round numbers start at 1")]
    ZeroRound,
    /// The attribute bitmask names attributes beyond the known ones.
    #[error("attribute set {0:#010b} names unknown attributes")]
    UnknownAttributes(u8),
    /// A rule without active attributes matches every token.
    #[error("a rule needs at least one active attribute")]
    NoActiveAttribute,
    /// An active pool cannot hold both a friend and a non-matching value.
    #[error("{kind} pool of {size} values is outside {min}..={cap}")]
    PoolOutOfRange {
        /// Name of the offending attribute.
        kind: &'static str,
        /// Pool size found.
        size: u8,
        /// Smallest allowed pool.
        min: u8,
        /// Largest pool the attribute can express.
        cap: u8,
    },
}

/// Counter invalidating callbacks scheduled by earlier runs.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Generation(u64);

impl Generation {
    /// Creates a generation from its numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the generation.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the generation that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// One-based round number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32")]
pub struct RoundNumber(u32);

impl RoundNumber {
    /// First round of every run.
    pub const FIRST: Self = Self(1);

    /// Creates a round number.
    ///
    /// # Panics
    ///
    /// Panics when `value` is zero; rounds are numbered from one.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        assert!(value >= 1, "round numbers start at 1");
        Self(value)
    }

    /// Retrieves the one-based numeric value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Number of rounds preceding this one.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.0.saturating_sub(1)
    }

    /// Returns the round that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl TryFrom<u32> for RoundNumber {
    type Error = ContractError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(ContractError::ZeroRound);
        }
        Ok(Self(value))
    }
}

/// Unique identifier assigned to a spawned token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(u32);

impl TokenId {
    /// Creates a new token identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Visual attributes a token is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Outline of the token.
    Shape,
    /// Fill colour of the token.
    Color,
    /// Number of dots printed on the token.
    DotCount,
    /// Angle of the notch cut into the token's rim.
    NotchAngle,
}

const SHAPE_NAMES: [&str; 6] = ["circle", "triangle", "square", "diamond", "pentagon", "star"];
const COLOR_NAMES: [&str; 6] = ["red", "blue", "green", "yellow", "purple", "orange"];
const NOTCH_STEP_DEGREES: u32 = 45;

impl AttributeKind {
    /// Every attribute in canonical order.
    pub const ALL: [Self; ATTRIBUTE_COUNT] =
        [Self::Shape, Self::Color, Self::DotCount, Self::NotchAngle];

    /// Position of the attribute within [`AttributeKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Shape => 0,
            Self::Color => 1,
            Self::DotCount => 2,
            Self::NotchAngle => 3,
        }
    }

    /// Short lowercase name of the attribute.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Shape => "shape",
            Self::Color => "color",
            Self::DotCount => "dots",
            Self::NotchAngle => "notch",
        }
    }

    /// Largest number of distinct values the attribute can express.
    #[must_use]
    pub const fn pool_cap(self) -> u8 {
        match self {
            Self::Shape => SHAPE_NAMES.len() as u8,
            Self::Color => COLOR_NAMES.len() as u8,
            Self::DotCount => 5,
            Self::NotchAngle => (360 / NOTCH_STEP_DEGREES) as u8,
        }
    }

    /// How values of the attribute are ordered relative to each other.
    ///
    /// Notch angles wrap around the rim, so the first and last angle are
    /// neighbours; every other attribute is ordered along a line.
    #[must_use]
    pub const fn topology(self) -> PoolTopology {
        match self {
            Self::NotchAngle => PoolTopology::Circular,
            Self::Shape | Self::Color | Self::DotCount => PoolTopology::Linear,
        }
    }

    /// Human-readable description of a value, used on rule cards.
    #[must_use]
    pub fn describe(self, value: AttributeValue) -> String {
        let index = usize::from(value.get());
        match self {
            Self::Shape => SHAPE_NAMES.get(index).copied().unwrap_or("?").to_owned(),
            Self::Color => COLOR_NAMES.get(index).copied().unwrap_or("?").to_owned(),
            Self::DotCount => match index + 1 {
                1 => "1 dot".to_owned(),
                dots => format!("{dots} dots"),
            },
            Self::NotchAngle => format!("{}°", u32::from(value.get()) * NOTCH_STEP_DEGREES),
        }
    }
}

/// Number of attributes every token carries.
pub const ATTRIBUTE_COUNT: usize = 4;

/// Ordering of the values inside an attribute pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolTopology {
    /// Values form a line; the ends have a single neighbour.
    Linear,
    /// Values form a ring; every value has two neighbours.
    Circular,
}

/// Zero-based index of a value inside an attribute pool.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AttributeValue(u8);

impl AttributeValue {
    /// Creates a value from its pool index.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Retrieves the pool index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// One concrete value per attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeVector([AttributeValue; ATTRIBUTE_COUNT]);

impl AttributeVector {
    /// Creates a vector whose attributes all hold the fixed inactive value.
    #[must_use]
    pub const fn uniform() -> Self {
        Self([AttributeValue::new(0); ATTRIBUTE_COUNT])
    }

    /// Value held for the provided attribute.
    #[must_use]
    pub const fn get(&self, kind: AttributeKind) -> AttributeValue {
        self.0[kind.index()]
    }

    /// Replaces the value held for the provided attribute.
    pub fn set(&mut self, kind: AttributeKind, value: AttributeValue) {
        self.0[kind.index()] = value;
    }

    /// Returns a copy with the provided attribute replaced.
    #[must_use]
    pub fn with(mut self, kind: AttributeKind, value: AttributeValue) -> Self {
        self.set(kind, value);
        self
    }
}

/// Subset of [`AttributeKind`] values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct AttributeSet(u8);

impl AttributeSet {
    /// Set containing no attributes.
    pub const EMPTY: Self = Self(0);

    /// Returns a copy of the set that also contains `kind`.
    #[must_use]
    pub const fn with(self, kind: AttributeKind) -> Self {
        Self(self.0 | (1 << kind.index()))
    }

    /// Reports whether `kind` belongs to the set.
    #[must_use]
    pub const fn contains(&self, kind: AttributeKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    /// Number of attributes in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Reports whether the set contains no attributes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Reports whether every attribute of `other` belongs to this set.
    #[must_use]
    pub const fn is_superset_of(&self, other: AttributeSet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Iterates the contained attributes in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = AttributeKind> + '_ {
        AttributeKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl TryFrom<u8> for AttributeSet {
    type Error = ContractError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        if bits >> ATTRIBUTE_COUNT != 0 {
            return Err(ContractError::UnknownAttributes(bits));
        }
        Ok(Self(bits))
    }
}

impl FromIterator<AttributeKind> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = AttributeKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// Number of distinct values an attribute may take during a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolSize(u8);

impl PoolSize {
    /// Smallest pool that still leaves a non-matching value.
    pub const MIN: Self = Self(2);

    /// Creates a pool size descriptor.
    #[must_use]
    pub const fn new(size: u8) -> Self {
        Self(size)
    }

    /// Retrieves the number of values in the pool.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Defines which attributes a friend must match during one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RuleDefinition {
    active: AttributeSet,
    pools: [PoolSize; ATTRIBUTE_COUNT],
}

impl RuleDefinition {
    /// Creates a rule from its active attributes and per-attribute pool sizes.
    ///
    /// Pool sizes of inactive attributes are ignored.
    #[must_use]
    pub fn new(active: AttributeSet, pools: [PoolSize; ATTRIBUTE_COUNT]) -> Self {
        debug_assert!(!active.is_empty(), "a rule needs an active attribute");
        debug_assert!(
            active
                .iter()
                .all(|kind| pools[kind.index()] >= PoolSize::MIN),
            "active pools must offer a non-matching value"
        );
        Self { active, pools }
    }

    /// Creates a rule after checking that it can tell friends apart.
    ///
    /// At least one attribute must be active, and every active pool must hold
    /// between [`PoolSize::MIN`] and the attribute's cap values.
    pub fn try_new(
        active: AttributeSet,
        pools: [PoolSize; ATTRIBUTE_COUNT],
    ) -> Result<Self, ContractError> {
        if active.is_empty() {
            return Err(ContractError::NoActiveAttribute);
        }
        for kind in active.iter() {
            let size = pools[kind.index()].get();
            if size < PoolSize::MIN.get() || size > kind.pool_cap() {
                return Err(ContractError::PoolOutOfRange {
                    kind: kind.name(),
                    size,
                    min: PoolSize::MIN.get(),
                    cap: kind.pool_cap(),
                });
            }
        }
        Ok(Self { active, pools })
    }

    /// Attributes that matter this round.
    #[must_use]
    pub const fn active(&self) -> AttributeSet {
        self.active
    }

    /// Pool size of `kind`, or `None` when the attribute is inactive.
    #[must_use]
    pub fn pool_size(&self, kind: AttributeKind) -> Option<PoolSize> {
        self.active
            .contains(kind)
            .then_some(self.pools[kind.index()])
    }

    /// Reports whether `candidate` equals `friend` on every active attribute.
    #[must_use]
    pub fn matches(&self, candidate: &AttributeVector, friend: &AttributeVector) -> bool {
        self.active
            .iter()
            .all(|kind| candidate.get(kind) == friend.get(kind))
    }

    /// Active attributes on which `candidate` differs from `friend`.
    pub fn mismatches<'a>(
        &'a self,
        candidate: &'a AttributeVector,
        friend: &'a AttributeVector,
    ) -> impl Iterator<Item = AttributeKind> + 'a {
        self.active
            .iter()
            .filter(move |kind| candidate.get(*kind) != friend.get(*kind))
    }
}

impl<'de> Deserialize<'de> for RuleDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename = "RuleDefinition")]
        struct Raw {
            active: AttributeSet,
            pools: [PoolSize; ATTRIBUTE_COUNT],
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::try_new(raw.active, raw.pools).map_err(de::Error::custom)
    }
}

/// Location of a playfield cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayfieldCell {
    column: u32,
    row: u32,
}

impl PlayfieldCell {
    /// Creates a new playfield cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Dimensions of the playfield measured in token cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayfieldSize {
    columns: u32,
    rows: u32,
}

impl PlayfieldSize {
    /// Creates a new playfield size.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of cell columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of cell rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells a token may occupy.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.columns.saturating_mul(self.rows)
    }

    /// Converts a row-major cell index into a coordinate.
    #[must_use]
    pub const fn cell_at(&self, index: u32) -> PlayfieldCell {
        PlayfieldCell::new(index % self.columns, index / self.columns)
    }
}

/// Role a slot of the round plan plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenRole {
    /// Token matching the rule; the only valid click target.
    Friend,
    /// False friend differing from the friend on a single active attribute.
    NearMiss {
        /// Attribute that gives the false friend away.
        differs_on: AttributeKind,
    },
    /// False friend differing from the friend on every active attribute.
    FullMismatch,
}

impl TokenRole {
    /// Reports whether the role is [`TokenRole::Friend`].
    #[must_use]
    pub const fn is_friend(&self) -> bool {
        matches!(self, Self::Friend)
    }
}

/// Blueprint of a token before it spawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TokenBlueprint {
    /// Whether the token is a friend, and how a false friend was built.
    pub role: TokenRole,
    /// Attribute values the token is drawn with.
    pub attributes: AttributeVector,
    /// Playfield cell the token occupies.
    pub cell: PlayfieldCell,
}

/// Ordered token queue generated for a single round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundPlan {
    round: RoundNumber,
    rule: RuleDefinition,
    friend: AttributeVector,
    slots: Vec<TokenBlueprint>,
}

impl RoundPlan {
    /// Assembles a plan from generated parts.
    #[must_use]
    pub fn new(
        round: RoundNumber,
        rule: RuleDefinition,
        friend: AttributeVector,
        slots: Vec<TokenBlueprint>,
    ) -> Self {
        Self {
            round,
            rule,
            friend,
            slots,
        }
    }

    /// Round the plan was generated for.
    #[must_use]
    pub const fn round(&self) -> RoundNumber {
        self.round
    }

    /// Rule the plan was generated under.
    #[must_use]
    pub const fn rule(&self) -> &RuleDefinition {
        &self.rule
    }

    /// Friend vector every friend slot carries.
    #[must_use]
    pub const fn friend(&self) -> AttributeVector {
        self.friend
    }

    /// Token blueprints in spawn order.
    #[must_use]
    pub fn slots(&self) -> &[TokenBlueprint] {
        &self.slots
    }

    /// Blueprint stored at `slot`, if any.
    #[must_use]
    pub fn slot(&self, slot: u32) -> Option<&TokenBlueprint> {
        self.slots.get(usize::try_from(slot).ok()?)
    }

    /// Number of friend slots in the plan.
    #[must_use]
    pub fn friend_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|blueprint| blueprint.role.is_friend())
            .count()
    }
}

/// Timing parameters applied to a round's tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoundPacing {
    /// Delay between consecutive spawns.
    pub spawn_interval: Duration,
    /// Time a spawned token remains clickable.
    pub visible: Duration,
}

/// Immutable representation of a live token used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenSnapshot {
    /// Identifier assigned to the token.
    pub id: TokenId,
    /// Whether the token matches the round's rule.
    pub is_friend: bool,
    /// Attribute values the token is drawn with.
    pub attributes: AttributeVector,
    /// Playfield cell the token occupies.
    pub cell: PlayfieldCell,
    /// Simulation time the token spawned.
    pub spawned_at: Duration,
    /// Simulation time the token expires unless clicked.
    pub expires_at: Duration,
}

/// Read-only snapshot describing all live tokens.
#[derive(Clone, Debug, Default)]
pub struct TokenView {
    snapshots: Vec<TokenSnapshot>,
}

impl TokenView {
    /// Creates a new token view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TokenSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured token snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TokenSnapshot> {
        self.snapshots.iter()
    }

    /// Number of live tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no token is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TokenSnapshot> {
        self.snapshots
    }
}

/// Counters accumulated across a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Friends the player clicked.
    pub friends_clicked: u32,
    /// Friends that expired unclicked.
    pub friends_missed: u32,
    /// False friends that expired unclicked.
    pub false_friends_dodged: u32,
    /// Fastest friend click of the run.
    pub best_reaction: Option<Duration>,
}
