#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the wave director.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative wave world, and the pure scheduling systems. Adapters submit
//! [`Command`] values describing lifecycle notifications and operator requests,
//! the world executes those commands via its `apply` entry point, and then
//! broadcasts [`Event`] values that the spawn executor, announcement sink and
//! reward service react to. Collaborators the core only reads from are
//! expressed as traits ([`EntityCatalog`], [`TelemetryFeed`], [`ArenaView`]).

mod catalog;
mod composition;
mod error;
mod seed;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

pub use catalog::{CatalogTable, EntityCatalog, EntityTypeProfile};
pub use composition::{SpawnEntry, WaveComposition};
pub use error::ConfigError;
pub use seed::{
    derive_wave_seed, RNG_STREAM_ALLOCATION, RNG_STREAM_EVENTS, RNG_STREAM_PACING,
};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Leaves the idle state and prepares the first wave.
    Start,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Reports that the spawn executor materialized one planned entity.
    EntitySpawned,
    /// Reports that a hostile entity died.
    EntityKilled {
        /// Catalog type of the entity that died.
        entity: EntityType,
    },
    /// Operator request to finish the current wave immediately and move on.
    SkipWave,
    /// Operator request to jump to an arbitrary wave number.
    SetWave {
        /// Wave that should be prepared next.
        wave: WaveNumber,
    },
    /// Returns the world to its idle state (for example after game over).
    Reset,
    /// Enables or disables the adaptive difficulty controller.
    SetAdaptiveDifficulty {
        /// Whether adaptive adjustments should run.
        enabled: bool,
    },
    /// Operator request to activate a special event right away.
    TriggerEvent {
        /// Kind of special event to activate.
        kind: SpecialEventKind,
    },
    /// Operator request to end a running special event.
    StopEvent {
        /// Kind of special event to stop.
        kind: SpecialEventKind,
    },
    /// Operator request to make the next wave pick the provided event.
    ForceNextEvent {
        /// Kind of special event to force on the next wave.
        kind: SpecialEventKind,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the wave lifecycle entered a new phase.
    PhaseChanged {
        /// Wave the phase belongs to.
        wave: WaveNumber,
        /// Phase that became active.
        phase: WavePhase,
    },
    /// Hands the final spawn plan of a wave to the spawn executor.
    CompositionCommitted {
        /// Wave the plan belongs to.
        wave: WaveNumber,
        /// Ordered, delay-annotated spawn plan.
        composition: WaveComposition,
    },
    /// Requests that the arena open the provided number of gateways.
    GatewaysActivated {
        /// Wave the gateways are opened for.
        wave: WaveNumber,
        /// Number of gateways to open.
        count: u32,
    },
    /// Confirms that every entity of a wave has been dealt with.
    WaveCompleted {
        /// Wave that finished.
        wave: WaveNumber,
        /// Number of kills recorded during the wave.
        killed: u32,
    },
    /// Reports a bounded adjustment applied by the adaptive controller.
    DifficultyAdjusted {
        /// Classification that drove the adjustment.
        state: PlayerState,
        /// Multipliers after the adjustment.
        modifiers: DifficultyModifiers,
    },
    /// Confirms that a special event became active.
    SpecialEventStarted {
        /// Kind of event that started.
        kind: SpecialEventKind,
        /// Wave during which the event started.
        wave: WaveNumber,
    },
    /// Confirms that a special event finished and returned to inactive.
    SpecialEventEnded {
        /// Kind of event that ended.
        kind: SpecialEventKind,
    },
    /// Asks the spawn executor for an entity outside the committed plan.
    ExtraSpawnRequested {
        /// Catalog type that should be materialized.
        entity: EntityType,
        /// Event that requested the spawn.
        source: SpecialEventKind,
    },
    /// Requests a change of the arena's visibility.
    VisibilityChanged {
        /// Visibility factor where `1.0` is unobstructed.
        factor: f32,
    },
    /// Fire-and-forget notification for the announcement sink.
    Announcement {
        /// Announcement to display.
        notice: Announcement,
    },
    /// One-shot points reward for the economy service.
    PointsAwarded {
        /// Number of points granted.
        amount: u32,
    },
    /// One-shot reward pickup for the economy service.
    RewardDropped {
        /// Reward type to spawn.
        reward: String,
        /// Horizontal arena coordinate of the drop.
        x: f32,
        /// Vertical arena coordinate of the drop.
        y: f32,
    },
}

/// Sequential wave index; wave zero means no wave has been prepared yet.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WaveNumber(u32);

impl WaveNumber {
    /// Wave number before the first wave.
    pub const ZERO: Self = Self(0);

    /// Creates a new wave number with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the wave.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Number of waves elapsed since `earlier`, saturating at zero.
    #[must_use]
    pub const fn waves_since(self, earlier: WaveNumber) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for WaveNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog identifier of a hostile entity type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    /// Creates a new entity type identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse category used to cap how many entities of a kind a wave may plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Cheap, numerous entities.
    Fodder,
    /// Fast entities that close distance quickly.
    Rusher,
    /// Slow, durable entities.
    Tank,
    /// Entities attacking from a distance.
    Ranged,
    /// Rare entities with unique mechanics, bosses included.
    Special,
}

impl Role {
    /// Every role in declaration order.
    pub const ALL: [Role; 5] = [
        Role::Fodder,
        Role::Rusher,
        Role::Tank,
        Role::Ranged,
        Role::Special,
    ];

    /// Dense index of the role, usable for fixed-size tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Role::Fodder => 0,
            Role::Rusher => 1,
            Role::Tank => 2,
            Role::Ranged => 3,
            Role::Special => 4,
        }
    }
}

/// Performance metrics pulled from the telemetry feed on demand.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSnapshot {
    /// Fraction of shots that hit, between `0.0` and `1.0`.
    pub accuracy: f32,
    /// Damage the player received per minute.
    pub damage_taken_per_minute: f32,
    /// Current health as a fraction of maximum health.
    pub health_fraction: f32,
    /// Average seconds needed to clear a wave, if any wave was cleared yet.
    pub average_clear_seconds: Option<f32>,
    /// Kills the player scored per minute.
    pub kills_per_minute: f32,
}

impl Default for PerformanceSnapshot {
    fn default() -> Self {
        Self {
            accuracy: 0.5,
            damage_taken_per_minute: 25.0,
            health_fraction: 1.0,
            average_clear_seconds: None,
            kills_per_minute: 0.0,
        }
    }
}

/// Source of live player performance metrics.
pub trait TelemetryFeed {
    /// Captures the player's current performance.
    fn performance_snapshot(&self) -> PerformanceSnapshot;
}

impl TelemetryFeed for PerformanceSnapshot {
    fn performance_snapshot(&self) -> PerformanceSnapshot {
        *self
    }
}

/// Read access to the arena's gateway layout.
pub trait ArenaView {
    /// Number of gateways the arena can open.
    fn gateway_count(&self) -> u32;
}

/// Arena with a fixed number of gateways.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticArena {
    gateways: u32,
}

impl StaticArena {
    /// Creates an arena exposing the provided number of gateways.
    #[must_use]
    pub const fn new(gateways: u32) -> Self {
        Self { gateways }
    }
}

impl ArenaView for StaticArena {
    fn gateway_count(&self) -> u32 {
        self.gateways
    }
}

/// Classification of the player's recent performance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// The player is overwhelmed; difficulty should ease.
    Struggling,
    /// The player is coping; multipliers drift back toward neutral.
    #[default]
    Neutral,
    /// The player is in full control; difficulty should tighten.
    Dominating,
}

/// Inclusive range a difficulty multiplier must stay within.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierBounds {
    /// Smallest permitted value.
    pub min: f32,
    /// Largest permitted value.
    pub max: f32,
}

impl ModifierBounds {
    /// Creates a new bounds descriptor.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamps the provided value into the bounds.
    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }

    /// Reports whether the value lies inside the bounds.
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::InvertedBounds {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Bounds for each field of [`DifficultyModifiers`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierLimits {
    /// Bounds of the spawn delay multiplier.
    pub spawn_delay: ModifierBounds,
    /// Bounds of the budget multiplier.
    pub budget: ModifierBounds,
    /// Bounds of the drop rate multiplier.
    pub drop_rate: ModifierBounds,
}

impl Default for ModifierLimits {
    fn default() -> Self {
        Self {
            spawn_delay: ModifierBounds::new(0.5, 2.0),
            budget: ModifierBounds::new(0.5, 1.5),
            drop_rate: ModifierBounds::new(0.5, 2.0),
        }
    }
}

impl ModifierLimits {
    /// Ensures every bounds pair is ordered and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.spawn_delay.validate("spawn_delay")?;
        self.budget.validate("budget")?;
        self.drop_rate.validate("drop_rate")
    }
}

/// Multipliers the adaptive controller applies to spawn pacing, budget and loot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyModifiers {
    /// Scales the gaps between spawns; larger values spread spawns out.
    pub spawn_delay_multiplier: f32,
    /// Scales the wave's threat budget.
    pub budget_multiplier: f32,
    /// Scales the reward layer's drop rate.
    pub drop_rate_multiplier: f32,
}

impl DifficultyModifiers {
    /// Multipliers that leave every system untouched.
    pub const NEUTRAL: Self = Self {
        spawn_delay_multiplier: 1.0,
        budget_multiplier: 1.0,
        drop_rate_multiplier: 1.0,
    };

    /// Returns a copy with every field clamped into `limits`.
    #[must_use]
    pub fn clamped(self, limits: &ModifierLimits) -> Self {
        Self {
            spawn_delay_multiplier: limits.spawn_delay.clamp(self.spawn_delay_multiplier),
            budget_multiplier: limits.budget.clamp(self.budget_multiplier),
            drop_rate_multiplier: limits.drop_rate.clamp(self.drop_rate_multiplier),
        }
    }

    /// Reports whether every field lies within `limits`.
    #[must_use]
    pub fn within(&self, limits: &ModifierLimits) -> bool {
        limits.spawn_delay.contains(self.spawn_delay_multiplier)
            && limits.budget.contains(self.budget_multiplier)
            && limits.drop_rate.contains(self.drop_rate_multiplier)
    }
}

impl Default for DifficultyModifiers {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Lifecycle phase of the current wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// No wave has been started yet.
    #[default]
    Idle,
    /// The next wave's composition is planned and waits for the transition delay.
    Preparing,
    /// The spawn executor is emitting the planned entities.
    Active,
    /// Every planned entity was emitted; waiting for the survivors to die.
    Clearing,
    /// The wave is over; the next one is prepared after the transition delay.
    Completed,
}

/// Scripted modifier events the scheduler can inject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialEventKind {
    /// Mass-spawn event multiplying the wave's composition.
    Horde,
    /// Visibility reduction for a fixed duration.
    Blackout,
    /// A hazard door that must be defended before its countdown runs out.
    DoorHazard,
    /// Gauntlet of bosses fought one after another.
    BossRush,
    /// Instant reward drop.
    SupplyDrop,
}

impl SpecialEventKind {
    /// Every event kind in registration order.
    pub const ALL: [SpecialEventKind; 5] = [
        SpecialEventKind::Horde,
        SpecialEventKind::Blackout,
        SpecialEventKind::DoorHazard,
        SpecialEventKind::BossRush,
        SpecialEventKind::SupplyDrop,
    ];

    /// Human readable title used by announcements.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            SpecialEventKind::Horde => "Horde",
            SpecialEventKind::Blackout => "Blackout",
            SpecialEventKind::DoorHazard => "Breach",
            SpecialEventKind::BossRush => "Boss Rush",
            SpecialEventKind::SupplyDrop => "Supply Drop",
        }
    }
}

/// Cadence of boss waves shared by the orchestrator and the event scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossWaveSchedule {
    /// Every `interval`-th wave is a boss wave; zero disables boss waves.
    pub interval: u32,
}

impl BossWaveSchedule {
    /// Creates a schedule with the provided interval.
    #[must_use]
    pub const fn new(interval: u32) -> Self {
        Self { interval }
    }

    /// Reports whether the provided wave is a boss wave.
    #[must_use]
    pub const fn is_boss_wave(&self, wave: WaveNumber) -> bool {
        self.interval != 0 && wave.get() != 0 && wave.get() % self.interval == 0
    }

    /// Zero-based count of boss waves before `wave`, used to walk a boss order.
    #[must_use]
    pub const fn boss_index(&self, wave: WaveNumber) -> usize {
        if self.interval == 0 {
            return 0;
        }
        (wave.get() / self.interval).saturating_sub(1) as usize
    }
}

impl Default for BossWaveSchedule {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Visual emphasis applied to an announcement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnouncementStyle {
    /// Neutral informational banner.
    Info,
    /// Something dangerous is about to happen.
    Warning,
    /// Something dangerous is happening now.
    Danger,
    /// The player earned a reward.
    Reward,
}

/// Text notification for the announcement sink.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Announcement {
    /// Text shown to the player.
    pub text: String,
    /// Visual emphasis of the banner.
    pub style: AnnouncementStyle,
    /// How long the banner stays visible.
    pub duration: Duration,
}

impl Announcement {
    /// Creates a new announcement.
    #[must_use]
    pub fn new(text: impl Into<String>, style: AnnouncementStyle, duration: Duration) -> Self {
        Self {
            text: text.into(),
            style,
            duration,
        }
    }

    /// Wraps the announcement into an [`Event`].
    #[must_use]
    pub fn into_event(self) -> Event {
        Event::Announcement { notice: self }
    }
}
