#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative wave state for the wave director.
//!
//! The world owns the wave lifecycle and the three scheduling systems. It is
//! mutated only through [`apply`] and observed through [`query`].

mod config;
mod timer;

use std::time::Duration;

use tracing::{debug, info, warn};
use wave_director_core::{
    Announcement, AnnouncementStyle, ArenaView, BossWaveSchedule, Command, ConfigError,
    EntityCatalog, EntityType, Event, SpawnEntry, SpecialEventKind, TelemetryFeed,
    WaveComposition, WaveNumber, WavePhase,
};
use wave_director_system_difficulty::{DifficultyAdjustment, DifficultyController};
use wave_director_system_special_events::EventScheduler;
use wave_director_system_threat_budget::ThreatBudget;

use crate::timer::PhaseTimer;

pub use config::{DirectorConfig, GatewaySchedule, GatewayStep};
pub use timer::{PendingTimer, TimerAction, TimerToken};

const PHASE_BANNER: Duration = Duration::from_secs(3);

/// External collaborators the world reads from while applying a command.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Balance table of hostile entity types.
    pub catalog: &'a dyn EntityCatalog,
    /// Live player performance.
    pub telemetry: &'a dyn TelemetryFeed,
    /// Gateway layout of the arena.
    pub arena: &'a dyn ArenaView,
}

impl<'a> Collaborators<'a> {
    /// Bundles the provided collaborators.
    #[must_use]
    pub fn new(
        catalog: &'a dyn EntityCatalog,
        telemetry: &'a dyn TelemetryFeed,
        arena: &'a dyn ArenaView,
    ) -> Self {
        Self {
            catalog,
            telemetry,
            arena,
        }
    }
}

/// Spawn and death counters of the current wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveProgress {
    /// Entities the wave must emit, extra spawns included.
    pub planned: u32,
    /// Entities the spawn executor reported as materialized.
    pub spawned: u32,
    /// Entities reported dead.
    pub killed: u32,
    /// Entities that still have to die before the wave can complete.
    pub remaining: u32,
}

/// Represents the authoritative wave director state.
#[derive(Debug)]
pub struct World {
    transition_delay: Duration,
    boss_entry_delay: Duration,
    boss_waves: BossWaveSchedule,
    boss_order: Vec<EntityType>,
    gateways: GatewaySchedule,
    allocator: ThreatBudget,
    difficulty: DifficultyController,
    events: EventScheduler,
    wave: WaveNumber,
    phase: WavePhase,
    progress: WaveProgress,
    composition: Option<WaveComposition>,
    gateways_open: u32,
    timer: PhaseTimer,
}

impl World {
    /// Creates an idle world after validating the configuration.
    pub fn new(config: DirectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            transition_delay: Duration::from_millis(config.transition_delay_ms),
            boss_entry_delay: Duration::from_millis(config.boss_entry_delay_ms),
            boss_waves: config.boss_waves,
            allocator: ThreatBudget::new(config.seeded_allocator()),
            difficulty: DifficultyController::new(config.difficulty),
            events: EventScheduler::new(config.seeded_events()),
            boss_order: config.boss_order,
            gateways: config.gateways,
            wave: WaveNumber::ZERO,
            phase: WavePhase::Idle,
            progress: WaveProgress::default(),
            composition: None,
            gateways_open: 0,
            timer: PhaseTimer::default(),
        })
    }

    fn set_phase(&mut self, phase: WavePhase, out_events: &mut Vec<Event>) {
        self.phase = phase;
        info!(wave = self.wave.get(), ?phase, "wave phase changed");
        out_events.push(Event::PhaseChanged {
            wave: self.wave,
            phase,
        });
    }

    fn in_wave(&self) -> bool {
        matches!(self.phase, WavePhase::Active | WavePhase::Clearing)
    }

    /// Plans the next wave and schedules its start.
    fn start_next_wave(&mut self, collaborators: &Collaborators<'_>, out_events: &mut Vec<Event>) {
        self.wave = self.wave.next();
        let wave = self.wave;
        let modifiers = self.difficulty.modifiers();

        let mut composition = self
            .allocator
            .generate(wave, &modifiers, collaborators.catalog);
        if let Some(kind) = self.events.check_for_event(wave) {
            debug!(wave = wave.get(), ?kind, "event scheduled for wave");
        }
        let mark = out_events.len();
        self.events.activate_pending(wave, out_events);
        self.absorb_extra_spawns(collaborators.catalog, out_events, mark);
        composition = self.events.modify_wave_config(composition);

        let boss_wave = self.boss_waves.is_boss_wave(wave);
        let rush_engaged = self
            .events
            .active_kinds()
            .contains(&SpecialEventKind::BossRush);
        if boss_wave && !rush_engaged {
            self.append_boss(wave, &mut composition, collaborators.catalog);
        }

        self.gateways_open = self
            .gateways
            .count_for(wave)
            .min(collaborators.arena.gateway_count());
        self.progress = WaveProgress::default();
        self.composition = Some(composition);
        self.set_phase(WavePhase::Preparing, out_events);

        let notice = if boss_wave {
            Announcement::new(
                format!("Boss wave {wave}"),
                AnnouncementStyle::Warning,
                PHASE_BANNER,
            )
        } else {
            Announcement::new(format!("Wave {wave}"), AnnouncementStyle::Info, PHASE_BANNER)
        };
        out_events.push(notice.into_event());

        let _ = self
            .timer
            .schedule(self.transition_delay, TimerAction::BeginWave);
    }

    fn append_boss(
        &mut self,
        wave: WaveNumber,
        composition: &mut WaveComposition,
        catalog: &dyn EntityCatalog,
    ) {
        if self.boss_order.is_empty() {
            return;
        }
        let index = self.boss_waves.boss_index(wave) % self.boss_order.len();
        let boss = self.boss_order[index].clone();
        if let Some(role) = catalog.role_of(&boss) {
            self.allocator.on_entity_planned(role);
        }
        debug!(wave = wave.get(), boss = %boss, "boss appended");
        composition.push(SpawnEntry::new(boss, self.boss_entry_delay));
    }

    /// Commits the prepared composition and opens the gateways.
    fn begin_wave(&mut self, collaborators: &Collaborators<'_>, out_events: &mut Vec<Event>) {
        let composition = self.composition.clone().unwrap_or_default();
        let planned = u32::try_from(composition.len()).unwrap_or(u32::MAX);
        self.progress = WaveProgress {
            planned,
            spawned: 0,
            killed: 0,
            remaining: planned,
        };
        self.set_phase(WavePhase::Active, out_events);
        out_events.push(Event::GatewaysActivated {
            wave: self.wave,
            count: self.gateways_open,
        });
        self.events.note_planned(&composition);
        out_events.push(Event::CompositionCommitted {
            wave: self.wave,
            composition,
        });

        if planned == 0 {
            self.enter_clearing(collaborators, out_events);
        }
    }

    fn enter_clearing(&mut self, collaborators: &Collaborators<'_>, out_events: &mut Vec<Event>) {
        self.set_phase(WavePhase::Clearing, out_events);
        self.check_completion(collaborators, out_events);
    }

    fn check_completion(&mut self, collaborators: &Collaborators<'_>, out_events: &mut Vec<Event>) {
        if self.phase == WavePhase::Clearing
            && self.progress.remaining == 0
            && !self.events.blocks_wave_completion()
        {
            self.complete_wave(collaborators, out_events);
            let _ = self
                .timer
                .schedule(self.transition_delay, TimerAction::PrepareNextWave);
        }
    }

    fn complete_wave(&mut self, collaborators: &Collaborators<'_>, out_events: &mut Vec<Event>) {
        out_events.push(Event::WaveCompleted {
            wave: self.wave,
            killed: self.progress.killed,
        });
        self.set_phase(WavePhase::Completed, out_events);
        out_events.push(
            Announcement::new(
                format!("Wave {} cleared", self.wave),
                AnnouncementStyle::Reward,
                PHASE_BANNER,
            )
            .into_event(),
        );

        self.events.on_wave_complete(out_events);
        let adjustment = self.difficulty.on_wave_complete(collaborators.telemetry);
        push_adjustment(adjustment, out_events);
    }

    /// Counts extra spawns requested since `mark` into the running wave.
    fn absorb_extra_spawns(
        &mut self,
        catalog: &dyn EntityCatalog,
        out_events: &[Event],
        mark: usize,
    ) {
        for event in &out_events[mark..] {
            let Event::ExtraSpawnRequested { entity, source } = event else {
                continue;
            };
            if !self.in_wave() {
                warn!(entity = %entity, ?source, "extra spawn requested outside a wave");
                continue;
            }
            self.progress.planned = self.progress.planned.saturating_add(1);
            self.progress.remaining = self.progress.remaining.saturating_add(1);
            if let Some(role) = catalog.role_of(entity) {
                self.allocator.on_entity_planned(role);
            }
            debug!(entity = %entity, ?source, "extra spawn counted");
        }
    }

    fn record_spawn(&mut self, collaborators: &Collaborators<'_>, out_events: &mut Vec<Event>) {
        if !self.in_wave() {
            debug!(phase = ?self.phase, "spawn notification outside a wave ignored");
            return;
        }
        self.progress.spawned = self.progress.spawned.saturating_add(1);
        if self.phase == WavePhase::Active && self.progress.spawned >= self.progress.planned {
            self.enter_clearing(collaborators, out_events);
        }
    }

    fn record_kill(
        &mut self,
        entity: &EntityType,
        collaborators: &Collaborators<'_>,
        out_events: &mut Vec<Event>,
    ) {
        if let Some(role) = collaborators.catalog.role_of(entity) {
            self.allocator.on_entity_killed(role);
        }

        let mark = out_events.len();
        self.events.on_entity_killed(entity, out_events);
        self.absorb_extra_spawns(collaborators.catalog, out_events, mark);

        if !self.in_wave() {
            debug!(entity = %entity, phase = ?self.phase, "kill outside a wave");
            return;
        }
        self.progress.killed = self.progress.killed.saturating_add(1);
        self.progress.remaining = self.progress.remaining.saturating_sub(1);
        self.check_completion(collaborators, out_events);
    }

    fn tick(&mut self, dt: Duration, collaborators: &Collaborators<'_>, out_events: &mut Vec<Event>) {
        let adjustment = self.difficulty.tick(dt, collaborators.telemetry);
        push_adjustment(adjustment, out_events);

        match self.timer.advance(dt) {
            Some(TimerAction::BeginWave) => self.begin_wave(collaborators, out_events),
            Some(TimerAction::PrepareNextWave) => self.start_next_wave(collaborators, out_events),
            None => {}
        }

        if self.in_wave() {
            let mark = out_events.len();
            self.events.update(dt, out_events);
            self.absorb_extra_spawns(collaborators.catalog, out_events, mark);
            self.check_completion(collaborators, out_events);
        }
    }

    fn skip_wave(&mut self, collaborators: &Collaborators<'_>, out_events: &mut Vec<Event>) {
        if self.phase == WavePhase::Idle {
            debug!("skip requested while idle");
            return;
        }
        let _ = self.timer.cancel();
        if self.phase != WavePhase::Completed {
            self.complete_wave(collaborators, out_events);
        }
        self.events.stop_all(out_events);
        info!(wave = self.wave.get(), "wave skipped");
        self.start_next_wave(collaborators, out_events);
    }

    fn set_wave(
        &mut self,
        wave: WaveNumber,
        collaborators: &Collaborators<'_>,
        out_events: &mut Vec<Event>,
    ) {
        let _ = self.timer.cancel();
        self.events.stop_all(out_events);
        self.wave = WaveNumber::new(wave.get().saturating_sub(1));
        info!(wave = wave.get(), "wave number forced");
        self.start_next_wave(collaborators, out_events);
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        let _ = self.timer.cancel();
        self.events.reset(out_events);
        self.allocator.reset();
        self.difficulty.reset();
        self.wave = WaveNumber::ZERO;
        self.progress = WaveProgress::default();
        self.composition = None;
        self.gateways_open = 0;
        self.set_phase(WavePhase::Idle, out_events);
    }

    fn trigger_event(
        &mut self,
        kind: SpecialEventKind,
        collaborators: &Collaborators<'_>,
        out_events: &mut Vec<Event>,
    ) {
        if self.phase == WavePhase::Idle {
            debug!(?kind, "event trigger ignored while idle");
            return;
        }
        let mark = out_events.len();
        if !self.events.trigger(kind, self.wave, out_events) {
            return;
        }
        if self.phase == WavePhase::Preparing {
            if let Some(composition) = self.composition.take() {
                self.composition = Some(self.events.apply_modifier(kind, composition));
            }
        }
        self.absorb_extra_spawns(collaborators.catalog, out_events, mark);
    }
}

fn push_adjustment(adjustment: Option<DifficultyAdjustment>, out_events: &mut Vec<Event>) {
    if let Some(DifficultyAdjustment { state, modifiers }) = adjustment {
        out_events.push(Event::DifficultyAdjusted { state, modifiers });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(
    world: &mut World,
    command: Command,
    collaborators: &Collaborators<'_>,
    out_events: &mut Vec<Event>,
) {
    match command {
        Command::Start => {
            if world.phase == WavePhase::Idle {
                world.start_next_wave(collaborators, out_events);
            } else {
                debug!(phase = ?world.phase, "start ignored");
            }
        }
        Command::Tick { dt } => world.tick(dt, collaborators, out_events),
        Command::EntitySpawned => world.record_spawn(collaborators, out_events),
        Command::EntityKilled { entity } => world.record_kill(&entity, collaborators, out_events),
        Command::SkipWave => world.skip_wave(collaborators, out_events),
        Command::SetWave { wave } => world.set_wave(wave, collaborators, out_events),
        Command::Reset => world.reset(out_events),
        Command::SetAdaptiveDifficulty { enabled } => {
            let adjustment = world.difficulty.set_enabled(enabled);
            push_adjustment(adjustment, out_events);
        }
        Command::TriggerEvent { kind } => world.trigger_event(kind, collaborators, out_events),
        Command::StopEvent { kind } => {
            if !world.events.stop(kind, out_events) {
                debug!(?kind, "stop ignored");
            }
        }
        Command::ForceNextEvent { kind } => {
            if !world.events.force_next(kind) {
                debug!(?kind, "force ignored");
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use wave_director_core::{
        DifficultyModifiers, PlayerState, SpecialEventKind, WaveComposition, WaveNumber, WavePhase,
    };
    use wave_director_system_special_events::EventDescriptor;
    use wave_director_system_threat_budget::AllocationReport;

    use super::{PendingTimer, WaveProgress, World};

    /// Wave currently prepared or running; zero before the first wave.
    #[must_use]
    pub fn wave(world: &World) -> WaveNumber {
        world.wave
    }

    /// Lifecycle phase of the current wave.
    #[must_use]
    pub fn phase(world: &World) -> WavePhase {
        world.phase
    }

    /// Spawn and death counters of the current wave.
    #[must_use]
    pub fn progress(world: &World) -> WaveProgress {
        world.progress
    }

    /// Composition prepared or committed for the current wave.
    #[must_use]
    pub fn composition(world: &World) -> Option<&WaveComposition> {
        world.composition.as_ref()
    }

    /// Gateways requested for the current wave.
    #[must_use]
    pub fn gateways_open(world: &World) -> u32 {
        world.gateways_open
    }

    /// Multipliers the next composition will be generated with.
    #[must_use]
    pub fn modifiers(world: &World) -> DifficultyModifiers {
        world.difficulty.modifiers()
    }

    /// Classification behind the most recent difficulty adjustment.
    #[must_use]
    pub fn player_state(world: &World) -> PlayerState {
        world.difficulty.last_state()
    }

    /// Reports whether adaptive difficulty is running.
    #[must_use]
    pub fn adaptive_difficulty_enabled(world: &World) -> bool {
        world.difficulty.is_enabled()
    }

    /// Special events currently running.
    #[must_use]
    pub fn active_events(world: &World) -> Vec<SpecialEventKind> {
        world.events.active_kinds()
    }

    /// Descriptor of the provided event kind.
    #[must_use]
    pub fn event_descriptor(world: &World, kind: SpecialEventKind) -> Option<&EventDescriptor> {
        world.events.descriptor(kind)
    }

    /// Phase transition waiting on the transition delay, if any.
    #[must_use]
    pub fn pending_timer(world: &World) -> Option<PendingTimer> {
        world.timer.pending()
    }

    /// Bookkeeping of the last composition generated.
    #[must_use]
    pub fn allocation_report(world: &World) -> Option<&AllocationReport> {
        world.allocator.last_report()
    }
}
