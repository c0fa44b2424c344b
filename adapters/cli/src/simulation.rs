use std::{collections::VecDeque, fmt, time::Duration};

use anyhow::{Context, Result};
use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};
use wave_director_core::{
    Command, DifficultyModifiers, EntityType, Event, PerformanceSnapshot, SpawnEntry,
    SpecialEventKind, StaticArena, TelemetryFeed, WaveNumber,
};
use wave_director_world::{self as world, query, Collaborators, World};

use crate::config::SimulationConfig;

const TELEMETRY_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Scripted player skill driving the telemetry feed and the kill rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Profile {
    /// Low accuracy, heavy damage taken, slow kills.
    Struggling,
    /// Middle of the road on every metric.
    Neutral,
    /// Sharp aim, barely touched, fast kills.
    Dominating,
}

impl Profile {
    fn baseline(self) -> PerformanceSnapshot {
        match self {
            Self::Struggling => PerformanceSnapshot {
                accuracy: 0.2,
                damage_taken_per_minute: 70.0,
                health_fraction: 0.25,
                average_clear_seconds: None,
                kills_per_minute: 48.0,
            },
            Self::Neutral => PerformanceSnapshot {
                accuracy: 0.5,
                damage_taken_per_minute: 25.0,
                health_fraction: 0.6,
                average_clear_seconds: None,
                kills_per_minute: 90.0,
            },
            Self::Dominating => PerformanceSnapshot {
                accuracy: 0.85,
                damage_taken_per_minute: 4.0,
                health_fraction: 0.95,
                average_clear_seconds: None,
                kills_per_minute: 180.0,
            },
        }
    }
}

/// Knobs of one simulation run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SimulationOptions {
    pub(crate) waves: u32,
    pub(crate) tick: Duration,
    pub(crate) time_limit: Duration,
    pub(crate) profile: Profile,
    pub(crate) seed: u64,
}

/// Telemetry feed that jitters around a profile's baseline once per second.
#[derive(Debug)]
struct ScriptedTelemetry {
    baseline: PerformanceSnapshot,
    current: PerformanceSnapshot,
    rng: ChaCha8Rng,
    since_sample: Duration,
    clear_times: Vec<f32>,
}

impl ScriptedTelemetry {
    fn new(profile: Profile, seed: u64) -> Self {
        let baseline = profile.baseline();
        Self {
            baseline,
            current: baseline,
            rng: ChaCha8Rng::seed_from_u64(seed),
            since_sample: Duration::ZERO,
            clear_times: Vec::new(),
        }
    }

    fn advance(&mut self, dt: Duration) {
        self.since_sample += dt;
        if self.since_sample < TELEMETRY_SAMPLE_INTERVAL {
            return;
        }
        self.since_sample = Duration::ZERO;

        let base = self.baseline;
        self.current = PerformanceSnapshot {
            accuracy: (base.accuracy + self.rng.gen_range(-0.05..=0.05)).clamp(0.0, 1.0),
            damage_taken_per_minute: base.damage_taken_per_minute * self.rng.gen_range(0.9..=1.1),
            health_fraction: (base.health_fraction + self.rng.gen_range(-0.05..=0.05))
                .clamp(0.0, 1.0),
            average_clear_seconds: self.current.average_clear_seconds,
            kills_per_minute: base.kills_per_minute,
        };
    }

    fn record_clear(&mut self, seconds: f32) {
        self.clear_times.push(seconds);
        let average = self.clear_times.iter().sum::<f32>() / self.clear_times.len() as f32;
        self.current.average_clear_seconds = Some(average);
    }
}

impl TelemetryFeed for ScriptedTelemetry {
    fn performance_snapshot(&self) -> PerformanceSnapshot {
        self.current
    }
}

/// Plays the committed plans back and kills living entities at a steady rate.
#[derive(Debug)]
struct SpawnExecutor {
    queued: VecDeque<SpawnEntry>,
    elapsed: Duration,
    alive: VecDeque<EntityType>,
    kills_per_second: f32,
    kill_credit: f32,
}

impl SpawnExecutor {
    fn new(kills_per_minute: f32) -> Self {
        Self {
            queued: VecDeque::new(),
            elapsed: Duration::ZERO,
            alive: VecDeque::new(),
            kills_per_second: kills_per_minute / 60.0,
            kill_credit: 0.0,
        }
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::CompositionCommitted { composition, .. } => {
                    self.queued.extend(composition.entries().iter().cloned());
                }
                Event::ExtraSpawnRequested { entity, .. } => {
                    self.queued
                        .push_back(SpawnEntry::new(entity.clone(), Duration::ZERO));
                }
                _ => {}
            }
        }
    }

    fn advance(&mut self, dt: Duration) -> Vec<Command> {
        let mut commands = Vec::new();

        self.elapsed += dt;
        while self
            .queued
            .front()
            .is_some_and(|entry| entry.delay <= self.elapsed)
        {
            if let Some(entry) = self.queued.pop_front() {
                self.elapsed -= entry.delay;
                self.alive.push_back(entry.entity);
                commands.push(Command::EntitySpawned);
            }
        }
        if self.queued.is_empty() {
            self.elapsed = Duration::ZERO;
        }

        self.kill_credit += self.kills_per_second * dt.as_secs_f32();
        while self.kill_credit >= 1.0 {
            let Some(entity) = self.alive.pop_front() else {
                break;
            };
            self.kill_credit -= 1.0;
            commands.push(Command::EntityKilled { entity });
        }
        if self.alive.is_empty() {
            self.kill_credit = self.kill_credit.min(1.0);
        }

        commands
    }
}

/// Outcome of one simulated wave.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct WaveSummary {
    pub(crate) wave: WaveNumber,
    pub(crate) total_budget: f32,
    pub(crate) spent_budget: f32,
    pub(crate) planned: u32,
    pub(crate) killed: u32,
    pub(crate) gateways: u32,
    pub(crate) duration: Duration,
    pub(crate) modifiers: DifficultyModifiers,
    pub(crate) events: Vec<SpecialEventKind>,
    pub(crate) points: u32,
}

impl fmt::Display for WaveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wave {:>3} | budget {:>6.1} spent {:>6.1} | planned {:>3} killed {:>3} | gateways {} | {:>6.1}s | delay x{:.2} budget x{:.2} drops x{:.2}",
            self.wave,
            self.total_budget,
            self.spent_budget,
            self.planned,
            self.killed,
            self.gateways,
            self.duration.as_secs_f32(),
            self.modifiers.spawn_delay_multiplier,
            self.modifiers.budget_multiplier,
            self.modifiers.drop_rate_multiplier,
        )?;
        if !self.events.is_empty() {
            let titles: Vec<&str> = self.events.iter().map(|kind| kind.title()).collect();
            write!(f, " | events: {}", titles.join(", "))?;
        }
        if self.points > 0 {
            write!(f, " | +{} pts", self.points)?;
        }
        Ok(())
    }
}

/// Folds the event stream into per-wave summaries.
#[derive(Debug, Default)]
struct SummaryRecorder {
    upcoming_events: Vec<SpecialEventKind>,
    gateways: u32,
    current: Option<(WaveSummary, Duration)>,
    finished: Vec<WaveSummary>,
    last_clear: Option<f32>,
}

impl SummaryRecorder {
    fn observe(&mut self, world: &World, events: &[Event], clock: Duration) {
        for event in events {
            match event {
                Event::SpecialEventStarted { kind, .. } => match self.current.as_mut() {
                    Some((summary, _)) => summary.events.push(*kind),
                    None => self.upcoming_events.push(*kind),
                },
                Event::GatewaysActivated { count, .. } => self.gateways = *count,
                Event::CompositionCommitted { wave, composition } => {
                    let summary = WaveSummary {
                        wave: *wave,
                        total_budget: composition.total_budget(),
                        spent_budget: composition.spent_budget(),
                        planned: 0,
                        killed: 0,
                        gateways: self.gateways,
                        duration: Duration::ZERO,
                        modifiers: query::modifiers(world),
                        events: std::mem::take(&mut self.upcoming_events),
                        points: 0,
                    };
                    self.current = Some((summary, clock));
                }
                Event::PointsAwarded { amount } => {
                    if let Some((summary, _)) = self.current.as_mut() {
                        summary.points = summary.points.saturating_add(*amount);
                    }
                }
                Event::WaveCompleted { killed, .. } => {
                    if let Some((mut summary, started)) = self.current.take() {
                        summary.planned = query::progress(world).planned;
                        summary.killed = *killed;
                        summary.duration = clock.saturating_sub(started);
                        self.last_clear = Some(summary.duration.as_secs_f32());
                        self.finished.push(summary);
                    }
                }
                _ => {}
            }
        }
    }

    fn completed(&self) -> u32 {
        u32::try_from(self.finished.len()).unwrap_or(u32::MAX)
    }
}

/// Runs the director against the scripted player until `waves` waves completed.
pub(crate) fn run(config: SimulationConfig, options: &SimulationOptions) -> Result<Vec<WaveSummary>> {
    let SimulationConfig {
        director,
        catalog,
        arena_gateways,
    } = config;
    let mut world = World::new(director).context("director configuration rejected")?;
    let arena = StaticArena::new(arena_gateways);
    let mut telemetry = ScriptedTelemetry::new(options.profile, options.seed);
    let mut executor = SpawnExecutor::new(options.profile.baseline().kills_per_minute);
    let mut recorder = SummaryRecorder::default();

    info!(waves = options.waves, profile = ?options.profile, "simulation started");
    let mut clock = Duration::ZERO;
    let mut pending = vec![Command::Start];
    while recorder.completed() < options.waves {
        if clock >= options.time_limit {
            warn!(
                completed = recorder.completed(),
                seconds = clock.as_secs(),
                "simulation time limit reached"
            );
            break;
        }

        pending.push(Command::Tick { dt: options.tick });
        for command in pending.drain(..) {
            let collaborators = Collaborators::new(&catalog, &telemetry, &arena);
            let mut events = Vec::new();
            world::apply(&mut world, command, &collaborators, &mut events);
            executor.observe(&events);
            recorder.observe(&world, &events, clock);
        }

        clock += options.tick;
        telemetry.advance(options.tick);
        if let Some(seconds) = recorder.last_clear.take() {
            telemetry.record_clear(seconds);
        }
        pending = executor.advance(options.tick);
    }

    Ok(recorder.finished)
}
