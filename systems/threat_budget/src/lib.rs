#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Threat budget allocator that turns a wave number into a paced spawn plan.
//!
//! Every wave receives a scalar budget from a configurable growth curve. The
//! allocator spends it on unlocked entity types through a weighted roll,
//! honouring per-role caps and a hard overspend ceiling, then shuffles the
//! purchases and assigns burst and breathing delays. The spend loop is bounded
//! by an explicit attempt ceiling: a wave may end up under-spent, it never
//! fails to terminate.

mod pacing;

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wave_director_core::{
    derive_wave_seed, ConfigError, DifficultyModifiers, EntityCatalog, EntityType, Role,
    SpawnEntry, WaveComposition, WaveNumber, RNG_STREAM_ALLOCATION, RNG_STREAM_PACING,
};

pub use pacing::PacingConfig;

/// Shape of the budget growth curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCurveKind {
    /// `base + (wave - 1) * per_wave`.
    #[default]
    Linear,
    /// `base * growth ^ (wave - 1)`.
    Exponential,
    /// `base + per_wave * log2(wave + 1) * 2`.
    Logarithmic,
}

/// Budget growth curve evaluated once per wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetCurve {
    /// Selected curve shape.
    pub kind: BudgetCurveKind,
    /// Budget of the first wave.
    pub base: f32,
    /// Additive growth used by the linear and logarithmic curves.
    pub per_wave: f32,
    /// Multiplicative growth used by the exponential curve.
    pub growth: f32,
}

impl Default for BudgetCurve {
    fn default() -> Self {
        Self {
            kind: BudgetCurveKind::Linear,
            base: 5.0,
            per_wave: 2.5,
            growth: 1.1,
        }
    }
}

impl BudgetCurve {
    /// Raw budget of the provided wave before difficulty scaling.
    ///
    /// Wave zero is evaluated like wave one.
    #[must_use]
    pub fn budget(&self, wave: WaveNumber) -> f32 {
        let wave = wave.get().max(1) as f32;
        match self.kind {
            BudgetCurveKind::Linear => self.base + (wave - 1.0) * self.per_wave,
            BudgetCurveKind::Exponential => self.base * self.growth.powf(wave - 1.0),
            BudgetCurveKind::Logarithmic => self.base + self.per_wave * (wave + 1.0).log2() * 2.0,
        }
    }
}

/// Maximum number of entities per role a single generation pass may plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleCaps {
    /// Cap for [`Role::Fodder`].
    pub fodder: u32,
    /// Cap for [`Role::Rusher`].
    pub rusher: u32,
    /// Cap for [`Role::Tank`].
    pub tank: u32,
    /// Cap for [`Role::Ranged`].
    pub ranged: u32,
    /// Cap for [`Role::Special`].
    pub special: u32,
}

impl Default for RoleCaps {
    fn default() -> Self {
        Self {
            fodder: 60,
            rusher: 20,
            tank: 8,
            ranged: 12,
            special: 3,
        }
    }
}

impl RoleCaps {
    /// Cap configured for the provided role.
    #[must_use]
    pub const fn cap(&self, role: Role) -> u32 {
        match role {
            Role::Fodder => self.fodder,
            Role::Rusher => self.rusher,
            Role::Tank => self.tank,
            Role::Ranged => self.ranged,
            Role::Special => self.special,
        }
    }
}

/// Baseline that role counters start from at the beginning of a generation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCapPolicy {
    /// Caps only count entities planned within the same pass.
    #[default]
    ResetPerWave,
    /// Caps also count entities of earlier waves that are still alive.
    CarryOverLiveCounts,
}

/// Per-role entity counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoleCounter {
    counts: [u32; Role::ALL.len()],
}

impl RoleCounter {
    /// Count recorded for the provided role.
    #[must_use]
    pub const fn get(&self, role: Role) -> u32 {
        self.counts[role.index()]
    }

    /// Sum over every role.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Records one more entity of the provided role.
    pub fn increment(&mut self, role: Role) {
        let slot = &mut self.counts[role.index()];
        *slot = slot.saturating_add(1);
    }

    /// Records one fewer entity of the provided role, saturating at zero.
    pub fn decrement(&mut self, role: Role) {
        let slot = &mut self.counts[role.index()];
        *slot = slot.saturating_sub(1);
    }

    fn absorb(&mut self, other: &RoleCounter) {
        for (slot, added) in self.counts.iter_mut().zip(other.counts) {
            *slot = slot.saturating_add(added);
        }
    }
}

/// Aggregated tuning knobs of the allocator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Budget growth curve.
    pub curve: BudgetCurve,
    /// Per-role caps enforced within a generation pass.
    pub role_caps: RoleCaps,
    /// Whether caps start from zero or from the live counts.
    pub cap_policy: RoleCapPolicy,
    /// Maximum number of spend-loop iterations per pass.
    pub attempt_ceiling: u32,
    /// Factor of the total budget that spending may never exceed.
    pub overspend_tolerance: f32,
    /// Spacing of the spawn plan.
    pub pacing: PacingConfig,
    /// Type planned alone when no type is unlocked for a wave.
    pub fallback_type: EntityType,
    /// Global seed every per-wave random stream is derived from.
    pub seed: u64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            curve: BudgetCurve::default(),
            role_caps: RoleCaps::default(),
            cap_policy: RoleCapPolicy::default(),
            attempt_ceiling: 512,
            overspend_tolerance: 1.1,
            pacing: PacingConfig::default(),
            fallback_type: EntityType::new("walker"),
            seed: 0x5eed_0f_7a11,
        }
    }
}

impl AllocatorConfig {
    /// Rejects configurations the spend loop cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attempt_ceiling == 0 {
            return Err(ConfigError::OutOfRange {
                field: "allocator.attempt_ceiling",
                expectation: "greater than zero",
                value: 0.0,
            });
        }
        if self.overspend_tolerance.is_nan() || self.overspend_tolerance < 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "allocator.overspend_tolerance",
                expectation: "at least 1",
                value: f64::from(self.overspend_tolerance),
            });
        }
        if !self.curve.base.is_finite() || self.curve.base < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "allocator.curve.base",
                expectation: "a non-negative number",
                value: f64::from(self.curve.base),
            });
        }
        self.pacing.validate()
    }
}

/// Reason a generation pass stopped before spending its whole budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exhaustion {
    /// The spend loop hit the configured attempt ceiling.
    AttemptCeiling,
    /// Every unlocked type reached its role cap.
    NoEligibleTypes,
    /// No eligible type fits under the overspend ceiling.
    NothingFits,
}

/// Bookkeeping of the most recent generation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct AllocationReport {
    /// Wave the pass generated.
    pub wave: WaveNumber,
    /// Budget the pass was allowed to spend.
    pub total_budget: f32,
    /// Budget the pass spent.
    pub spent_budget: f32,
    /// Number of spend-loop iterations.
    pub attempts: u32,
    /// Why the pass stopped short of its budget, if it did.
    pub exhaustion: Option<Exhaustion>,
    /// Whether the pass degraded to the fallback type.
    pub fallback_used: bool,
}

#[derive(Clone, Debug)]
struct Candidate {
    entity: EntityType,
    cost: f32,
    role: Role,
    weight: f32,
}

/// Pure allocator producing one [`WaveComposition`] per wave.
#[derive(Debug)]
pub struct ThreatBudget {
    config: AllocatorConfig,
    live: RoleCounter,
    last_report: Option<AllocationReport>,
}

impl Default for ThreatBudget {
    fn default() -> Self {
        Self::new(AllocatorConfig::default())
    }
}

impl ThreatBudget {
    /// Creates a new allocator with the provided configuration.
    #[must_use]
    pub fn new(config: AllocatorConfig) -> Self {
        Self {
            config,
            live: RoleCounter::default(),
            last_report: None,
        }
    }

    /// Configuration the allocator was built with.
    #[must_use]
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Budget of `wave` after applying the difficulty budget multiplier.
    #[must_use]
    pub fn budget_for(&self, wave: WaveNumber, modifiers: &DifficultyModifiers) -> f32 {
        (self.config.curve.budget(wave) * modifiers.budget_multiplier).max(0.0)
    }

    /// Live entity counts per role, as tracked from plans and death notifications.
    #[must_use]
    pub fn live_counts(&self) -> &RoleCounter {
        &self.live
    }

    /// Returns the report of the last generation pass, if any.
    #[must_use]
    pub fn last_report(&self) -> Option<&AllocationReport> {
        self.last_report.as_ref()
    }

    /// Records an entity planned outside a generation pass, such as a boss.
    pub fn on_entity_planned(&mut self, role: Role) {
        self.live.increment(role);
    }

    /// Records the death of an entity of the provided role.
    pub fn on_entity_killed(&mut self, role: Role) {
        self.live.decrement(role);
    }

    /// Forgets every live count and report.
    pub fn reset(&mut self) {
        self.live = RoleCounter::default();
        self.last_report = None;
    }

    /// Generates the spawn plan of `wave`.
    ///
    /// Role counters are reset (or seeded from the live counts, depending on
    /// [`RoleCapPolicy`]) at entry. Random decisions come from streams derived
    /// from the configured seed and the wave number, so the call is pure given
    /// its inputs.
    pub fn generate(
        &mut self,
        wave: WaveNumber,
        modifiers: &DifficultyModifiers,
        catalog: &dyn EntityCatalog,
    ) -> WaveComposition {
        let total_budget = self.budget_for(wave, modifiers);
        let candidates = collect_candidates(wave, catalog);
        if candidates.is_empty() {
            return self.fallback_composition(wave, total_budget, catalog);
        }

        let ceiling = total_budget * self.config.overspend_tolerance;
        let mut counter = match self.config.cap_policy {
            RoleCapPolicy::ResetPerWave => RoleCounter::default(),
            RoleCapPolicy::CarryOverLiveCounts => self.live,
        };
        let mut planned = RoleCounter::default();
        let mut rng = ChaCha8Rng::seed_from_u64(derive_wave_seed(
            self.config.seed,
            wave,
            RNG_STREAM_ALLOCATION,
        ));

        let mut picks = Vec::new();
        let mut eligible: Vec<&Candidate> = Vec::with_capacity(candidates.len());
        let mut spent = 0.0_f32;
        let mut attempts = 0_u32;
        let mut exhaustion = None;

        while spent < total_budget {
            if attempts >= self.config.attempt_ceiling {
                exhaustion = Some(Exhaustion::AttemptCeiling);
                break;
            }
            attempts += 1;

            eligible.clear();
            let caps = &self.config.role_caps;
            eligible.extend(
                candidates
                    .iter()
                    .filter(|candidate| counter.get(candidate.role) < caps.cap(candidate.role)),
            );

            let Some(mut choice) = select_weighted(&eligible, &mut rng) else {
                exhaustion = Some(Exhaustion::NoEligibleTypes);
                break;
            };

            if spent + choice.cost > ceiling {
                eligible.retain(|candidate| spent + candidate.cost <= ceiling);
                match select_weighted(&eligible, &mut rng) {
                    Some(fitting) => choice = fitting,
                    None => {
                        exhaustion = Some(Exhaustion::NothingFits);
                        break;
                    }
                }
            }

            spent += choice.cost;
            counter.increment(choice.role);
            planned.increment(choice.role);
            picks.push(choice.entity.clone());
        }

        let mut pacing_rng =
            ChaCha8Rng::seed_from_u64(derive_wave_seed(self.config.seed, wave, RNG_STREAM_PACING));
        let entries = pacing::pace(
            picks,
            &self.config.pacing,
            modifiers.spawn_delay_multiplier,
            &mut pacing_rng,
        );
        self.live.absorb(&planned);

        if let Some(reason) = exhaustion {
            warn!(
                wave = wave.get(),
                total_budget,
                spent,
                attempts,
                ?reason,
                "allocation stopped short of its budget"
            );
        } else {
            debug!(
                wave = wave.get(),
                total_budget,
                spent,
                attempts,
                planned = entries.len(),
                "allocation complete"
            );
        }

        self.last_report = Some(AllocationReport {
            wave,
            total_budget,
            spent_budget: spent,
            attempts,
            exhaustion,
            fallback_used: false,
        });
        WaveComposition::new(entries, total_budget, spent)
    }

    fn fallback_composition(
        &mut self,
        wave: WaveNumber,
        total_budget: f32,
        catalog: &dyn EntityCatalog,
    ) -> WaveComposition {
        let fallback = self.config.fallback_type.clone();
        warn!(
            wave = wave.get(),
            fallback = %fallback,
            "no entity type unlocked; degrading to fallback type"
        );

        let cost = catalog.cost_of(&fallback).unwrap_or(0.0);
        if cost > total_budget * self.config.overspend_tolerance {
            warn!(
                wave = wave.get(),
                total_budget,
                cost,
                "fallback type exceeds the overspend ceiling; wave left empty"
            );
            self.last_report = Some(AllocationReport {
                wave,
                total_budget,
                spent_budget: 0.0,
                attempts: 0,
                exhaustion: Some(Exhaustion::NothingFits),
                fallback_used: true,
            });
            return WaveComposition::new(Vec::new(), total_budget, 0.0);
        }

        let spent = cost;
        if let Some(role) = catalog.role_of(&fallback) {
            self.live.increment(role);
        }
        self.last_report = Some(AllocationReport {
            wave,
            total_budget,
            spent_budget: spent,
            attempts: 0,
            exhaustion: None,
            fallback_used: true,
        });
        WaveComposition::new(
            vec![SpawnEntry::new(fallback, Duration::ZERO)],
            total_budget,
            spent,
        )
    }
}

fn collect_candidates(wave: WaveNumber, catalog: &dyn EntityCatalog) -> Vec<Candidate> {
    catalog
        .types_unlocked_at(wave)
        .into_iter()
        .filter_map(|entity| {
            let cost = catalog.cost_of(&entity)?;
            let role = catalog.role_of(&entity)?;
            let weight = catalog
                .weight_of(&entity)
                .filter(|weight| weight.is_finite())
                .unwrap_or(0.0)
                .max(0.0);
            Some(Candidate {
                entity,
                cost,
                role,
                weight,
            })
        })
        .collect()
}

/// Cumulative-weight roll; the first candidate whose running total exceeds the roll wins.
fn select_weighted<'a, R: Rng>(eligible: &[&'a Candidate], rng: &mut R) -> Option<&'a Candidate> {
    let first = *eligible.first()?;
    let total: f32 = eligible.iter().map(|candidate| candidate.weight).sum();
    if !total.is_finite() || total <= 0.0 {
        return Some(first);
    }

    let roll = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    for candidate in eligible {
        cumulative += candidate.weight;
        if roll < cumulative {
            return Some(*candidate);
        }
    }
    eligible.last().copied()
}
