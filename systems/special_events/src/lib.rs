#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Special event scheduler deciding once per wave whether a scripted modifier fires.
//!
//! Every kind is registered once, in [`SpecialEventKind::ALL`] order, and
//! carries an [`EventDescriptor`] with its rule and lifecycle. Hooks are
//! dispatched by matching on a closed set of kind states; side effects are
//! pushed as [`Event`] values into the caller's buffer.

mod kinds;
mod rules;

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use wave_director_core::{
    derive_wave_seed, EntityType, Event, SpecialEventKind, WaveComposition, WaveNumber,
    RNG_STREAM_EVENTS,
};

use crate::kinds::{KindState, Progress};

pub use kinds::{BlackoutConfig, BossRushConfig, DoorHazardConfig, HordeConfig, SupplyDropConfig};
pub use rules::{
    DurationPolicy, EventDescriptor, EventLifecycle, EventRule, EventSettings, SchedulerConfig,
};

#[derive(Clone, Debug)]
struct Slot {
    descriptor: EventDescriptor,
    state: KindState,
}

/// Scheduler owning one descriptor per registered event kind.
#[derive(Debug)]
pub struct EventScheduler {
    config: SchedulerConfig,
    slots: Vec<Slot>,
    forced: Option<SpecialEventKind>,
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl EventScheduler {
    /// Registers every kind with the provided configuration.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        let slots = KindState::registry(&config)
            .into_iter()
            .map(|state| {
                let kind = state.kind();
                Slot {
                    descriptor: EventDescriptor::new(
                        kind,
                        config.rule(kind).clone(),
                        state.policy(),
                    ),
                    state,
                }
            })
            .collect();
        Self {
            config,
            slots,
            forced: None,
        }
    }

    /// Configuration the scheduler was built with.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Descriptor of the provided kind.
    #[must_use]
    pub fn descriptor(&self, kind: SpecialEventKind) -> Option<&EventDescriptor> {
        self.slots
            .iter()
            .map(|slot| &slot.descriptor)
            .find(|descriptor| descriptor.kind() == kind)
    }

    /// Kinds currently running, in registration order.
    #[must_use]
    pub fn active_kinds(&self) -> Vec<SpecialEventKind> {
        self.slots
            .iter()
            .filter(|slot| {
                matches!(
                    slot.descriptor.lifecycle(),
                    EventLifecycle::Active | EventLifecycle::Ending
                )
            })
            .map(|slot| slot.descriptor.kind())
            .collect()
    }

    /// Kind queued by [`EventScheduler::force_next`], if any.
    #[must_use]
    pub fn forced_kind(&self) -> Option<SpecialEventKind> {
        self.forced
    }

    /// Reports whether a running event holds the current wave open.
    #[must_use]
    pub fn blocks_wave_completion(&self) -> bool {
        self.slots.iter().any(|slot| {
            slot.descriptor.lifecycle() == EventLifecycle::Active
                && slot.state.blocks_wave_completion()
        })
    }

    /// Decides whether an event fires on `wave` and marks it pending.
    ///
    /// Waves before `min_wave_for_events` never fire. Otherwise a kind queued
    /// with [`EventScheduler::force_next`] wins, then milestone overrides, and
    /// finally, unless `wave` is a boss wave, one probability-weighted roll.
    pub fn check_for_event(&mut self, wave: WaveNumber) -> Option<SpecialEventKind> {
        if wave.get() < self.config.min_wave_for_events {
            return None;
        }

        let forced = self.forced.filter(|kind| self.is_eligible(*kind, wave));
        let selected = forced
            .or_else(|| self.milestone_choice(wave))
            .or_else(|| {
                if self.config.boss_waves.is_boss_wave(wave) {
                    None
                } else {
                    self.rolled_choice(wave)
                }
            })?;

        if forced.is_some() {
            self.forced = None;
        }
        let index = self.index_of(selected)?;
        self.slots[index]
            .descriptor
            .set_lifecycle(EventLifecycle::Pending);
        debug!(wave = wave.get(), kind = ?selected, "special event selected");
        Some(selected)
    }

    /// Activates every pending kind in registration order.
    pub fn activate_pending(&mut self, wave: WaveNumber, out: &mut Vec<Event>) {
        for index in 0..self.slots.len() {
            if self.slots[index].descriptor.lifecycle() == EventLifecycle::Pending {
                self.start(index, wave, out);
            }
        }
    }

    /// Lets every running kind rewrite the composition, in registration order.
    #[must_use]
    pub fn modify_wave_config(&self, composition: WaveComposition) -> WaveComposition {
        self.slots
            .iter()
            .filter(|slot| slot.descriptor.lifecycle() == EventLifecycle::Active)
            .fold(composition, |composition, slot| {
                slot.state.modify_wave_config(composition)
            })
    }

    /// Applies a single running kind's rewrite, for kinds activated after the
    /// composition was first shaped.
    #[must_use]
    pub fn apply_modifier(
        &self,
        kind: SpecialEventKind,
        composition: WaveComposition,
    ) -> WaveComposition {
        match self.index_of(kind) {
            Some(index) if self.slots[index].descriptor.lifecycle() == EventLifecycle::Active => {
                self.slots[index].state.modify_wave_config(composition)
            }
            _ => composition,
        }
    }

    /// Advances the internal timers of every running kind.
    pub fn update(&mut self, dt: Duration, out: &mut Vec<Event>) {
        for slot in &mut self.slots {
            if slot.descriptor.lifecycle() == EventLifecycle::Active
                && slot.state.update(dt, out) == Progress::Finished
            {
                slot.descriptor.set_lifecycle(EventLifecycle::Ending);
            }
        }
        self.settle(out);
    }

    /// Forwards a death notification to every running kind.
    pub fn on_entity_killed(&mut self, entity: &EntityType, out: &mut Vec<Event>) {
        for slot in &mut self.slots {
            if slot.descriptor.lifecycle() != EventLifecycle::Active {
                slot.state.note_kill(entity);
            } else if slot.state.on_entity_killed(entity, out) == Progress::Finished {
                slot.descriptor.set_lifecycle(EventLifecycle::Ending);
            }
        }
    }

    /// Records the plan committed for the running wave.
    ///
    /// A boss rush needs it to tell its own bosses from same-typed entities
    /// the wave already planned.
    pub fn note_planned(&mut self, composition: &WaveComposition) {
        for slot in &mut self.slots {
            slot.state.note_planned(composition);
        }
    }

    /// Ends wave-scoped kinds and settles kinds whose condition was met.
    pub fn on_wave_complete(&mut self, out: &mut Vec<Event>) {
        for index in 0..self.slots.len() {
            let slot = &self.slots[index];
            if slot.descriptor.lifecycle() == EventLifecycle::Active
                && slot.descriptor.duration() == DurationPolicy::Wave
            {
                self.finish(index, out);
            }
        }
        self.settle(out);
        for slot in &mut self.slots {
            slot.state.forget_planned();
        }
    }

    /// Activates `kind` immediately, ignoring wave gates, cooldown and probability.
    ///
    /// Returns `false` without side effects when the kind is already engaged,
    /// conflicts with a running event, or no concurrency slot is free.
    pub fn trigger(
        &mut self,
        kind: SpecialEventKind,
        wave: WaveNumber,
        out: &mut Vec<Event>,
    ) -> bool {
        let Some(index) = self.index_of(kind) else {
            return false;
        };
        if !self.can_start(index) {
            debug!(?kind, "trigger ignored");
            return false;
        }
        self.start(index, wave, out);
        true
    }

    /// Ends `kind` if it is pending or running.
    pub fn stop(&mut self, kind: SpecialEventKind, out: &mut Vec<Event>) -> bool {
        let Some(index) = self.index_of(kind) else {
            return false;
        };
        match self.slots[index].descriptor.lifecycle() {
            EventLifecycle::Inactive => false,
            EventLifecycle::Pending => {
                self.slots[index]
                    .descriptor
                    .set_lifecycle(EventLifecycle::Inactive);
                true
            }
            EventLifecycle::Active | EventLifecycle::Ending => {
                self.finish(index, out);
                true
            }
        }
    }

    /// Ends every pending or running kind.
    pub fn stop_all(&mut self, out: &mut Vec<Event>) {
        for kind in SpecialEventKind::ALL {
            let _ = self.stop(kind, out);
        }
    }

    /// Queues `kind` for the next [`EventScheduler::check_for_event`] that finds it eligible.
    ///
    /// Returns `false` when the kind is already pending or running.
    pub fn force_next(&mut self, kind: SpecialEventKind) -> bool {
        match self.descriptor(kind) {
            Some(descriptor) if !descriptor.lifecycle().is_engaged() => {
                self.forced = Some(kind);
                true
            }
            _ => false,
        }
    }

    /// Stops every kind and forgets activation history.
    pub fn reset(&mut self, out: &mut Vec<Event>) {
        self.stop_all(out);
        for slot in &mut self.slots {
            slot.descriptor.forget_history();
            slot.state.forget_planned();
        }
        self.forced = None;
    }

    fn index_of(&self, kind: SpecialEventKind) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.descriptor.kind() == kind)
    }

    fn engaged_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.descriptor.lifecycle().is_engaged())
            .count()
    }

    /// Lifecycle, concurrency ceiling and compatibility with engaged kinds.
    fn can_start(&self, index: usize) -> bool {
        let candidate = &self.slots[index].descriptor;
        if candidate.lifecycle() != EventLifecycle::Inactive {
            return false;
        }
        if self.engaged_count() >= self.config.max_concurrent as usize {
            return false;
        }

        let rule = candidate.rule();
        self.slots
            .iter()
            .map(|slot| &slot.descriptor)
            .filter(|other| other.lifecycle().is_engaged() && other.kind() != candidate.kind())
            .all(|other| {
                rule.can_stack
                    && other.rule().can_stack
                    && !rule.excludes.contains(&other.kind())
                    && !other.rule().excludes.contains(&candidate.kind())
            })
    }

    fn is_eligible(&self, kind: SpecialEventKind, wave: WaveNumber) -> bool {
        let Some(index) = self.index_of(kind) else {
            return false;
        };
        let descriptor = &self.slots[index].descriptor;
        wave.get() >= descriptor.rule().min_wave
            && descriptor.cooled_down(wave)
            && self.can_start(index)
    }

    /// Highest priority eligible milestone kind; ties go to registration order.
    fn milestone_choice(&self, wave: WaveNumber) -> Option<SpecialEventKind> {
        let mut best: Option<&EventDescriptor> = None;
        for descriptor in self.slots.iter().map(|slot| &slot.descriptor) {
            if !descriptor.rule().is_milestone(wave) || !self.is_eligible(descriptor.kind(), wave)
            {
                continue;
            }
            if best.map_or(true, |current| descriptor.rule().priority > current.rule().priority) {
                best = Some(descriptor);
            }
        }
        best.map(EventDescriptor::kind)
    }

    /// One roll over `[0, max(1, sum))`; landing past the sum selects nothing.
    fn rolled_choice(&self, wave: WaveNumber) -> Option<SpecialEventKind> {
        let candidates: Vec<&EventDescriptor> = self
            .slots
            .iter()
            .map(|slot| &slot.descriptor)
            .filter(|descriptor| {
                descriptor.rule().probability > 0.0 && self.is_eligible(descriptor.kind(), wave)
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let total: f32 = candidates
            .iter()
            .map(|descriptor| descriptor.rule().probability)
            .sum();
        let mut rng =
            ChaCha8Rng::seed_from_u64(derive_wave_seed(self.config.seed, wave, RNG_STREAM_EVENTS));
        let roll = rng.gen_range(0.0..total.max(1.0));

        let mut cumulative = 0.0;
        for descriptor in candidates {
            cumulative += descriptor.rule().probability;
            if roll < cumulative {
                return Some(descriptor.kind());
            }
        }
        None
    }

    fn start(&mut self, index: usize, wave: WaveNumber, out: &mut Vec<Event>) {
        let slot = &mut self.slots[index];
        let kind = slot.descriptor.kind();
        slot.descriptor.mark_activated(wave);
        out.push(Event::SpecialEventStarted { kind, wave });
        info!(?kind, wave = wave.get(), "special event started");

        if slot.state.activate(out) == Progress::Finished {
            self.finish(index, out);
        }
    }

    fn finish(&mut self, index: usize, out: &mut Vec<Event>) {
        let slot = &mut self.slots[index];
        let kind = slot.descriptor.kind();
        slot.state.deactivate(out);
        slot.descriptor.set_lifecycle(EventLifecycle::Inactive);
        out.push(Event::SpecialEventEnded { kind });
        info!(?kind, "special event ended");
    }

    fn settle(&mut self, out: &mut Vec<Event>) {
        for index in 0..self.slots.len() {
            if self.slots[index].descriptor.lifecycle() == EventLifecycle::Ending {
                self.finish(index, out);
            }
        }
    }
}
