//! Concrete special event kinds and the closed enum dispatching their hooks.

mod boss_rush;
mod door_hazard;
mod horde;
mod instant;
mod visibility;

use std::time::Duration;

use wave_director_core::{EntityType, Event, SpecialEventKind, WaveComposition};

use crate::{DurationPolicy, SchedulerConfig};

pub use boss_rush::BossRushConfig;
pub use door_hazard::DoorHazardConfig;
pub use horde::HordeConfig;
pub use instant::SupplyDropConfig;
pub use visibility::BlackoutConfig;

pub(crate) use boss_rush::BossRush;
pub(crate) use door_hazard::DoorHazard;
pub(crate) use horde::Horde;
pub(crate) use instant::SupplyDrop;
pub(crate) use visibility::Blackout;

/// How long event banners stay on screen.
pub(crate) const BANNER: Duration = Duration::from_secs(3);

/// Outcome of a lifecycle hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Progress {
    Continue,
    Finished,
}

/// Runtime state of one registered kind; hooks dispatch by variant.
#[derive(Clone, Debug)]
pub(crate) enum KindState {
    Horde(Horde),
    Blackout(Blackout),
    DoorHazard(DoorHazard),
    BossRush(BossRush),
    SupplyDrop(SupplyDrop),
}

impl KindState {
    /// Builds the state of every kind in registration order.
    pub(crate) fn registry(config: &SchedulerConfig) -> Vec<KindState> {
        SpecialEventKind::ALL
            .iter()
            .map(|kind| match kind {
                SpecialEventKind::Horde => KindState::Horde(Horde::new(config.horde.tuning.clone())),
                SpecialEventKind::Blackout => {
                    KindState::Blackout(Blackout::new(config.blackout.tuning.clone()))
                }
                SpecialEventKind::DoorHazard => {
                    KindState::DoorHazard(DoorHazard::new(config.door_hazard.tuning.clone()))
                }
                SpecialEventKind::BossRush => {
                    KindState::BossRush(BossRush::new(config.boss_rush.tuning.clone()))
                }
                SpecialEventKind::SupplyDrop => {
                    KindState::SupplyDrop(SupplyDrop::new(config.supply_drop.tuning.clone()))
                }
            })
            .collect()
    }

    pub(crate) const fn kind(&self) -> SpecialEventKind {
        match self {
            KindState::Horde(_) => SpecialEventKind::Horde,
            KindState::Blackout(_) => SpecialEventKind::Blackout,
            KindState::DoorHazard(_) => SpecialEventKind::DoorHazard,
            KindState::BossRush(_) => SpecialEventKind::BossRush,
            KindState::SupplyDrop(_) => SpecialEventKind::SupplyDrop,
        }
    }

    pub(crate) fn policy(&self) -> DurationPolicy {
        match self {
            KindState::Horde(_) => DurationPolicy::Wave,
            KindState::Blackout(blackout) => DurationPolicy::Timed(blackout.duration()),
            KindState::DoorHazard(_) | KindState::BossRush(_) => DurationPolicy::Condition,
            KindState::SupplyDrop(_) => DurationPolicy::Instant,
        }
    }

    pub(crate) fn activate(&mut self, out: &mut Vec<Event>) -> Progress {
        match self {
            KindState::Horde(horde) => horde.activate(out),
            KindState::Blackout(blackout) => blackout.activate(out),
            KindState::DoorHazard(door) => door.activate(out),
            KindState::BossRush(rush) => rush.activate(out),
            KindState::SupplyDrop(drop) => drop.activate(out),
        }
    }

    pub(crate) fn deactivate(&mut self, out: &mut Vec<Event>) {
        match self {
            KindState::Blackout(blackout) => blackout.deactivate(out),
            KindState::BossRush(rush) => rush.deactivate(),
            KindState::DoorHazard(door) => door.deactivate(),
            KindState::Horde(_) | KindState::SupplyDrop(_) => {}
        }
    }

    pub(crate) fn update(&mut self, dt: Duration, out: &mut Vec<Event>) -> Progress {
        match self {
            KindState::Blackout(blackout) => blackout.update(dt),
            KindState::DoorHazard(door) => door.update(dt, out),
            KindState::BossRush(rush) => rush.update(dt, out),
            KindState::Horde(_) | KindState::SupplyDrop(_) => Progress::Continue,
        }
    }

    pub(crate) fn on_entity_killed(&mut self, entity: &EntityType, out: &mut Vec<Event>) -> Progress {
        match self {
            KindState::DoorHazard(door) => door.on_entity_killed(out),
            KindState::BossRush(rush) => rush.on_entity_killed(entity, out),
            KindState::Horde(_) | KindState::Blackout(_) | KindState::SupplyDrop(_) => {
                Progress::Continue
            }
        }
    }

    /// Lets kinds that track entities by type see the committed plan.
    pub(crate) fn note_planned(&mut self, composition: &WaveComposition) {
        if let KindState::BossRush(rush) = self {
            rush.note_planned(composition);
        }
    }

    /// Death bookkeeping for kinds that are not running.
    pub(crate) fn note_kill(&mut self, entity: &EntityType) {
        if let KindState::BossRush(rush) = self {
            rush.note_kill(entity);
        }
    }

    pub(crate) fn forget_planned(&mut self) {
        if let KindState::BossRush(rush) = self {
            rush.forget_planned();
        }
    }

    pub(crate) fn modify_wave_config(&self, composition: WaveComposition) -> WaveComposition {
        match self {
            KindState::Horde(horde) => horde.reshape(&composition),
            _ => composition,
        }
    }

    pub(crate) fn blocks_wave_completion(&self) -> bool {
        match self {
            KindState::BossRush(rush) => rush.has_bosses_left(),
            _ => false,
        }
    }
}
