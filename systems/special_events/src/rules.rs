use std::time::Duration;

use serde::{Deserialize, Serialize};
use wave_director_core::{BossWaveSchedule, ConfigError, SpecialEventKind, WaveNumber};

use crate::kinds::{BlackoutConfig, BossRushConfig, DoorHazardConfig, HordeConfig, SupplyDropConfig};

/// Lifecycle of one event kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EventLifecycle {
    /// Not running; may be selected.
    #[default]
    Inactive,
    /// Selected for the upcoming wave and waiting for activation.
    Pending,
    /// Running.
    Active,
    /// Its end condition was met; deactivation runs on the next settle point.
    Ending,
}

impl EventLifecycle {
    /// Reports whether the event occupies a concurrency slot.
    #[must_use]
    pub const fn is_engaged(self) -> bool {
        !matches!(self, EventLifecycle::Inactive)
    }
}

/// How an event kind ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DurationPolicy {
    /// Ends when the wave completes; enforced by the scheduler.
    Wave,
    /// Ends by itself once the duration elapsed.
    Timed(Duration),
    /// Ends right after activation.
    Instant,
    /// Ends once its own condition is met.
    Condition,
}

/// Static scheduling rule of one event kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRule {
    /// First wave the kind may fire on.
    pub min_wave: u32,
    /// Firing chance, also used as the kind's weight when several are eligible.
    pub probability: f32,
    /// Waves that must pass between two activations.
    pub cooldown_waves: u32,
    /// Tie-breaker among milestone overrides; higher wins.
    pub priority: i32,
    /// Whether the kind may run alongside other events.
    pub can_stack: bool,
    /// Kinds that may not run at the same time as this one.
    pub excludes: Vec<SpecialEventKind>,
    /// Waves on which the kind fires without a roll, even on boss waves.
    pub milestone_waves: Vec<u32>,
}

impl Default for EventRule {
    fn default() -> Self {
        Self {
            min_wave: 3,
            probability: 0.1,
            cooldown_waves: 3,
            priority: 0,
            can_stack: true,
            excludes: Vec::new(),
            milestone_waves: Vec::new(),
        }
    }
}

impl EventRule {
    /// Reports whether `wave` is one of the kind's milestone waves.
    #[must_use]
    pub fn is_milestone(&self, wave: WaveNumber) -> bool {
        self.milestone_waves.contains(&wave.get())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(ConfigError::OutOfRange {
                field: "events.rule.probability",
                expectation: "within [0, 1]",
                value: f64::from(self.probability),
            });
        }
        Ok(())
    }
}

/// Rule and kind-specific tuning of one registered event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "K: Deserialize<'de> + Default"))]
pub struct EventSettings<K> {
    /// Scheduling rule.
    pub rule: EventRule,
    /// Kind-specific tuning.
    #[serde(flatten)]
    pub tuning: K,
}

impl<K: Default> Default for EventSettings<K> {
    fn default() -> Self {
        Self {
            rule: EventRule::default(),
            tuning: K::default(),
        }
    }
}

impl<K> EventSettings<K> {
    fn with_rule(rule: EventRule, tuning: K) -> Self {
        Self { rule, tuning }
    }
}

/// Global gates and per-kind settings of the scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// No event fires before this wave, whatever the roll.
    pub min_wave_for_events: u32,
    /// Maximum number of events pending or running at once.
    pub max_concurrent: u32,
    /// Boss waves, on which only milestone overrides fire.
    pub boss_waves: BossWaveSchedule,
    /// Global seed the per-wave event stream is derived from.
    pub seed: u64,
    /// Mass-spawn event.
    pub horde: EventSettings<HordeConfig>,
    /// Visibility-reduction event.
    pub blackout: EventSettings<BlackoutConfig>,
    /// Hazard-door event.
    pub door_hazard: EventSettings<DoorHazardConfig>,
    /// Multi-boss gauntlet.
    pub boss_rush: EventSettings<BossRushConfig>,
    /// Instant reward drop.
    pub supply_drop: EventSettings<SupplyDropConfig>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_wave_for_events: 3,
            max_concurrent: 2,
            boss_waves: BossWaveSchedule::default(),
            seed: 0x5eed_0f_7a11,
            horde: EventSettings::with_rule(
                EventRule {
                    min_wave: 3,
                    probability: 0.15,
                    cooldown_waves: 3,
                    priority: 1,
                    excludes: vec![SpecialEventKind::BossRush],
                    ..EventRule::default()
                },
                HordeConfig::default(),
            ),
            blackout: EventSettings::with_rule(
                EventRule {
                    min_wave: 4,
                    probability: 0.1,
                    cooldown_waves: 4,
                    priority: 1,
                    ..EventRule::default()
                },
                BlackoutConfig::default(),
            ),
            door_hazard: EventSettings::with_rule(
                EventRule {
                    min_wave: 5,
                    probability: 0.1,
                    cooldown_waves: 3,
                    priority: 2,
                    excludes: vec![SpecialEventKind::BossRush],
                    ..EventRule::default()
                },
                DoorHazardConfig::default(),
            ),
            boss_rush: EventSettings::with_rule(
                EventRule {
                    min_wave: 10,
                    probability: 0.0,
                    cooldown_waves: 10,
                    priority: 10,
                    can_stack: false,
                    excludes: vec![SpecialEventKind::Horde, SpecialEventKind::DoorHazard],
                    milestone_waves: vec![10, 20, 30],
                },
                BossRushConfig::default(),
            ),
            supply_drop: EventSettings::with_rule(
                EventRule {
                    min_wave: 3,
                    probability: 0.1,
                    cooldown_waves: 2,
                    priority: 0,
                    ..EventRule::default()
                },
                SupplyDropConfig::default(),
            ),
        }
    }
}

impl SchedulerConfig {
    /// Rule of the provided kind.
    #[must_use]
    pub fn rule(&self, kind: SpecialEventKind) -> &EventRule {
        match kind {
            SpecialEventKind::Horde => &self.horde.rule,
            SpecialEventKind::Blackout => &self.blackout.rule,
            SpecialEventKind::DoorHazard => &self.door_hazard.rule,
            SpecialEventKind::BossRush => &self.boss_rush.rule,
            SpecialEventKind::SupplyDrop => &self.supply_drop.rule,
        }
    }

    /// Rejects settings no schedule can honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::OutOfRange {
                field: "events.max_concurrent",
                expectation: "greater than zero",
                value: 0.0,
            });
        }
        for kind in SpecialEventKind::ALL {
            self.rule(kind).validate()?;
        }
        if self.horde.tuning.multiplier == 0 {
            return Err(ConfigError::OutOfRange {
                field: "events.horde.multiplier",
                expectation: "at least 1",
                value: 0.0,
            });
        }
        if !(0.0..=1.0).contains(&self.blackout.tuning.visibility) {
            return Err(ConfigError::OutOfRange {
                field: "events.blackout.visibility",
                expectation: "within [0, 1]",
                value: f64::from(self.blackout.tuning.visibility),
            });
        }
        if self.door_hazard.tuning.kill_target == 0 {
            return Err(ConfigError::OutOfRange {
                field: "events.door_hazard.kill_target",
                expectation: "at least 1",
                value: 0.0,
            });
        }
        if self.boss_rush.tuning.bosses.is_empty() {
            return Err(ConfigError::Empty {
                field: "events.boss_rush.bosses",
            });
        }
        Ok(())
    }
}

/// Static rule plus runtime bookkeeping of one registered kind.
#[derive(Clone, Debug, PartialEq)]
pub struct EventDescriptor {
    kind: SpecialEventKind,
    rule: EventRule,
    duration: DurationPolicy,
    lifecycle: EventLifecycle,
    last_activation_wave: Option<WaveNumber>,
}

impl EventDescriptor {
    pub(crate) fn new(kind: SpecialEventKind, rule: EventRule, duration: DurationPolicy) -> Self {
        Self {
            kind,
            rule,
            duration,
            lifecycle: EventLifecycle::Inactive,
            last_activation_wave: None,
        }
    }

    /// Kind described.
    #[must_use]
    pub const fn kind(&self) -> SpecialEventKind {
        self.kind
    }

    /// Scheduling rule.
    #[must_use]
    pub fn rule(&self) -> &EventRule {
        &self.rule
    }

    /// How the kind ends.
    #[must_use]
    pub const fn duration(&self) -> DurationPolicy {
        self.duration
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn lifecycle(&self) -> EventLifecycle {
        self.lifecycle
    }

    /// Wave of the most recent activation.
    #[must_use]
    pub const fn last_activation_wave(&self) -> Option<WaveNumber> {
        self.last_activation_wave
    }

    /// Reports whether the cooldown allows an activation on `wave`.
    #[must_use]
    pub fn cooled_down(&self, wave: WaveNumber) -> bool {
        self.last_activation_wave
            .map_or(true, |last| wave.waves_since(last) >= self.rule.cooldown_waves)
    }

    pub(crate) fn set_lifecycle(&mut self, lifecycle: EventLifecycle) {
        self.lifecycle = lifecycle;
    }

    pub(crate) fn mark_activated(&mut self, wave: WaveNumber) {
        self.lifecycle = EventLifecycle::Active;
        self.last_activation_wave = Some(wave);
    }

    pub(crate) fn forget_history(&mut self) {
        self.lifecycle = EventLifecycle::Inactive;
        self.last_activation_wave = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_counts_whole_waves() {
        let mut descriptor = EventDescriptor::new(
            SpecialEventKind::Horde,
            EventRule {
                cooldown_waves: 3,
                ..EventRule::default()
            },
            DurationPolicy::Wave,
        );
        assert!(descriptor.cooled_down(WaveNumber::new(1)));

        descriptor.mark_activated(WaveNumber::new(4));
        assert!(!descriptor.cooled_down(WaveNumber::new(6)));
        assert!(descriptor.cooled_down(WaveNumber::new(7)));
    }

    #[test]
    fn settings_deserialize_with_flattened_tuning() {
        let config: SchedulerConfig = toml::from_str(
            r#"
            max_concurrent = 1

            [horde]
            multiplier = 4

            [horde.rule]
            probability = 0.5
            "#,
        )
        .expect("config parses");

        assert_eq!(config.max_concurrent, 1);
        assert_eq!(config.horde.tuning.multiplier, 4);
        assert_eq!(config.horde.rule.probability, 0.5);
        assert_eq!(config.blackout, SchedulerConfig::default().blackout);
    }

    #[test]
    fn empty_boss_list_is_rejected() {
        let mut config = SchedulerConfig::default();
        config.boss_rush.tuning.bosses.clear();
        assert!(config.validate().is_err());
        assert!(SchedulerConfig::default().validate().is_ok());
    }
}
