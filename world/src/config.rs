use serde::{Deserialize, Serialize};
use wave_director_core::{BossWaveSchedule, ConfigError, EntityType, WaveNumber};
use wave_director_system_difficulty::DifficultyConfig;
use wave_director_system_special_events::SchedulerConfig;
use wave_director_system_threat_budget::AllocatorConfig;

/// Gateway count that applies from `from_wave` onwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayStep {
    /// First wave the step applies to.
    pub from_wave: u32,
    /// Gateways opened while the step applies.
    pub count: u32,
}

/// Step function from wave number to requested gateways.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewaySchedule {
    steps: Vec<GatewayStep>,
}

impl GatewaySchedule {
    /// Creates a schedule, sorting the steps by their first wave.
    #[must_use]
    pub fn new(mut steps: Vec<GatewayStep>) -> Self {
        steps.sort_by_key(|step| step.from_wave);
        Self { steps }
    }

    /// Steps ordered by first wave.
    #[must_use]
    pub fn steps(&self) -> &[GatewayStep] {
        &self.steps
    }

    /// Gateways requested for `wave`; a single gateway before the first step.
    #[must_use]
    pub fn count_for(&self, wave: WaveNumber) -> u32 {
        self.steps
            .iter()
            .filter(|step| step.from_wave <= wave.get())
            .max_by_key(|step| step.from_wave)
            .map_or(1, |step| step.count)
    }
}

impl Default for GatewaySchedule {
    fn default() -> Self {
        Self::new(vec![
            GatewayStep {
                from_wave: 1,
                count: 1,
            },
            GatewayStep {
                from_wave: 4,
                count: 2,
            },
            GatewayStep {
                from_wave: 8,
                count: 3,
            },
            GatewayStep {
                from_wave: 12,
                count: 4,
            },
        ])
    }
}

/// Aggregated configuration of the wave director.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Overrides the allocator and event seeds when set.
    pub seed: Option<u64>,
    /// Delay between preparing a wave and starting it, and between waves.
    pub transition_delay_ms: u64,
    /// Boss cadence; authoritative for the event scheduler as well.
    pub boss_waves: BossWaveSchedule,
    /// Bosses appended to boss waves, cycled in order.
    pub boss_order: Vec<EntityType>,
    /// Gap before the appended boss.
    pub boss_entry_delay_ms: u64,
    /// Gateway step function.
    pub gateways: GatewaySchedule,
    /// Threat budget allocator.
    pub allocator: AllocatorConfig,
    /// Adaptive difficulty controller.
    pub difficulty: DifficultyConfig,
    /// Special event scheduler.
    pub events: SchedulerConfig,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            transition_delay_ms: 5_000,
            boss_waves: BossWaveSchedule::default(),
            boss_order: vec![
                EntityType::new("brute_king"),
                EntityType::new("spitter_queen"),
                EntityType::new("abomination"),
            ],
            boss_entry_delay_ms: 2_000,
            gateways: GatewaySchedule::default(),
            allocator: AllocatorConfig::default(),
            difficulty: DifficultyConfig::default(),
            events: SchedulerConfig::default(),
        }
    }
}

impl DirectorConfig {
    /// Validates every component configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.boss_waves.interval != 0 && self.boss_order.is_empty() {
            return Err(ConfigError::Empty {
                field: "boss_order",
            });
        }
        self.allocator.validate()?;
        self.difficulty.validate()?;
        self.events.validate()
    }

    /// Allocator configuration with the global seed applied.
    #[must_use]
    pub fn seeded_allocator(&self) -> AllocatorConfig {
        AllocatorConfig {
            seed: self.seed.unwrap_or(self.allocator.seed),
            ..self.allocator.clone()
        }
    }

    /// Scheduler configuration with the global seed and boss cadence applied.
    #[must_use]
    pub fn seeded_events(&self) -> SchedulerConfig {
        SchedulerConfig {
            seed: self.seed.unwrap_or(self.events.seed),
            boss_waves: self.boss_waves,
            ..self.events.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_steps_pick_the_latest_applicable_step() {
        let schedule = GatewaySchedule::new(vec![
            GatewayStep {
                from_wave: 6,
                count: 3,
            },
            GatewayStep {
                from_wave: 2,
                count: 2,
            },
        ]);
        assert_eq!(schedule.count_for(WaveNumber::new(1)), 1);
        assert_eq!(schedule.count_for(WaveNumber::new(2)), 2);
        assert_eq!(schedule.count_for(WaveNumber::new(5)), 2);
        assert_eq!(schedule.count_for(WaveNumber::new(40)), 3);
    }

    #[test]
    fn seed_override_reaches_every_stream() {
        let config = DirectorConfig {
            seed: Some(99),
            ..DirectorConfig::default()
        };
        assert_eq!(config.seeded_allocator().seed, 99);
        assert_eq!(config.seeded_events().seed, 99);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: DirectorConfig = toml::from_str(
            r#"
            transition_delay_ms = 1000

            [[gateways]]
            from_wave = 1
            count = 2

            [allocator.curve]
            kind = "exponential"
            "#,
        )
        .expect("config parses");

        assert_eq!(config.transition_delay_ms, 1_000);
        assert_eq!(config.gateways.count_for(WaveNumber::new(9)), 2);
        assert_eq!(config.allocator.curve.base, 5.0);
        assert_eq!(config.difficulty, DifficultyConfig::default());
        assert!(config.validate().is_ok());
    }
}
