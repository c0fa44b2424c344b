use std::time::Duration;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use wave_director_core::{ConfigError, EntityType, SpawnEntry};

/// Spacing knobs for the pacing pass that turns a spend list into a spawn plan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Gap between two entries of a dense burst before difficulty scaling.
    pub base_gap_ms: u32,
    /// Upper bound of the uniform jitter added to every gap.
    pub jitter_ms: u32,
    /// Share of the plan that is not burst; `0.2` inserts a breathing gap every
    /// `ceil(count * 0.8)` entries.
    pub breathing_ratio: f32,
    /// Multiple of the base gap used for breathing gaps.
    pub breathing_gap_factor: f32,
    /// Upper bound of the near-zero delay of the first entry.
    pub lead_in_ms: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base_gap_ms: 900,
            jitter_ms: 300,
            breathing_ratio: 0.2,
            breathing_gap_factor: 3.0,
            lead_in_ms: 50,
        }
    }
}

impl PacingConfig {
    /// Ensures the ratio and factor describe a usable pacing policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.breathing_ratio) {
            return Err(ConfigError::OutOfRange {
                field: "pacing.breathing_ratio",
                expectation: "within [0, 1)",
                value: f64::from(self.breathing_ratio),
            });
        }
        if self.breathing_gap_factor.is_nan() || self.breathing_gap_factor < 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "pacing.breathing_gap_factor",
                expectation: "at least 1",
                value: f64::from(self.breathing_gap_factor),
            });
        }
        Ok(())
    }
}

/// Shuffles the spend list and assigns burst and breathing delays.
pub(crate) fn pace<R: Rng>(
    mut picks: Vec<EntityType>,
    config: &PacingConfig,
    spawn_delay_multiplier: f32,
    rng: &mut R,
) -> Vec<SpawnEntry> {
    picks.shuffle(rng);

    let base_gap = f64::from(config.base_gap_ms) * f64::from(spawn_delay_multiplier.max(0.0));
    let breathing_gap = base_gap * f64::from(config.breathing_gap_factor);
    let breathing_every = breathing_interval(picks.len(), config.breathing_ratio);

    let mut entries = Vec::with_capacity(picks.len());
    for (index, entity) in picks.into_iter().enumerate() {
        let delay_ms = if index == 0 {
            f64::from(jitter(rng, config.lead_in_ms))
        } else if breathing_every > 0 && index % breathing_every == 0 {
            breathing_gap + f64::from(jitter(rng, config.jitter_ms))
        } else {
            base_gap + f64::from(jitter(rng, config.jitter_ms))
        };
        entries.push(SpawnEntry {
            entity,
            delay: Duration::from_millis(delay_ms.round() as u64),
        });
    }
    entries
}

fn breathing_interval(count: usize, breathing_ratio: f32) -> usize {
    let burst_share = 1.0 - f64::from(breathing_ratio);
    (count as f64 * burst_share).ceil() as usize
}

fn jitter<R: Rng>(rng: &mut R, max_ms: u32) -> u32 {
    if max_ms == 0 {
        return 0;
    }
    rng.gen_range(0..=max_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn picks(count: usize) -> Vec<EntityType> {
        (0..count).map(|_| EntityType::new("walker")).collect()
    }

    #[test]
    fn breathing_interval_rounds_up() {
        assert_eq!(breathing_interval(10, 0.2), 8);
        assert_eq!(breathing_interval(3, 0.2), 3);
        assert_eq!(breathing_interval(0, 0.2), 0);
    }

    #[test]
    fn first_entry_is_near_zero_and_breaths_are_longer() {
        let config = PacingConfig {
            base_gap_ms: 1_000,
            jitter_ms: 0,
            breathing_ratio: 0.5,
            breathing_gap_factor: 3.0,
            lead_in_ms: 0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let entries = pace(picks(6), &config, 1.0, &mut rng);

        let delays: Vec<u64> = entries
            .iter()
            .map(|entry| entry.delay.as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![0, 1_000, 1_000, 3_000, 1_000, 1_000]);
    }

    #[test]
    fn delay_multiplier_scales_gaps() {
        let config = PacingConfig {
            jitter_ms: 0,
            lead_in_ms: 0,
            breathing_ratio: 0.0,
            ..PacingConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let entries = pace(picks(3), &config, 2.0, &mut rng);
        assert_eq!(entries[1].delay, Duration::from_millis(1_800));
    }

    #[test]
    fn rejects_full_breathing_ratio() {
        let config = PacingConfig {
            breathing_ratio: 1.0,
            ..PacingConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(PacingConfig::default().validate().is_ok());
    }
}
