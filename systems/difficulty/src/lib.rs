#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Adaptive difficulty controller nudging bounded multipliers toward the player's skill.
//!
//! The controller pulls a [`PerformanceSnapshot`] on demand, classifies the
//! player with a double threshold (two metrics must agree before a side wins)
//! and applies at most one bounded step per cooldown period.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wave_director_core::{
    ConfigError, DifficultyModifiers, ModifierLimits, PerformanceSnapshot, PlayerState,
    TelemetryFeed,
};

/// Metric thresholds that count toward the struggling side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrugglingThresholds {
    /// Accuracy below this value counts.
    pub accuracy_below: f32,
    /// Damage taken per minute above this value counts.
    pub damage_taken_above: f32,
    /// Health fraction below this value counts.
    pub health_below: f32,
    /// Average clear time above this many seconds counts.
    pub clear_seconds_above: f32,
}

impl Default for StrugglingThresholds {
    fn default() -> Self {
        Self {
            accuracy_below: 0.3,
            damage_taken_above: 50.0,
            health_below: 0.3,
            clear_seconds_above: 120.0,
        }
    }
}

/// Metric thresholds that count toward the dominating side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DominatingThresholds {
    /// Accuracy above this value counts.
    pub accuracy_above: f32,
    /// Damage taken per minute below this value counts.
    pub damage_taken_below: f32,
    /// Health fraction above this value counts.
    pub health_above: f32,
    /// Average clear time below this many seconds counts.
    pub clear_seconds_below: f32,
}

impl Default for DominatingThresholds {
    fn default() -> Self {
        Self {
            accuracy_above: 0.7,
            damage_taken_below: 10.0,
            health_above: 0.8,
            clear_seconds_below: 30.0,
        }
    }
}

/// Both sides of the classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Struggling side.
    pub struggling: StrugglingThresholds,
    /// Dominating side.
    pub dominating: DominatingThresholds,
}

/// Tuning of the adaptive controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Whether the controller starts enabled.
    pub enabled: bool,
    /// Classification thresholds.
    pub thresholds: Thresholds,
    /// Size of one adjustment step; neutral normalization moves half a step.
    pub step: f32,
    /// Bounds every multiplier is clamped into.
    pub limits: ModifierLimits,
    /// Minimum time between two timer-driven adjustments, in milliseconds.
    pub cooldown_ms: u64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            thresholds: Thresholds::default(),
            step: 0.1,
            limits: ModifierLimits::default(),
            cooldown_ms: 10_000,
        }
    }
}

impl DifficultyConfig {
    /// Cooldown between adjustments.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Rejects non-positive steps and malformed bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "difficulty.step",
                expectation: "a positive number",
                value: f64::from(self.step),
            });
        }
        self.limits.validate()
    }
}

/// Number of metrics crossing each side's thresholds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassificationScore {
    /// Metrics in the unfavourable direction.
    pub struggling: u8,
    /// Metrics in the favourable direction.
    pub dominating: u8,
}

impl ClassificationScore {
    /// Minimum number of agreeing metrics needed for a side to win.
    pub const QUORUM: u8 = 2;

    /// Resolves the score into a player state; ties and weak signals stay neutral.
    #[must_use]
    pub const fn state(&self) -> PlayerState {
        let struggling = self.struggling >= Self::QUORUM;
        let dominating = self.dominating >= Self::QUORUM;
        match (struggling, dominating) {
            (true, false) => PlayerState::Struggling,
            (false, true) => PlayerState::Dominating,
            _ => PlayerState::Neutral,
        }
    }
}

/// One adjustment step applied by the controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyAdjustment {
    /// Classification that drove the step.
    pub state: PlayerState,
    /// Multipliers after the step.
    pub modifiers: DifficultyModifiers,
}

/// Closed-loop controller owning the [`DifficultyModifiers`].
#[derive(Debug)]
pub struct DifficultyController {
    config: DifficultyConfig,
    enabled: bool,
    modifiers: DifficultyModifiers,
    last_state: PlayerState,
    cooldown_remaining: Duration,
}

impl Default for DifficultyController {
    fn default() -> Self {
        Self::new(DifficultyConfig::default())
    }
}

impl DifficultyController {
    /// Creates a controller with neutral multipliers and a full cooldown.
    #[must_use]
    pub fn new(config: DifficultyConfig) -> Self {
        Self {
            enabled: config.enabled,
            modifiers: DifficultyModifiers::NEUTRAL.clamped(&config.limits),
            last_state: PlayerState::Neutral,
            cooldown_remaining: config.cooldown(),
            config,
        }
    }

    /// Configuration the controller was built with.
    #[must_use]
    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    /// Current multipliers.
    #[must_use]
    pub fn modifiers(&self) -> DifficultyModifiers {
        self.modifiers
    }

    /// State that drove the most recent adjustment.
    #[must_use]
    pub fn last_state(&self) -> PlayerState {
        self.last_state
    }

    /// Reports whether adaptive adjustments run.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Counts how many metrics cross each side's thresholds.
    #[must_use]
    pub fn score(&self, snapshot: &PerformanceSnapshot) -> ClassificationScore {
        let struggling = &self.config.thresholds.struggling;
        let dominating = &self.config.thresholds.dominating;
        let clear = snapshot.average_clear_seconds;

        let struggling_hits = [
            snapshot.accuracy < struggling.accuracy_below,
            snapshot.damage_taken_per_minute > struggling.damage_taken_above,
            snapshot.health_fraction < struggling.health_below,
            clear.is_some_and(|seconds| seconds > struggling.clear_seconds_above),
        ];
        let dominating_hits = [
            snapshot.accuracy > dominating.accuracy_above,
            snapshot.damage_taken_per_minute < dominating.damage_taken_below,
            snapshot.health_fraction > dominating.health_above,
            clear.is_some_and(|seconds| seconds < dominating.clear_seconds_below),
        ];

        ClassificationScore {
            struggling: count_hits(&struggling_hits),
            dominating: count_hits(&dominating_hits),
        }
    }

    /// Classifies the player's current performance.
    #[must_use]
    pub fn evaluate(&self, feed: &dyn TelemetryFeed) -> PlayerState {
        self.score(&feed.performance_snapshot()).state()
    }

    /// Advances the cooldown and applies one step once it has elapsed.
    ///
    /// Returns the adjustment when the step changed at least one multiplier.
    pub fn tick(&mut self, dt: Duration, feed: &dyn TelemetryFeed) -> Option<DifficultyAdjustment> {
        if !self.enabled {
            return None;
        }

        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(dt);
        if !self.cooldown_remaining.is_zero() {
            return None;
        }
        self.cooldown_remaining = self.config.cooldown();

        let state = self.evaluate(feed);
        if state != self.last_state {
            info!(from = ?self.last_state, to = ?state, "player state changed");
        }
        self.last_state = state;

        let stepped = self.step(state);
        if stepped == self.modifiers {
            return None;
        }
        self.modifiers = stepped;
        debug!(
            ?state,
            spawn_delay = stepped.spawn_delay_multiplier,
            budget = stepped.budget_multiplier,
            drop_rate = stepped.drop_rate_multiplier,
            "difficulty adjusted"
        );
        Some(DifficultyAdjustment {
            state,
            modifiers: stepped,
        })
    }

    /// Forces an evaluation at a wave boundary regardless of the timer phase.
    pub fn on_wave_complete(&mut self, feed: &dyn TelemetryFeed) -> Option<DifficultyAdjustment> {
        self.cooldown_remaining = Duration::ZERO;
        self.tick(Duration::ZERO, feed)
    }

    /// Enables or disables adjustments; disabling snaps every multiplier to neutral.
    ///
    /// Returns the resulting adjustment when the snap changed the multipliers.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<DifficultyAdjustment> {
        if self.enabled == enabled {
            return None;
        }
        self.enabled = enabled;
        info!(enabled, "adaptive difficulty toggled");
        self.cooldown_remaining = self.config.cooldown();
        if enabled {
            return None;
        }

        self.last_state = PlayerState::Neutral;
        let neutral = DifficultyModifiers::NEUTRAL.clamped(&self.config.limits);
        if neutral == self.modifiers {
            return None;
        }
        self.modifiers = neutral;
        Some(DifficultyAdjustment {
            state: PlayerState::Neutral,
            modifiers: neutral,
        })
    }

    /// Restores neutral multipliers and a full cooldown; the enabled flag is kept.
    pub fn reset(&mut self) {
        self.modifiers = DifficultyModifiers::NEUTRAL.clamped(&self.config.limits);
        self.last_state = PlayerState::Neutral;
        self.cooldown_remaining = self.config.cooldown();
    }

    fn step(&self, state: PlayerState) -> DifficultyModifiers {
        let step = self.config.step;
        let current = self.modifiers;
        let next = match state {
            PlayerState::Struggling => DifficultyModifiers {
                spawn_delay_multiplier: current.spawn_delay_multiplier + step,
                budget_multiplier: current.budget_multiplier - step,
                drop_rate_multiplier: current.drop_rate_multiplier + step,
            },
            PlayerState::Dominating => DifficultyModifiers {
                spawn_delay_multiplier: current.spawn_delay_multiplier - step,
                budget_multiplier: current.budget_multiplier + step,
                drop_rate_multiplier: current.drop_rate_multiplier - step,
            },
            PlayerState::Neutral => {
                let half = step / 2.0;
                DifficultyModifiers {
                    spawn_delay_multiplier: toward_neutral(current.spawn_delay_multiplier, half),
                    budget_multiplier: toward_neutral(current.budget_multiplier, half),
                    drop_rate_multiplier: toward_neutral(current.drop_rate_multiplier, half),
                }
            }
        };
        next.clamped(&self.config.limits)
    }
}

fn count_hits(hits: &[bool]) -> u8 {
    hits.iter().map(|hit| u8::from(*hit)).sum()
}

/// Moves `value` toward `1.0` by at most `amount`, never overshooting.
fn toward_neutral(value: f32, amount: f32) -> f32 {
    if value > 1.0 {
        (value - amount).max(1.0)
    } else if value < 1.0 {
        (value + amount).min(1.0)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_never_overshoots() {
        assert_eq!(toward_neutral(1.02, 0.05), 1.0);
        assert_eq!(toward_neutral(0.98, 0.05), 1.0);
        assert_eq!(toward_neutral(1.0, 0.05), 1.0);
        assert!((toward_neutral(1.3, 0.05) - 1.25).abs() < 1e-6);
    }

    #[test]
    fn missing_clear_time_counts_for_neither_side() {
        let controller = DifficultyController::default();
        let snapshot = PerformanceSnapshot {
            accuracy: 0.2,
            damage_taken_per_minute: 25.0,
            health_fraction: 0.5,
            average_clear_seconds: None,
            kills_per_minute: 0.0,
        };
        assert_eq!(
            controller.score(&snapshot),
            ClassificationScore {
                struggling: 1,
                dominating: 0,
            }
        );
    }

    #[test]
    fn split_votes_stay_neutral() {
        let score = ClassificationScore {
            struggling: 2,
            dominating: 2,
        };
        assert_eq!(score.state(), PlayerState::Neutral);
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let config = DifficultyConfig {
            step: 0.0,
            ..DifficultyConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(DifficultyConfig::default().validate().is_ok());
    }
}
