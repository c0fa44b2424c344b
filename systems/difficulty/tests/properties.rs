use std::time::Duration;

use proptest::prelude::*;
use wave_director_core::{ModifierBounds, ModifierLimits, PerformanceSnapshot};
use wave_director_system_difficulty::{DifficultyConfig, DifficultyController};

fn snapshot() -> impl Strategy<Value = PerformanceSnapshot> {
    (
        0.0f32..1.0,
        0.0f32..120.0,
        0.0f32..1.0,
        proptest::option::of(5.0f32..240.0),
    )
        .prop_map(|(accuracy, damage, health, clear)| PerformanceSnapshot {
            accuracy,
            damage_taken_per_minute: damage,
            health_fraction: health,
            average_clear_seconds: clear,
            kills_per_minute: 0.0,
        })
}

proptest! {
    #[test]
    fn modifiers_stay_within_limits(
        steps in proptest::collection::vec((snapshot(), 0u64..20_000, any::<bool>()), 1..64),
        step in 0.01f32..0.5,
    ) {
        let limits = ModifierLimits {
            spawn_delay: ModifierBounds::new(0.6, 1.8),
            budget: ModifierBounds::new(1.1, 1.4),
            drop_rate: ModifierBounds::new(0.5, 2.0),
        };
        let mut controller = DifficultyController::new(DifficultyConfig {
            step,
            limits,
            ..DifficultyConfig::default()
        });

        prop_assert!(controller.modifiers().within(&limits));
        for (sample, dt_ms, wave_boundary) in steps {
            let _ = if wave_boundary {
                controller.on_wave_complete(&sample)
            } else {
                controller.tick(Duration::from_millis(dt_ms), &sample)
            };
            prop_assert!(controller.modifiers().within(&limits));
        }
    }
}
