use std::time::Duration;

use wave_director_core::{
    BossWaveSchedule, EntityType, Event, SpawnEntry, SpecialEventKind, WaveComposition,
    WaveNumber,
};
use wave_director_system_special_events::{
    BossRushConfig, DoorHazardConfig, EventLifecycle, EventScheduler, SchedulerConfig,
};

fn silent_config() -> SchedulerConfig {
    let mut config = SchedulerConfig {
        boss_waves: BossWaveSchedule::new(0),
        ..SchedulerConfig::default()
    };
    config.horde.rule.probability = 0.0;
    config.blackout.rule.probability = 0.0;
    config.door_hazard.rule.probability = 0.0;
    config.boss_rush.rule.probability = 0.0;
    config.boss_rush.rule.milestone_waves.clear();
    config.supply_drop.rule.probability = 0.0;
    config
}

fn lifecycle(scheduler: &EventScheduler, kind: SpecialEventKind) -> EventLifecycle {
    scheduler
        .descriptor(kind)
        .expect("kind registered")
        .lifecycle()
}

fn walkers(count: usize) -> WaveComposition {
    let entries = (0..count)
        .map(|_| SpawnEntry::new("walker", Duration::from_millis(400)))
        .collect();
    WaveComposition::new(entries, 10.0, 10.0)
}

#[test]
fn no_event_fires_before_the_minimum_wave() {
    let mut config = silent_config();
    config.horde.rule.probability = 1.0;
    config.horde.rule.min_wave = 1;
    config.supply_drop.rule.probability = 1.0;
    config.supply_drop.rule.min_wave = 1;
    let mut scheduler = EventScheduler::new(config);

    assert_eq!(scheduler.check_for_event(WaveNumber::new(2)), None);
    assert!(scheduler.active_kinds().is_empty());
}

#[test]
fn cooldown_blocks_reactivation() {
    let mut config = silent_config();
    config.horde.rule.probability = 1.0;
    config.horde.rule.cooldown_waves = 3;
    let mut scheduler = EventScheduler::new(config);
    let mut out = Vec::new();

    for wave in 3..=9 {
        let wave = WaveNumber::new(wave);
        let fired = scheduler.check_for_event(wave);
        scheduler.activate_pending(wave, &mut out);
        scheduler.on_wave_complete(&mut out);

        let expected = matches!(wave.get(), 3 | 6 | 9).then_some(SpecialEventKind::Horde);
        assert_eq!(fired, expected, "wave {wave}");
    }
    assert_eq!(
        scheduler
            .descriptor(SpecialEventKind::Horde)
            .and_then(|descriptor| descriptor.last_activation_wave()),
        Some(WaveNumber::new(9))
    );
}

#[test]
fn horde_triples_the_plan() {
    let mut scheduler = EventScheduler::new(silent_config());
    let mut out = Vec::new();
    assert!(scheduler.trigger(SpecialEventKind::Horde, WaveNumber::new(4), &mut out));

    let reshaped = scheduler.modify_wave_config(walkers(10));

    assert_eq!(reshaped.len(), 30);
    assert_eq!(reshaped.count_of(&EntityType::new("walker")), 30);
    assert_eq!(reshaped.total_budget(), 30.0);
    assert_eq!(reshaped.spent_budget(), 30.0);
}

#[test]
fn inactive_events_leave_the_plan_alone() {
    let scheduler = EventScheduler::new(silent_config());
    assert_eq!(scheduler.modify_wave_config(walkers(4)), walkers(4));
    assert_eq!(
        scheduler.apply_modifier(SpecialEventKind::Horde, walkers(4)),
        walkers(4)
    );
}

#[test]
fn wave_scoped_events_end_at_wave_completion() {
    let mut scheduler = EventScheduler::new(silent_config());
    let mut out = Vec::new();
    assert!(scheduler.trigger(SpecialEventKind::Horde, WaveNumber::new(4), &mut out));
    assert_eq!(scheduler.active_kinds(), vec![SpecialEventKind::Horde]);

    scheduler.on_wave_complete(&mut out);

    assert!(scheduler.active_kinds().is_empty());
    assert!(out.contains(&Event::SpecialEventEnded {
        kind: SpecialEventKind::Horde
    }));
}

#[test]
fn concurrency_ceiling_rejects_extra_events() {
    let mut config = silent_config();
    config.max_concurrent = 1;
    let mut scheduler = EventScheduler::new(config);
    let mut out = Vec::new();

    assert!(scheduler.trigger(SpecialEventKind::Blackout, WaveNumber::new(4), &mut out));
    assert!(!scheduler.trigger(SpecialEventKind::Horde, WaveNumber::new(4), &mut out));
    assert!(!scheduler.trigger(SpecialEventKind::Blackout, WaveNumber::new(4), &mut out));

    assert!(scheduler.stop(SpecialEventKind::Blackout, &mut out));
    assert_eq!(out.last(), Some(&Event::SpecialEventEnded {
        kind: SpecialEventKind::Blackout
    }));
    assert!(out.contains(&Event::VisibilityChanged { factor: 1.0 }));
    assert!(!scheduler.stop(SpecialEventKind::Blackout, &mut out));
    assert!(scheduler.trigger(SpecialEventKind::Horde, WaveNumber::new(4), &mut out));
}

#[test]
fn exclusive_events_run_alone() {
    let mut scheduler = EventScheduler::new(silent_config());
    let mut out = Vec::new();

    assert!(scheduler.trigger(SpecialEventKind::BossRush, WaveNumber::new(10), &mut out));
    assert!(!scheduler.trigger(SpecialEventKind::Horde, WaveNumber::new(10), &mut out));
    assert!(!scheduler.trigger(SpecialEventKind::SupplyDrop, WaveNumber::new(10), &mut out));
}

#[test]
fn milestone_overrides_roll_and_boss_wave_rule() {
    let mut config = SchedulerConfig::default();
    config.horde.rule.probability = 1.0;
    let mut scheduler = EventScheduler::new(config);

    assert_eq!(
        scheduler.check_for_event(WaveNumber::new(10)),
        Some(SpecialEventKind::BossRush)
    );
    assert_eq!(
        lifecycle(&scheduler, SpecialEventKind::BossRush),
        EventLifecycle::Pending
    );

    let mut out = Vec::new();
    scheduler.stop_all(&mut out);
    assert!(out.is_empty(), "pending events end silently");
    assert_eq!(scheduler.check_for_event(WaveNumber::new(15)), None);
}

#[test]
fn forced_event_skips_the_roll_once() {
    let mut scheduler = EventScheduler::new(silent_config());
    assert!(scheduler.force_next(SpecialEventKind::SupplyDrop));
    assert_eq!(scheduler.forced_kind(), Some(SpecialEventKind::SupplyDrop));

    assert_eq!(
        scheduler.check_for_event(WaveNumber::new(3)),
        Some(SpecialEventKind::SupplyDrop)
    );
    assert_eq!(scheduler.forced_kind(), None);

    let mut out = Vec::new();
    scheduler.activate_pending(WaveNumber::new(3), &mut out);
    assert_eq!(scheduler.check_for_event(WaveNumber::new(4)), None);
}

#[test]
fn supply_drop_rewards_and_ends_immediately() {
    let mut scheduler = EventScheduler::new(silent_config());
    let mut out = Vec::new();
    assert!(scheduler.trigger(SpecialEventKind::SupplyDrop, WaveNumber::new(3), &mut out));

    assert_eq!(
        out.first(),
        Some(&Event::SpecialEventStarted {
            kind: SpecialEventKind::SupplyDrop,
            wave: WaveNumber::new(3),
        })
    );
    assert!(out.contains(&Event::PointsAwarded { amount: 100 }));
    assert!(out
        .iter()
        .any(|event| matches!(event, Event::RewardDropped { reward, .. } if reward == "supply_crate")));
    assert_eq!(out.last(), Some(&Event::SpecialEventEnded {
        kind: SpecialEventKind::SupplyDrop
    }));
    assert_eq!(
        lifecycle(&scheduler, SpecialEventKind::SupplyDrop),
        EventLifecycle::Inactive
    );
}

#[test]
fn blackout_restores_visibility_after_its_duration() {
    let mut scheduler = EventScheduler::new(silent_config());
    let mut out = Vec::new();
    assert!(scheduler.trigger(SpecialEventKind::Blackout, WaveNumber::new(5), &mut out));
    assert!(out.contains(&Event::VisibilityChanged { factor: 0.25 }));

    scheduler.update(Duration::from_secs(29), &mut out);
    assert_eq!(scheduler.active_kinds(), vec![SpecialEventKind::Blackout]);

    scheduler.update(Duration::from_secs(1), &mut out);
    assert!(scheduler.active_kinds().is_empty());
    assert!(out.contains(&Event::VisibilityChanged { factor: 1.0 }));
}

fn door_config() -> SchedulerConfig {
    let mut config = silent_config();
    config.door_hazard.tuning = DoorHazardConfig {
        door_x: 4.0,
        door_y: 7.0,
        countdown_ms: 10_000,
        kill_target: 3,
        ..DoorHazardConfig::default()
    };
    config
}

#[test]
fn door_hazard_holds_when_kills_land_in_time() {
    let mut scheduler = EventScheduler::new(door_config());
    let mut out = Vec::new();
    assert!(scheduler.trigger(SpecialEventKind::DoorHazard, WaveNumber::new(5), &mut out));

    let walker = EntityType::new("walker");
    for _ in 0..3 {
        scheduler.on_entity_killed(&walker, &mut out);
    }
    assert_eq!(
        lifecycle(&scheduler, SpecialEventKind::DoorHazard),
        EventLifecycle::Ending
    );
    assert!(out.contains(&Event::PointsAwarded { amount: 250 }));
    assert!(out.contains(&Event::RewardDropped {
        reward: "ammo_crate".to_owned(),
        x: 4.0,
        y: 7.0,
    }));

    scheduler.update(Duration::from_millis(16), &mut out);
    assert_eq!(
        lifecycle(&scheduler, SpecialEventKind::DoorHazard),
        EventLifecycle::Inactive
    );
    assert!(!out
        .iter()
        .any(|event| matches!(event, Event::ExtraSpawnRequested { .. })));
}

#[test]
fn door_hazard_punishes_an_expired_countdown() {
    let mut scheduler = EventScheduler::new(door_config());
    let mut out = Vec::new();
    assert!(scheduler.trigger(SpecialEventKind::DoorHazard, WaveNumber::new(5), &mut out));

    scheduler.on_entity_killed(&EntityType::new("walker"), &mut out);
    scheduler.update(Duration::from_secs(10), &mut out);

    assert!(out.contains(&Event::ExtraSpawnRequested {
        entity: EntityType::new("brute"),
        source: SpecialEventKind::DoorHazard,
    }));
    assert!(!out
        .iter()
        .any(|event| matches!(event, Event::PointsAwarded { .. })));
    assert_eq!(out.last(), Some(&Event::SpecialEventEnded {
        kind: SpecialEventKind::DoorHazard
    }));
}

#[test]
fn boss_rush_holds_the_wave_until_every_boss_dies() {
    let mut config = silent_config();
    config.boss_rush.tuning = BossRushConfig {
        bosses: vec![EntityType::new("king")],
        gap_ms: 0,
        points: 500,
    };
    let mut scheduler = EventScheduler::new(config);
    let mut out = Vec::new();

    assert!(scheduler.trigger(SpecialEventKind::BossRush, WaveNumber::new(10), &mut out));
    assert!(scheduler.blocks_wave_completion());

    scheduler.update(Duration::from_millis(16), &mut out);
    assert!(out.contains(&Event::ExtraSpawnRequested {
        entity: EntityType::new("king"),
        source: SpecialEventKind::BossRush,
    }));
    assert!(scheduler.blocks_wave_completion());

    scheduler.on_entity_killed(&EntityType::new("king"), &mut out);
    assert!(!scheduler.blocks_wave_completion());
    assert!(out.contains(&Event::PointsAwarded { amount: 500 }));

    scheduler.on_wave_complete(&mut out);
    assert_eq!(
        lifecycle(&scheduler, SpecialEventKind::BossRush),
        EventLifecycle::Inactive
    );
}

#[test]
fn reset_forgets_history() {
    let mut scheduler = EventScheduler::new(silent_config());
    let mut out = Vec::new();
    assert!(scheduler.trigger(SpecialEventKind::Blackout, WaveNumber::new(6), &mut out));
    assert!(scheduler.force_next(SpecialEventKind::Horde));

    scheduler.reset(&mut out);

    assert!(scheduler.active_kinds().is_empty());
    assert_eq!(scheduler.forced_kind(), None);
    assert_eq!(
        scheduler
            .descriptor(SpecialEventKind::Blackout)
            .and_then(|descriptor| descriptor.last_activation_wave()),
        None
    );
}

#[test]
fn selections_replay_for_identical_seeds() {
    let run = || {
        let mut scheduler = EventScheduler::new(SchedulerConfig {
            seed: 0xdead_beef,
            ..SchedulerConfig::default()
        });
        let mut out = Vec::new();
        let mut fired = Vec::new();
        for wave in 1..=60 {
            let wave = WaveNumber::new(wave);
            fired.push(scheduler.check_for_event(wave));
            scheduler.activate_pending(wave, &mut out);
            scheduler.stop_all(&mut out);
        }
        (fired, out)
    };

    assert_eq!(run(), run());
}
