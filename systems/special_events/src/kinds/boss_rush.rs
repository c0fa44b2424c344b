use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use wave_director_core::{
    Announcement, AnnouncementStyle, EntityType, Event, SpecialEventKind, WaveComposition,
};

use super::{Progress, BANNER};

/// Tuning of the multi-boss gauntlet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossRushConfig {
    /// Bosses fought one after another, in order.
    pub bosses: Vec<EntityType>,
    /// Pause between a boss dying and the next one appearing.
    pub gap_ms: u64,
    /// Points granted once every boss is defeated.
    pub points: u32,
}

impl Default for BossRushConfig {
    fn default() -> Self {
        Self {
            bosses: vec![
                EntityType::new("brute_king"),
                EntityType::new("spitter_queen"),
                EntityType::new("abomination"),
            ],
            gap_ms: 4_000,
            points: 1_000,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct BossRush {
    config: BossRushConfig,
    queue: VecDeque<EntityType>,
    current: Option<EntityType>,
    /// Living or unspawned entities sharing the current boss's type, the boss included.
    outstanding: u32,
    /// Copies of rush boss types planned by the wave itself, not yet killed.
    rivals: BTreeMap<EntityType, u32>,
    gap_remaining: Duration,
}

impl BossRush {
    pub(crate) fn new(config: BossRushConfig) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
            current: None,
            outstanding: 0,
            rivals: BTreeMap::new(),
            gap_remaining: Duration::ZERO,
        }
    }

    /// Replaces the tally of rush boss types present in the committed plan.
    pub(crate) fn note_planned(&mut self, composition: &WaveComposition) {
        self.rivals.clear();
        for boss in &self.config.bosses {
            let count = composition.count_of(boss);
            if count > 0 {
                let _ = self.rivals.insert(boss.clone(), count);
            }
        }
    }

    /// Records a death that cannot be attributed to the rush.
    pub(crate) fn note_kill(&mut self, entity: &EntityType) {
        if let Some(count) = self.rivals.get_mut(entity) {
            *count = count.saturating_sub(1);
        }
    }

    pub(crate) fn forget_planned(&mut self) {
        self.rivals.clear();
    }

    pub(crate) fn activate(&mut self, out: &mut Vec<Event>) -> Progress {
        self.queue = self.config.bosses.iter().cloned().collect();
        self.current = None;
        self.gap_remaining = Duration::ZERO;
        let text = format!("Boss rush: {} bosses approach", self.queue.len());
        out.push(Announcement::new(text, AnnouncementStyle::Danger, BANNER).into_event());
        Progress::Continue
    }

    /// Reports whether a boss is alive or still queued.
    pub(crate) fn has_bosses_left(&self) -> bool {
        self.current.is_some() || !self.queue.is_empty()
    }

    pub(crate) fn update(&mut self, dt: Duration, out: &mut Vec<Event>) -> Progress {
        if self.current.is_some() {
            return Progress::Continue;
        }
        if self.queue.is_empty() {
            return Progress::Finished;
        }

        self.gap_remaining = self.gap_remaining.saturating_sub(dt);
        if !self.gap_remaining.is_zero() {
            return Progress::Continue;
        }
        if let Some(boss) = self.queue.pop_front() {
            self.outstanding = 1 + self.rivals.get(&boss).copied().unwrap_or(0);
            out.push(Event::ExtraSpawnRequested {
                entity: boss.clone(),
                source: SpecialEventKind::BossRush,
            });
            self.current = Some(boss);
        }
        Progress::Continue
    }

    pub(crate) fn on_entity_killed(&mut self, entity: &EntityType, out: &mut Vec<Event>) -> Progress {
        if self.current.as_ref() != Some(entity) {
            self.note_kill(entity);
            return Progress::Continue;
        }
        self.note_kill(entity);
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.outstanding > 0 {
            return Progress::Continue;
        }
        self.current = None;
        if !self.queue.is_empty() {
            self.gap_remaining = Duration::from_millis(self.config.gap_ms);
            return Progress::Continue;
        }

        out.push(Event::PointsAwarded {
            amount: self.config.points,
        });
        out.push(
            Announcement::new("Boss rush survived", AnnouncementStyle::Reward, BANNER)
                .into_event(),
        );
        Progress::Finished
    }

    pub(crate) fn deactivate(&mut self) {
        self.queue.clear();
        self.current = None;
        self.outstanding = 0;
        self.gap_remaining = Duration::ZERO;
    }
}
