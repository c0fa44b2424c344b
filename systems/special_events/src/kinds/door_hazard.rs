use std::time::Duration;

use serde::{Deserialize, Serialize};
use wave_director_core::{Announcement, AnnouncementStyle, EntityType, Event, SpecialEventKind};

use super::{Progress, BANNER};

/// Tuning of the hazard-door event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorHazardConfig {
    /// Horizontal arena coordinate of the door.
    pub door_x: f32,
    /// Vertical arena coordinate of the door.
    pub door_y: f32,
    /// Time the player has to reach the kill target.
    pub countdown_ms: u64,
    /// Kills needed to hold the door.
    pub kill_target: u32,
    /// Points granted when the door holds.
    pub safe_points: u32,
    /// Reward dropped at the door when it holds.
    pub reward: String,
    /// Entity released when the countdown runs out.
    pub punish_entity: EntityType,
}

impl Default for DoorHazardConfig {
    fn default() -> Self {
        Self {
            door_x: 0.0,
            door_y: 0.0,
            countdown_ms: 30_000,
            kill_target: 15,
            safe_points: 250,
            reward: "ammo_crate".to_owned(),
            punish_entity: EntityType::new("brute"),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct DoorHazard {
    config: DoorHazardConfig,
    remaining: Duration,
    kills: u32,
    settled: bool,
}

impl DoorHazard {
    pub(crate) fn new(config: DoorHazardConfig) -> Self {
        Self {
            config,
            remaining: Duration::ZERO,
            kills: 0,
            settled: false,
        }
    }

    pub(crate) fn activate(&mut self, out: &mut Vec<Event>) -> Progress {
        self.remaining = Duration::from_millis(self.config.countdown_ms);
        self.kills = 0;
        self.settled = false;
        let text = format!(
            "Breach! Kill {} before the door gives way",
            self.config.kill_target
        );
        out.push(Announcement::new(text, AnnouncementStyle::Warning, BANNER).into_event());
        Progress::Continue
    }

    pub(crate) fn update(&mut self, dt: Duration, out: &mut Vec<Event>) -> Progress {
        if self.settled {
            return Progress::Finished;
        }
        self.remaining = self.remaining.saturating_sub(dt);
        if !self.remaining.is_zero() {
            return Progress::Continue;
        }

        self.settled = true;
        out.push(Event::ExtraSpawnRequested {
            entity: self.config.punish_entity.clone(),
            source: SpecialEventKind::DoorHazard,
        });
        out.push(
            Announcement::new("The door gave way!", AnnouncementStyle::Danger, BANNER)
                .into_event(),
        );
        Progress::Finished
    }

    pub(crate) fn on_entity_killed(&mut self, out: &mut Vec<Event>) -> Progress {
        if self.settled {
            return Progress::Finished;
        }
        self.kills = self.kills.saturating_add(1);
        if self.kills < self.config.kill_target {
            return Progress::Continue;
        }

        self.settled = true;
        out.push(Event::PointsAwarded {
            amount: self.config.safe_points,
        });
        out.push(Event::RewardDropped {
            reward: self.config.reward.clone(),
            x: self.config.door_x,
            y: self.config.door_y,
        });
        out.push(
            Announcement::new("The door holds", AnnouncementStyle::Reward, BANNER).into_event(),
        );
        Progress::Finished
    }

    pub(crate) fn deactivate(&mut self) {
        self.remaining = Duration::ZERO;
        self.kills = 0;
        self.settled = false;
    }
}
