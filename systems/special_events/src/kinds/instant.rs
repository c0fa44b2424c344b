use serde::{Deserialize, Serialize};
use wave_director_core::{Announcement, AnnouncementStyle, Event};

use super::{Progress, BANNER};

/// Tuning of the instant supply drop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyDropConfig {
    /// Points granted on activation.
    pub points: u32,
    /// Reward type dropped on activation.
    pub reward: String,
    /// Horizontal arena coordinate of the drop.
    pub x: f32,
    /// Vertical arena coordinate of the drop.
    pub y: f32,
}

impl Default for SupplyDropConfig {
    fn default() -> Self {
        Self {
            points: 100,
            reward: "supply_crate".to_owned(),
            x: 0.0,
            y: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct SupplyDrop {
    config: SupplyDropConfig,
}

impl SupplyDrop {
    pub(crate) fn new(config: SupplyDropConfig) -> Self {
        Self { config }
    }

    pub(crate) fn activate(&mut self, out: &mut Vec<Event>) -> Progress {
        out.push(Event::PointsAwarded {
            amount: self.config.points,
        });
        out.push(Event::RewardDropped {
            reward: self.config.reward.clone(),
            x: self.config.x,
            y: self.config.y,
        });
        out.push(
            Announcement::new("Supplies incoming", AnnouncementStyle::Reward, BANNER)
                .into_event(),
        );
        Progress::Finished
    }
}
