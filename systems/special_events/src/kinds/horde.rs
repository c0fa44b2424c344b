use std::time::Duration;

use serde::{Deserialize, Serialize};
use wave_director_core::{
    Announcement, AnnouncementStyle, EntityType, Event, SpawnEntry, WaveComposition,
};

use super::{Progress, BANNER};

/// Tuning of the mass-spawn event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HordeConfig {
    /// Factor every planned entry and the budget totals are multiplied by.
    pub multiplier: u32,
    /// Types allowed during a horde; others are remapped to the first safe type present.
    pub safe_types: Vec<EntityType>,
    /// Gap between an entry and its duplicates.
    pub burst_gap_ms: u64,
}

impl Default for HordeConfig {
    fn default() -> Self {
        Self {
            multiplier: 3,
            safe_types: vec![EntityType::new("walker"), EntityType::new("runner")],
            burst_gap_ms: 150,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Horde {
    config: HordeConfig,
}

impl Horde {
    pub(crate) fn new(config: HordeConfig) -> Self {
        Self { config }
    }

    pub(crate) fn activate(&mut self, out: &mut Vec<Event>) -> Progress {
        out.push(
            Announcement::new(
                "A horde is coming!",
                AnnouncementStyle::Danger,
                BANNER,
            )
            .into_event(),
        );
        Progress::Continue
    }

    /// Multiplies the plan, restricting it to the safe subset of types.
    pub(crate) fn reshape(&self, composition: &WaveComposition) -> WaveComposition {
        let multiplier = self.config.multiplier.max(1);
        let safe_types = &self.config.safe_types;
        let substitute = safe_types
            .iter()
            .find(|safe| composition.count_of(safe) > 0)
            .or_else(|| safe_types.first());
        let burst_gap = Duration::from_millis(self.config.burst_gap_ms);

        let mut entries = Vec::with_capacity(composition.len() * multiplier as usize);
        for entry in composition.entries() {
            let entity = match substitute {
                Some(safe) if !safe_types.contains(&entry.entity) => safe.clone(),
                _ => entry.entity.clone(),
            };
            entries.push(SpawnEntry::new(entity.clone(), entry.delay));
            for _ in 1..multiplier {
                entries.push(SpawnEntry::new(entity.clone(), burst_gap));
            }
        }

        let scale = multiplier as f32;
        WaveComposition::new(
            entries,
            composition.total_budget() * scale,
            composition.spent_budget() * scale,
        )
    }
}
