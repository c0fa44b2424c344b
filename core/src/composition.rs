use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::EntityType;

/// Single planned spawn within a wave.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Catalog type to materialize.
    pub entity: EntityType,
    /// Gap between the previous entry and this one.
    pub delay: Duration,
}

impl SpawnEntry {
    /// Creates a new spawn entry.
    #[must_use]
    pub fn new(entity: impl Into<EntityType>, delay: Duration) -> Self {
        Self {
            entity: entity.into(),
            delay,
        }
    }
}

/// Ordered spawn plan of one wave together with its budget bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveComposition {
    entries: Vec<SpawnEntry>,
    total_budget: f32,
    spent_budget: f32,
    counts: BTreeMap<EntityType, u32>,
}

impl WaveComposition {
    /// Creates a composition from ordered entries and the budget they were bought with.
    #[must_use]
    pub fn new(entries: Vec<SpawnEntry>, total_budget: f32, spent_budget: f32) -> Self {
        let mut counts = BTreeMap::new();
        for entry in &entries {
            *counts.entry(entry.entity.clone()).or_insert(0) += 1;
        }
        Self {
            entries,
            total_budget,
            spent_budget,
            counts,
        }
    }

    /// Planned entries in spawn order.
    #[must_use]
    pub fn entries(&self) -> &[SpawnEntry] {
        &self.entries
    }

    /// Budget the wave was allowed to spend.
    #[must_use]
    pub const fn total_budget(&self) -> f32 {
        self.total_budget
    }

    /// Budget the planned entries actually cost.
    #[must_use]
    pub const fn spent_budget(&self) -> f32 {
        self.spent_budget
    }

    /// Number of planned entries per type.
    #[must_use]
    pub fn counts(&self) -> &BTreeMap<EntityType, u32> {
        &self.counts
    }

    /// Number of planned entries of the provided type.
    #[must_use]
    pub fn count_of(&self, entity: &EntityType) -> u32 {
        self.counts.get(entity).copied().unwrap_or(0)
    }

    /// Total number of planned entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether nothing is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every entry's delay, i.e. when the last entry is emitted.
    #[must_use]
    pub fn emission_span(&self) -> Duration {
        self.entries
            .iter()
            .fold(Duration::ZERO, |span, entry| span.saturating_add(entry.delay))
    }

    /// Appends an entry at the end of the plan without touching the budget.
    pub fn push(&mut self, entry: SpawnEntry) {
        *self.counts.entry(entry.entity.clone()).or_insert(0) += 1;
        self.entries.push(entry);
    }
}
