use serde::{Deserialize, Serialize};

use crate::{ConfigError, EntityType, Role, WaveNumber};

/// Balance data describing a single hostile entity type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeProfile {
    /// Identifier of the entity type.
    pub entity: EntityType,
    /// Threat currency spent when the type is planned into a wave.
    pub cost: f32,
    /// Role used for per-role caps.
    pub role: Role,
    /// First wave in which the type may appear.
    pub unlock_wave: WaveNumber,
    /// Relative selection weight among eligible types.
    pub spawn_weight: f32,
}

impl EntityTypeProfile {
    /// Creates a new profile.
    #[must_use]
    pub fn new(
        entity: impl Into<EntityType>,
        cost: f32,
        role: Role,
        unlock_wave: u32,
        spawn_weight: f32,
    ) -> Self {
        Self {
            entity: entity.into(),
            cost,
            role,
            unlock_wave: WaveNumber::new(unlock_wave),
            spawn_weight,
        }
    }
}

/// Read-only balance table consulted by the allocator and the orchestrator.
pub trait EntityCatalog {
    /// Threat cost of the type, if the catalog knows it.
    fn cost_of(&self, entity: &EntityType) -> Option<f32>;

    /// Role of the type, if the catalog knows it.
    fn role_of(&self, entity: &EntityType) -> Option<Role>;

    /// Spawn weight of the type, if the catalog knows it.
    fn weight_of(&self, entity: &EntityType) -> Option<f32>;

    /// First wave the type may appear in, if the catalog knows it.
    fn unlock_wave_of(&self, entity: &EntityType) -> Option<WaveNumber>;

    /// Types that may appear in `wave`, in catalog order.
    fn types_unlocked_at(&self, wave: WaveNumber) -> Vec<EntityType>;
}

/// Vector-backed [`EntityCatalog`] built from profiles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogTable {
    profiles: Vec<EntityTypeProfile>,
}

impl CatalogTable {
    /// Creates a table from the provided profiles, preserving their order.
    #[must_use]
    pub fn new(profiles: Vec<EntityTypeProfile>) -> Self {
        Self { profiles }
    }

    /// Profiles contained in the table.
    #[must_use]
    pub fn profiles(&self) -> &[EntityTypeProfile] {
        &self.profiles
    }

    /// Looks up the profile of the provided type.
    #[must_use]
    pub fn profile(&self, entity: &EntityType) -> Option<&EntityTypeProfile> {
        self.profiles
            .iter()
            .find(|profile| &profile.entity == entity)
    }

    /// Rejects negative or non-finite costs and weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for profile in &self.profiles {
            if !profile.cost.is_finite() || profile.cost < 0.0 {
                return Err(ConfigError::OutOfRange {
                    field: "catalog.cost",
                    expectation: "a finite, non-negative number",
                    value: f64::from(profile.cost),
                });
            }
            if !profile.spawn_weight.is_finite() || profile.spawn_weight < 0.0 {
                return Err(ConfigError::OutOfRange {
                    field: "catalog.spawn_weight",
                    expectation: "a finite, non-negative number",
                    value: f64::from(profile.spawn_weight),
                });
            }
        }
        Ok(())
    }
}

impl EntityCatalog for CatalogTable {
    fn cost_of(&self, entity: &EntityType) -> Option<f32> {
        self.profile(entity).map(|profile| profile.cost)
    }

    fn role_of(&self, entity: &EntityType) -> Option<Role> {
        self.profile(entity).map(|profile| profile.role)
    }

    fn weight_of(&self, entity: &EntityType) -> Option<f32> {
        self.profile(entity).map(|profile| profile.spawn_weight)
    }

    fn unlock_wave_of(&self, entity: &EntityType) -> Option<WaveNumber> {
        self.profile(entity).map(|profile| profile.unlock_wave)
    }

    fn types_unlocked_at(&self, wave: WaveNumber) -> Vec<EntityType> {
        self.profiles
            .iter()
            .filter(|profile| profile.unlock_wave <= wave)
            .map(|profile| profile.entity.clone())
            .collect()
    }
}
